//! # Rusty-Forum Binary
//!
//! The entry point that assembles the application based on compile-time features.

use std::sync::Arc;

use rf_api::{router, AppState};
use rf_config::{LogSettings, Settings};
use rf_core::ForumService;
use secrecy::ExposeSecret;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "db-sqlite")]
use rf_db_sqlite::SqliteForumRepo;

#[cfg(feature = "auth-simple")]
use rf_auth_simple::TokenIdentityProvider;

#[cfg(not(all(feature = "db-sqlite", feature = "auth-simple")))]
compile_error!("rusty-forum needs a database plugin (`db-sqlite`) and an identity plugin (`auth-simple`)");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_tracing(&settings.log);

    // 1. Initialize Database Implementation
    let repo = Arc::new(
        SqliteForumRepo::connect(
            settings.database.url.expose_secret(),
            settings.database.max_connections,
        )
        .await?,
    );

    // 2. Initialize Identity Implementation
    let identity = Arc::new(TokenIdentityProvider::new(repo.clone()));

    // 3. Wire the service (dynamic dispatch over the plugin ports)
    let forum = ForumService::new(repo.clone(), repo.clone(), repo)
        .with_per_page(settings.pagination.per_page);
    let app = router(AppState::new(forum, identity));

    let address = settings.server.address();
    let listener = TcpListener::bind(&address).await?;
    info!("Rusty-Forum listening on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

/// `RUST_LOG` wins over the configured filter when set.
fn init_tracing(log: &LogSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(%err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                tracing::error!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
