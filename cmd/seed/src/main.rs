//! Creates a forum user and prints a freshly issued API token.
//!
//! The token is shown once; only its digest is stored.

use clap::Parser;
use rf_auth_simple::{hash_token, issue_token};
use rf_config::Settings;
use rf_db_sqlite::SqliteForumRepo;
use secrecy::ExposeSecret;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(
    name = "seed",
    version = env!("CARGO_PKG_VERSION"),
    about = "Create a Rusty-Forum user and issue an API token"
)]
struct Cli {
    /// Display name shown as the author of posts and comments
    #[clap(long)]
    name: String,

    /// Unique e-mail address of the user
    #[clap(long)]
    email: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log.filter)),
        )
        .init();

    let repo = SqliteForumRepo::connect(
        settings.database.url.expose_secret(),
        settings.database.max_connections,
    )
    .await?;

    let user = repo.create_user(&cli.name, &cli.email).await?;
    let token = issue_token();
    repo.store_token_hash(user.id, &hash_token(&token)).await?;
    tracing::info!(user_id = user.id, "seeded user");

    println!("user #{} ({})", user.id, user.name);
    println!("token: {token}");
    Ok(())
}
