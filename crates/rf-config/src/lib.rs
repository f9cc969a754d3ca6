//! # rf-config
//!
//! Layered settings for the Rusty-Forum binaries, lowest precedence first:
//! built-in defaults, an optional `config/rusty-forum.{toml,yaml,json}` file,
//! then `RUSTY_FORUM_<SECTION>__<KEY>` environment variables (a `.env` file in
//! the working directory is loaded into the environment first).

use config::{Config, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

pub const ENV_PREFIX: &str = "RUSTY_FORUM";
pub const CONFIG_FILE: &str = "config/rusty-forum";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub pagination: PaginationSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// May embed credentials for other backends, so it never shows up in logs.
    pub url: SecretString,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationSettings {
    pub per_page: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// An `EnvFilter` directive, e.g. `info,rf_api=debug`.
    pub filter: String,
    pub json: bool,
}

impl Settings {
    /// Loads `.env`, the optional config file and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_sources(Some(CONFIG_FILE), environment())
    }

    /// Builds settings from an explicit file base name and environment source.
    pub fn from_sources(file: Option<&str>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080_i64)?
            .set_default("database.url", "sqlite://rusty_forum.db")?
            .set_default("database.max_connections", 5_i64)?
            .set_default("pagination.per_page", 10_i64)?
            .set_default("log.filter", "info")?
            .set_default("log.json", false)?;

        if let Some(name) = file {
            builder = builder.add_source(File::with_name(name).required(false));
        }

        let settings: Settings = builder.add_source(env).build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.pagination.per_page == 0 {
            return Err(ConfigError::Invalid("pagination.per_page must be at least 1".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// The `RUSTY_FORUM_<SECTION>__<KEY>` environment source.
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn env_from(pairs: &[(&str, &str)]) -> Environment {
        let vars = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<config::Map<String, String>>();
        environment().source(Some(vars))
    }

    #[test]
    fn defaults_apply_without_sources() {
        let settings = Settings::from_sources(None, env_from(&[])).unwrap();

        assert_eq!(settings.server.address(), "127.0.0.1:8080");
        assert_eq!(settings.database.url.expose_secret(), "sqlite://rusty_forum.db");
        assert_eq!(settings.database.max_connections, 5);
        assert_eq!(settings.pagination.per_page, 10);
        assert_eq!(settings.log.filter, "info");
        assert!(!settings.log.json);
    }

    #[test]
    fn environment_overrides_defaults() {
        let env = env_from(&[
            ("RUSTY_FORUM_SERVER__PORT", "9090"),
            ("RUSTY_FORUM_DATABASE__URL", "sqlite::memory:"),
            ("RUSTY_FORUM_PAGINATION__PER_PAGE", "25"),
            ("RUSTY_FORUM_LOG__JSON", "true"),
        ]);
        let settings = Settings::from_sources(None, env).unwrap();

        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.database.url.expose_secret(), "sqlite::memory:");
        assert_eq!(settings.pagination.per_page, 25);
        assert!(settings.log.json);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let env = env_from(&[("RUSTY_FORUM_PAGINATION__PER_PAGE", "0")]);
        let err = Settings::from_sources(None, env).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn database_url_is_redacted_in_debug_output() {
        let env = env_from(&[("RUSTY_FORUM_DATABASE__URL", "postgres://admin:hunter2@db/forum")]);
        let settings = Settings::from_sources(None, env).unwrap();
        assert!(!format!("{settings:?}").contains("hunter2"));
    }
}
