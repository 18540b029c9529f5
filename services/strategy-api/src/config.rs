//! Application Configuration
//!
//! Loads configuration from config.toml with environment variable overrides.

use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Static bearer token. When unset, the auth middleware allows all requests.
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string backing the card/strategy document stores.
    pub url: String,
    /// When set, overrides `url` entirely (store emulator / local dev override).
    pub emulator_url: Option<String>,
}

impl DatabaseConfig {
    pub fn effective_url(&self) -> &str {
        self.emulator_url.as_deref().unwrap_or(&self.url)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub catalog_dir: Option<String>,
}

fn default_port() -> u16 {
    8080
}

impl AppConfig {
    /// Load configuration from config.toml with environment variable overrides.
    /// Absence of `DATABASE_URL`/`STRATEGY_STORE_EMULATOR_URL` is a hard startup failure.
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"));

        if let Ok(url) = std::env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", url)?;
        }
        if let Ok(url) = std::env::var("STRATEGY_STORE_EMULATOR_URL") {
            builder = builder.set_override("database.emulator_url", url)?;
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port_num) = port.parse::<u16>() {
                builder = builder.set_override("server.port", port_num)?;
            }
        }
        if let Ok(dir) = std::env::var("CATALOG_DIR") {
            builder = builder.set_override("server.catalog_dir", dir)?;
        }
        if let Ok(token) = std::env::var("AUTH_TOKEN") {
            builder = builder.set_override("auth.token", token)?;
        }

        let config = builder.build()?;

        if config.get_string("database.url").is_err() && config.get_string("database.emulator_url").is_err() {
            return Err(config::ConfigError::NotFound(
                "database.url (set DATABASE_URL or STRATEGY_STORE_EMULATOR_URL)".to_string(),
            ));
        }

        config.try_deserialize()
    }

    pub fn catalog_dir(&self) -> String {
        self.server
            .catalog_dir
            .clone()
            .unwrap_or_else(|| "catalog".to_string())
    }
}
