use anyhow::Context;
use serde::Deserialize;

use crate::repository::PostgresBookstoreRepositoryConfig;

const ENV_PREFIX: &str = "BOOKSTORE";

/// Service configuration, read from `BOOKSTORE_*` environment variables.
/// Every field has a default so the service starts with no configuration at all
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "Settings::default_host")]
    pub host: String,
    #[serde(default = "Settings::default_port")]
    pub port: u16,
    #[serde(default)]
    pub use_in_memory_db: bool,
    #[serde(default = "Settings::default_db_host")]
    pub db_host: String,
    #[serde(default = "Settings::default_db_credential")]
    pub db_username: String,
    #[serde(default = "Settings::default_db_credential")]
    pub db_password: String,
    #[serde(default = "Settings::default_db_credential")]
    pub db_name: String,
    #[serde(default = "Settings::default_jaeger_enabled")]
    pub jaeger_enabled: bool,
}

impl Settings {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    fn from_source(
        source: impl config::Source + Send + Sync + 'static,
    ) -> anyhow::Result<Self> {
        config::Config::builder()
            .add_source(source)
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn postgres_config(&self) -> PostgresBookstoreRepositoryConfig {
        PostgresBookstoreRepositoryConfig {
            hostname: self.db_host.clone(),
            username: self.db_username.clone(),
            password: self.db_password.clone(),
            database: self.db_name.clone(),
        }
    }

    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_db_host() -> String {
        "127.0.0.1".to_string()
    }

    fn default_db_credential() -> String {
        "postgres".to_string()
    }

    fn default_jaeger_enabled() -> bool {
        true
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            use_in_memory_db: false,
            db_host: Self::default_db_host(),
            db_username: Self::default_db_credential(),
            db_password: Self::default_db_credential(),
            db_name: Self::default_db_credential(),
            jaeger_enabled: Self::default_jaeger_enabled(),
        }
    }
}
