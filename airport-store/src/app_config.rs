use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub collections: CollectionConfig,
    #[serde(default)]
    pub transaction: TransactionConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: String,
    /// Database holding both collections.
    pub name: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            url: "postgres://localhost:5432/airport".into(),
            name: "airport".into(),
            max_connections: 5,
            acquire_timeout_secs: 3,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CollectionConfig {
    pub plane: String,
    pub flight: String,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            plane: "plane".into(),
            flight: "flight".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TransactionConfig {
    /// Attempts per operation, the first one included.
    pub max_attempts: u32,
    pub attempt_timeout_ms: u64,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout_ms: 5_000,
        }
    }
}

impl TransactionConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Layers `default`, the `RUN_MODE` file and `local` from `dir`, then
    /// `AIRPORT__*` environment variables. Every file is optional.
    pub fn load_from(dir: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        let dir = dir.as_ref();
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::from(dir.join("default")).required(false))
            .add_source(config::File::from(dir.join(&run_mode)).required(false))
            // Not checked in
            .add_source(config::File::from(dir.join("local")).required(false))
            // e.g. `AIRPORT__DATABASE__BACKEND=postgres`
            .add_source(config::Environment::with_prefix("AIRPORT").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
