use config::{ConfigError, Environment};
use ledger_core::LedgerConfig;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub queue_capacity: usize,
    pub history_limit: usize,
    pub confirmations: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            // Server defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.workers", 4)?
            // Ledger defaults
            .set_default("ledger.report_limit", 10)?
            // Notification defaults
            .set_default("notifications.enabled", true)?
            .set_default("notifications.queue_capacity", 256)?
            .set_default("notifications.history_limit", 100)?
            .set_default("notifications.confirmations", false)?;

        builder = builder.add_source(Environment::with_prefix("FRAUD_API").separator("__"));

        // Override from environment variables
        if let Ok(port) = env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        if let Ok(path) = env::var("SNAPSHOT_PATH") {
            builder = builder.set_override("ledger.snapshot_path", path)?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config
            .ledger
            .scoring
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(config)
    }
}
