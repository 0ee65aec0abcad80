//! Configuration for the ledger

use risk_engine::ScoringConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON snapshot file; in-memory only when unset
    pub snapshot_path: Option<PathBuf>,

    /// Entries included in an exported report
    pub report_limit: usize,

    /// Scoring engine thresholds
    pub scoring: ScoringConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            report_limit: 10,
            scoring: ScoringConfig::default(),
        }
    }
}

impl LedgerConfig {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: LedgerConfig = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = LedgerConfig::default();

        if let Ok(path) = std::env::var("LEDGER_SNAPSHOT_PATH") {
            config.snapshot_path = Some(PathBuf::from(path));
        }

        if let Ok(limit) = std::env::var("LEDGER_REPORT_LIMIT") {
            config.report_limit = limit
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid LEDGER_REPORT_LIMIT: {}", e)))?;
        }

        Ok(config)
    }
}
