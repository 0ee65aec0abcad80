//! Error types for the ledger

use risk_engine::TransactionId;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or out-of-range transaction input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Appended id does not follow the last stored one
    #[error("Transaction id {id} must be greater than {last}")]
    IdConflict {
        /// Rejected id
        id: TransactionId,
        /// Last id in the ledger
        last: TransactionId,
    },

    /// Snapshot storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Scoring engine error
    #[error("Risk engine error: {0}")]
    Risk(#[from] risk_engine::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for caller input errors
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::IdConflict { .. })
    }
}
