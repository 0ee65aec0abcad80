//! Core types for the ledger

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use risk_engine::{AccountId, EvaluationResult, Transaction, TransactionId, TransactionStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Unscored transaction as submitted by a caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Originating account
    pub account_id: AccountId,

    /// Positive amount
    pub amount: Decimal,

    /// Geographic origin
    pub location: String,
}

impl TransactionRequest {
    /// Create new request
    pub fn new(account_id: impl Into<String>, amount: Decimal, location: impl Into<String>) -> Self {
        Self {
            account_id: AccountId::new(account_id),
            amount,
            location: location.into(),
        }
    }
}

/// Validate transaction input
pub fn validate(request: &TransactionRequest) -> Result<()> {
    check_fields(&request.account_id, request.amount, &request.location)
}

pub(crate) fn check_fields(account_id: &AccountId, amount: Decimal, location: &str) -> Result<()> {
    if account_id.is_blank() {
        return Err(Error::Validation("account_id is required".to_string()));
    }
    if amount <= Decimal::ZERO {
        return Err(Error::Validation(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    if location.trim().is_empty() {
        return Err(Error::Validation("location is required".to_string()));
    }
    Ok(())
}

/// Stored transaction with its evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// The transaction
    #[serde(flatten)]
    pub transaction: Transaction,

    /// Result computed before append
    #[serde(flatten)]
    pub result: EvaluationResult,
}

impl LedgerEntry {
    /// Transaction ID
    pub fn id(&self) -> TransactionId {
        self.transaction.id
    }

    /// Account ID
    pub fn account_id(&self) -> &AccountId {
        &self.transaction.account_id
    }

    /// Evaluation instant
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.transaction.timestamp
    }

    /// Outcome
    pub fn status(&self) -> TransactionStatus {
        self.result.status
    }
}

/// Aggregate outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// All entries
    pub total: usize,

    /// Entries with only the sentinel alert
    pub clean: usize,

    /// Entries with at least one fired rule
    pub suspicious: usize,

    /// `suspicious / total`, 0 when empty
    pub fraud_rate: f64,
}

impl Statistics {
    /// Compute from status counts
    pub fn from_counts(clean: usize, suspicious: usize) -> Self {
        let total = clean + suspicious;
        let fraud_rate = if total == 0 {
            0.0
        } else {
            suspicious as f64 / total as f64
        };
        Self {
            total,
            clean,
            suspicious,
            fraud_rate,
        }
    }

    /// Fraud rate as a percentage rounded to one decimal
    pub fn fraud_rate_percent(&self) -> f64 {
        (self.fraud_rate * 1000.0).round() / 10.0
    }
}

/// Exported summary of the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerReport {
    /// Producing system
    pub system: String,

    /// Export instant
    pub generated_at: DateTime<Utc>,

    /// Aggregates over the whole ledger
    pub statistics: Statistics,

    /// Fraud rate as a one-decimal percentage
    pub fraud_rate_percent: f64,

    /// Latest entries, most recent first
    pub recent_transactions: Vec<LedgerEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use risk_engine::{Alert, RiskTier};
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate() {
        assert!(validate(&TransactionRequest::new("100", dec!(10), "Paris")).is_ok());
        assert!(validate(&TransactionRequest::new("", dec!(10), "Paris")).is_err());
        assert!(validate(&TransactionRequest::new("100", dec!(0), "Paris")).is_err());
        assert!(validate(&TransactionRequest::new("100", dec!(-5), "Paris")).is_err());
        assert!(validate(&TransactionRequest::new("100", dec!(10), " ")).is_err());
    }

    #[test]
    fn test_statistics_empty() {
        let stats = Statistics::from_counts(0, 0);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.fraud_rate, 0.0);
    }

    #[test]
    fn test_statistics_rate() {
        let stats = Statistics::from_counts(2, 1);
        assert_eq!(stats.total, 3);
        assert!((stats.fraud_rate - 1.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(stats.fraud_rate_percent(), 33.3);
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = LedgerEntry {
            transaction: Transaction {
                id: TransactionId::new(7),
                account_id: AccountId::new("100"),
                amount: dec!(60000),
                location: "Paris".to_string(),
                timestamp: "2024-03-01T12:00:00Z".parse().unwrap(),
            },
            result: EvaluationResult {
                alerts: vec![Alert::HighValue, Alert::RoundAmount],
                risk_tier: RiskTier::Medium,
                risk_score: 25.into(),
                status: TransactionStatus::Suspicious,
            },
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["account_id"], "100");
        assert_eq!(json["location"], "Paris");
        assert_eq!(json["risk_tier"], "medium");
        assert_eq!(json["alerts"][0], "High-value transaction");

        let back: LedgerEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }
}
