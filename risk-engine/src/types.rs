//! Core types for risk engine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create new account ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the identifier is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Transaction identifier, assigned in submission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Create from raw sequence number
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Raw sequence number
    pub fn value(&self) -> u64 {
        self.0
    }

    /// The identifier that follows this one
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID
    pub id: TransactionId,

    /// Originating account
    pub account_id: AccountId,

    /// Amount (exact decimal, implied currency)
    pub amount: Decimal,

    /// Free-text geographic origin
    pub location: String,

    /// Evaluation instant
    pub timestamp: DateTime<Utc>,
}

/// Risk score (0-100)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u8")]
pub struct RiskScore(u8);

impl RiskScore {
    /// Maximum score
    pub const MAX: u8 = 100;

    /// Create new risk score (0-100)
    pub fn new(score: u8) -> Self {
        Self(score.min(Self::MAX))
    }

    /// Get raw score
    pub fn score(&self) -> u8 {
        self.0
    }
}

impl From<u8> for RiskScore {
    fn from(score: u8) -> Self {
        Self::new(score)
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Risk tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    /// Low risk
    #[default]
    Low,
    /// Medium risk
    Medium,
    /// High risk
    High,
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
        };
        f.write_str(s)
    }
}

/// Fraud indicator from the fixed alert vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alert {
    /// Amount above the high-value threshold
    #[serde(rename = "High-value transaction")]
    HighValue,
    /// Amount above the very-high-value threshold
    #[serde(rename = "Very high-value transaction")]
    VeryHighValue,
    /// Several transactions for the account inside the velocity window
    #[serde(rename = "Rapid multiple transactions")]
    RapidTransactions,
    /// Location differs from the account's previous transaction
    #[serde(rename = "Geographic anomaly detected")]
    GeographicAnomaly,
    /// Submitted outside normal hours
    #[serde(rename = "Unusual transaction time")]
    UnusualTime,
    /// Amount is a whole multiple of the round unit
    #[serde(rename = "Round amount transaction")]
    RoundAmount,
    /// Sentinel used when no rule fires
    #[serde(rename = "No fraud detected")]
    NoFraudDetected,
}

impl Alert {
    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Alert::HighValue => "High-value transaction",
            Alert::VeryHighValue => "Very high-value transaction",
            Alert::RapidTransactions => "Rapid multiple transactions",
            Alert::GeographicAnomaly => "Geographic anomaly detected",
            Alert::UnusualTime => "Unusual transaction time",
            Alert::RoundAmount => "Round amount transaction",
            Alert::NoFraudDetected => "No fraud detected",
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Only the sentinel alert
    Clean,
    /// At least one rule fired
    Suspicious,
}

impl TransactionStatus {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Clean => "clean",
            TransactionStatus::Suspicious => "suspicious",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evaluation result attached to a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Alerts in rule evaluation order, never empty
    pub alerts: Vec<Alert>,

    /// Highest tier floor among fired rules
    pub risk_tier: RiskTier,

    /// Capped sum of rule contributions
    pub risk_score: RiskScore,

    /// Clean or suspicious
    pub status: TransactionStatus,
}

impl EvaluationResult {
    /// Result for a transaction that fired no rule
    pub fn clean() -> Self {
        Self {
            alerts: vec![Alert::NoFraudDetected],
            risk_tier: RiskTier::Low,
            risk_score: RiskScore::default(),
            status: TransactionStatus::Clean,
        }
    }

    /// Check status
    pub fn is_clean(&self) -> bool {
        self.status == TransactionStatus::Clean
    }

    /// Check whether a given alert was raised
    pub fn has_alert(&self, alert: Alert) -> bool {
        self.alerts.contains(&alert)
    }

    /// Alert labels in order
    pub fn labels(&self) -> Vec<&'static str> {
        self.alerts.iter().map(Alert::label).collect()
    }
}
