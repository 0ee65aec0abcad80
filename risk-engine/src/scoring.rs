//! Risk scoring engine
//!
//! A fixed rule table evaluated in order against a candidate transaction and
//! the account's prior history. Every rule is independent; the score is the
//! capped sum of contributions and the tier is the highest floor among fired
//! rules.

use crate::velocity::count_within;
use crate::{Alert, Error, EvaluationResult, Result, RiskScore, RiskTier, Transaction, TransactionStatus};
use chrono::{Duration, FixedOffset, Offset, Timelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Score added by each weighted rule
const RULE_WEIGHT: u8 = 25;

/// Scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Amount strictly above this is high value
    pub high_value_threshold: Decimal,

    /// Amount strictly above this is very high value
    pub very_high_value_threshold: Decimal,

    /// Velocity window length
    pub velocity_window_secs: u64,

    /// Prior transactions in the window needed to fire the velocity rule
    pub velocity_min_prior: usize,

    /// Hours strictly before this are unusual
    pub unusual_hour_start: u32,

    /// Hours strictly after this are unusual
    pub unusual_hour_end: u32,

    /// Round amount unit
    pub round_amount_unit: Decimal,

    /// UTC offset of the reference clock used for hour-of-day
    pub reference_utc_offset_secs: i32,

    /// Let the unusual-hour rule raise the tier to medium
    pub informational_rules_escalate_tier: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            high_value_threshold: Decimal::from(50_000),
            very_high_value_threshold: Decimal::from(100_000),
            velocity_window_secs: 60,
            velocity_min_prior: 2,
            unusual_hour_start: 6,
            unusual_hour_end: 22,
            round_amount_unit: Decimal::from(1_000),
            reference_utc_offset_secs: 0,
            informational_rules_escalate_tier: false,
        }
    }
}

impl ScoringConfig {
    /// Check thresholds, window and clock settings
    pub fn validate(&self) -> Result<()> {
        if self.high_value_threshold <= Decimal::ZERO {
            return Err(Error::InvalidConfig(
                "high_value_threshold must be positive".to_string(),
            ));
        }
        if self.very_high_value_threshold < self.high_value_threshold {
            return Err(Error::InvalidConfig(format!(
                "very_high_value_threshold {} is below high_value_threshold {}",
                self.very_high_value_threshold, self.high_value_threshold
            )));
        }
        if self.velocity_window_secs == 0 || self.velocity_window_secs > 86_400 {
            return Err(Error::InvalidConfig(format!(
                "velocity_window_secs must be in 1..=86400, got {}",
                self.velocity_window_secs
            )));
        }
        if self.velocity_min_prior == 0 {
            return Err(Error::InvalidConfig(
                "velocity_min_prior must be at least 1".to_string(),
            ));
        }
        if self.unusual_hour_start > 23 || self.unusual_hour_end > 23 {
            return Err(Error::InvalidConfig(format!(
                "unusual hours must be in 0..=23, got {}..{}",
                self.unusual_hour_start, self.unusual_hour_end
            )));
        }
        if self.round_amount_unit <= Decimal::ZERO {
            return Err(Error::InvalidConfig(
                "round_amount_unit must be positive".to_string(),
            ));
        }
        if FixedOffset::east_opt(self.reference_utc_offset_secs).is_none() {
            return Err(Error::InvalidConfig(format!(
                "reference_utc_offset_secs out of range: {}",
                self.reference_utc_offset_secs
            )));
        }
        Ok(())
    }

    /// Velocity window as a duration
    pub fn velocity_window(&self) -> Duration {
        Duration::seconds(self.velocity_window_secs as i64)
    }

    fn reference_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.reference_utc_offset_secs).unwrap_or_else(|| Utc.fix())
    }
}

/// Scoring rule, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// `amount > high_value_threshold`
    HighValue,
    /// `amount > very_high_value_threshold`, additive to `HighValue`
    VeryHighValue,
    /// Enough prior transactions inside the velocity window
    Velocity,
    /// Most recent prior transaction has another location
    GeographicAnomaly,
    /// Hour of day outside normal hours
    UnusualHour,
    /// Positive whole multiple of the round unit
    RoundAmount,
}

impl Rule {
    /// All rules in evaluation order
    pub const ALL: [Rule; 6] = [
        Rule::HighValue,
        Rule::VeryHighValue,
        Rule::Velocity,
        Rule::GeographicAnomaly,
        Rule::UnusualHour,
        Rule::RoundAmount,
    ];

    /// Alert raised when the rule fires
    pub fn alert(self) -> Alert {
        match self {
            Rule::HighValue => Alert::HighValue,
            Rule::VeryHighValue => Alert::VeryHighValue,
            Rule::Velocity => Alert::RapidTransactions,
            Rule::GeographicAnomaly => Alert::GeographicAnomaly,
            Rule::UnusualHour => Alert::UnusualTime,
            Rule::RoundAmount => Alert::RoundAmount,
        }
    }

    /// Score contribution
    pub fn contribution(self) -> u8 {
        match self {
            Rule::HighValue | Rule::VeryHighValue | Rule::Velocity | Rule::GeographicAnomaly => {
                RULE_WEIGHT
            }
            // Informational only
            Rule::UnusualHour | Rule::RoundAmount => 0,
        }
    }

    /// Minimum tier implied by the rule firing
    pub fn tier_floor(self, config: &ScoringConfig) -> RiskTier {
        match self {
            Rule::HighValue | Rule::GeographicAnomaly => RiskTier::Medium,
            Rule::VeryHighValue | Rule::Velocity => RiskTier::High,
            Rule::UnusualHour if config.informational_rules_escalate_tier => RiskTier::Medium,
            Rule::UnusualHour | Rule::RoundAmount => RiskTier::Low,
        }
    }
}

/// Risk scorer
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    config: ScoringConfig,
}

impl RiskScorer {
    /// Create new risk scorer
    pub fn new(config: ScoringConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Evaluate a candidate against its account's prior transactions.
    ///
    /// Entries in `history` for other accounts, or carrying the candidate's
    /// own id, are ignored. The order of `history` does not matter.
    pub fn evaluate(&self, candidate: &Transaction, history: &[Transaction]) -> EvaluationResult {
        let prior: Vec<&Transaction> = history
            .iter()
            .filter(|tx| tx.account_id == candidate.account_id && tx.id != candidate.id)
            .collect();

        let fired: Vec<Rule> = Rule::ALL
            .into_iter()
            .filter(|rule| self.fires(*rule, candidate, &prior))
            .collect();

        if fired.is_empty() {
            return EvaluationResult::clean();
        }

        let total: u32 = fired.iter().map(|rule| u32::from(rule.contribution())).sum();
        let risk_score = RiskScore::new(total.min(u32::from(RiskScore::MAX)) as u8);
        let risk_tier = fired
            .iter()
            .map(|rule| rule.tier_floor(&self.config))
            .max()
            .unwrap_or_default();

        for rule in &fired {
            tracing::debug!(
                transaction_id = %candidate.id,
                account_id = %candidate.account_id,
                rule = ?rule,
                "Rule fired"
            );
        }

        EvaluationResult {
            alerts: fired.iter().map(|rule| rule.alert()).collect(),
            risk_tier,
            risk_score,
            status: TransactionStatus::Suspicious,
        }
    }

    fn fires(&self, rule: Rule, candidate: &Transaction, prior: &[&Transaction]) -> bool {
        let config = &self.config;
        match rule {
            Rule::HighValue => candidate.amount > config.high_value_threshold,
            Rule::VeryHighValue => candidate.amount > config.very_high_value_threshold,
            Rule::Velocity => {
                let recent = count_within(
                    prior.iter().copied(),
                    candidate.timestamp,
                    config.velocity_window(),
                );
                recent >= config.velocity_min_prior
            }
            Rule::GeographicAnomaly => prior
                .iter()
                .max_by_key(|tx| tx.id)
                .is_some_and(|last| last.location != candidate.location),
            Rule::UnusualHour => {
                let hour = candidate
                    .timestamp
                    .with_timezone(&config.reference_offset())
                    .hour();
                hour < config.unusual_hour_start || hour > config.unusual_hour_end
            }
            Rule::RoundAmount => {
                candidate.amount > Decimal::ZERO
                    && (candidate.amount % config.round_amount_unit).is_zero()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AccountId, TransactionId};
    use chrono::{DateTime, TimeZone};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn tx(seq: u64, account: &str, amount: Decimal, location: &str, at: DateTime<Utc>) -> Transaction {
        Transaction {
            id: TransactionId::new(seq),
            account_id: AccountId::new(account),
            amount,
            location: location.to_string(),
            timestamp: at,
        }
    }

    #[test]
    fn test_no_rules_fire() {
        let scorer = RiskScorer::default();
        let result = scorer.evaluate(&tx(1, "100", dec!(250.50), "Paris", noon()), &[]);

        assert_eq!(result, EvaluationResult::clean());
        assert_eq!(result.labels(), vec!["No fraud detected"]);
    }

    #[test]
    fn test_high_value() {
        let scorer = RiskScorer::default();
        let result = scorer.evaluate(&tx(1, "100", dec!(60000), "Paris", noon()), &[]);

        assert!(result.has_alert(Alert::HighValue));
        assert_eq!(result.risk_score.score(), 25);
        assert_eq!(result.risk_tier, RiskTier::Medium);
        assert_eq!(result.status, TransactionStatus::Suspicious);
    }

    #[test]
    fn test_very_high_value() {
        let scorer = RiskScorer::default();
        let result = scorer.evaluate(&tx(1, "100", dec!(150000), "Dubai", noon()), &[]);

        assert!(result.has_alert(Alert::HighValue));
        assert!(result.has_alert(Alert::VeryHighValue));
        assert_eq!(result.risk_score.score(), 50);
        assert_eq!(result.risk_tier, RiskTier::High);
    }

    #[test]
    fn test_value_thresholds_are_strict() {
        let scorer = RiskScorer::default();

        let at_high = scorer.evaluate(&tx(1, "100", dec!(50000), "Paris", noon()), &[]);
        assert!(!at_high.has_alert(Alert::HighValue));

        let at_very_high = scorer.evaluate(&tx(2, "100", dec!(100000), "Paris", noon()), &[]);
        assert!(at_very_high.has_alert(Alert::HighValue));
        assert!(!at_very_high.has_alert(Alert::VeryHighValue));

        let above = scorer.evaluate(&tx(3, "100", dec!(100000.01), "Paris", noon()), &[]);
        assert_eq!(above.alerts, vec![Alert::HighValue, Alert::VeryHighValue]);
        assert_eq!(above.risk_score.score(), 50);
    }

    #[test]
    fn test_round_amount_is_informational() {
        let scorer = RiskScorer::default();
        let result = scorer.evaluate(&tx(1, "100", dec!(1000), "Paris", noon()), &[]);

        assert_eq!(result.alerts, vec![Alert::RoundAmount]);
        assert_eq!(result.risk_score.score(), 0);
        assert_eq!(result.risk_tier, RiskTier::Low);
        assert_eq!(result.status, TransactionStatus::Suspicious);
    }

    #[test]
    fn test_velocity_counts_same_account_only() {
        let scorer = RiskScorer::default();
        let t0 = noon();
        let history = vec![
            tx(1, "100", dec!(500), "Tokyo", t0),
            tx(2, "101", dec!(600), "Tokyo", t0 + Duration::seconds(3)),
        ];
        let candidate = tx(3, "100", dec!(700), "Tokyo", t0 + Duration::seconds(8));

        let result = scorer.evaluate(&candidate, &history);
        assert!(!result.has_alert(Alert::RapidTransactions));
    }

    #[test]
    fn test_velocity_fires_on_third_within_window() {
        let scorer = RiskScorer::default();
        let t0 = noon();
        let history = vec![
            tx(1, "100", dec!(500), "Tokyo", t0),
            tx(2, "100", dec!(600), "Tokyo", t0 + Duration::seconds(5)),
        ];
        let candidate = tx(3, "100", dec!(700), "Tokyo", t0 + Duration::seconds(10));

        let result = scorer.evaluate(&candidate, &history);
        assert_eq!(result.alerts, vec![Alert::RapidTransactions]);
        assert_eq!(result.risk_score.score(), 25);
        assert_eq!(result.risk_tier, RiskTier::High);
    }

    #[test]
    fn test_velocity_ignores_old_history() {
        let scorer = RiskScorer::default();
        let t0 = noon();
        let history = vec![
            tx(1, "100", dec!(500), "Tokyo", t0),
            tx(2, "100", dec!(600), "Tokyo", t0 + Duration::seconds(30)),
        ];
        let candidate = tx(3, "100", dec!(700), "Tokyo", t0 + Duration::seconds(60));

        let result = scorer.evaluate(&candidate, &history);
        assert!(!result.has_alert(Alert::RapidTransactions));
    }

    #[test]
    fn test_geographic_anomaly_uses_latest_only() {
        let scorer = RiskScorer::default();
        let t0 = noon();
        let history = vec![
            tx(1, "100", dec!(500), "London", t0),
            tx(2, "100", dec!(600), "Tokyo", t0 + Duration::minutes(10)),
        ];
        let candidate = tx(3, "100", dec!(700), "London", t0 + Duration::minutes(20));

        let result = scorer.evaluate(&candidate, &history);
        assert_eq!(result.alerts, vec![Alert::GeographicAnomaly]);
        assert_eq!(result.risk_tier, RiskTier::Medium);

        let same_place = tx(3, "100", dec!(700), "Tokyo", t0 + Duration::minutes(20));
        assert!(!scorer.evaluate(&same_place, &history).has_alert(Alert::GeographicAnomaly));
    }

    #[test]
    fn test_geographic_anomaly_follows_submission_order() {
        let scorer = RiskScorer::default();
        let t0 = noon();
        // Clock stepped back between the two prior submissions
        let history = vec![
            tx(1, "100", dec!(500), "London", t0 + Duration::minutes(10)),
            tx(2, "100", dec!(600), "Tokyo", t0),
        ];

        let candidate = tx(3, "100", dec!(700), "Tokyo", t0 + Duration::minutes(20));
        assert!(!scorer.evaluate(&candidate, &history).has_alert(Alert::GeographicAnomaly));

        let candidate = tx(3, "100", dec!(700), "London", t0 + Duration::minutes(20));
        assert!(scorer.evaluate(&candidate, &history).has_alert(Alert::GeographicAnomaly));
    }

    #[test]
    fn test_tokyo_then_london() {
        let scorer = RiskScorer::default();
        let first = tx(1, "100", dec!(500), "Tokyo", noon());
        let second = tx(2, "100", dec!(500), "London", noon() + Duration::seconds(1));

        let result = scorer.evaluate(&second, &[first]);
        assert!(result.has_alert(Alert::GeographicAnomaly));
    }

    #[test]
    fn test_candidate_in_history_is_ignored() {
        let scorer = RiskScorer::default();
        let candidate = tx(1, "100", dec!(500), "Tokyo", noon());
        let history = vec![candidate.clone(), candidate.clone()];

        assert!(scorer.evaluate(&candidate, &history).is_clean());
    }

    #[test]
    fn test_unusual_hour() {
        let scorer = RiskScorer::default();
        let late = Utc.with_ymd_and_hms(2024, 3, 1, 23, 15, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2024, 3, 1, 5, 59, 0).unwrap();
        let edge = Utc.with_ymd_and_hms(2024, 3, 1, 22, 59, 0).unwrap();

        let result = scorer.evaluate(&tx(1, "100", dec!(250), "Paris", late), &[]);
        assert_eq!(result.alerts, vec![Alert::UnusualTime]);
        assert_eq!(result.risk_score.score(), 0);
        assert_eq!(result.risk_tier, RiskTier::Low);

        assert!(scorer
            .evaluate(&tx(2, "100", dec!(250), "Paris", early), &[])
            .has_alert(Alert::UnusualTime));
        assert!(scorer.evaluate(&tx(3, "100", dec!(250), "Paris", edge), &[]).is_clean());
    }

    #[test]
    fn test_unusual_hour_uses_reference_offset() {
        let config = ScoringConfig {
            reference_utc_offset_secs: 9 * 3600,
            ..ScoringConfig::default()
        };
        let scorer = RiskScorer::new(config).unwrap();

        // 20:00 UTC is 05:00 at UTC+9
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap();
        let result = scorer.evaluate(&tx(1, "100", dec!(250), "Tokyo", at), &[]);
        assert!(result.has_alert(Alert::UnusualTime));
    }

    #[test]
    fn test_escalating_policy_raises_unusual_hour() {
        let config = ScoringConfig {
            informational_rules_escalate_tier: true,
            ..ScoringConfig::default()
        };
        let scorer = RiskScorer::new(config).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 3, 1, 23, 0, 0).unwrap();

        let result = scorer.evaluate(&tx(1, "100", dec!(3000), "Paris", late), &[]);
        assert_eq!(result.alerts, vec![Alert::UnusualTime, Alert::RoundAmount]);
        assert_eq!(result.risk_tier, RiskTier::Medium);
        assert_eq!(result.risk_score.score(), 0);
    }

    #[test]
    fn test_all_rules_fire_in_order() {
        let scorer = RiskScorer::default();
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap();
        let history = vec![
            tx(1, "100", dec!(500), "Tokyo", t0),
            tx(2, "100", dec!(600), "Tokyo", t0 + Duration::seconds(5)),
        ];
        let candidate = tx(3, "100", dec!(200000), "London", t0 + Duration::seconds(10));

        let result = scorer.evaluate(&candidate, &history);
        assert_eq!(
            result.alerts,
            vec![
                Alert::HighValue,
                Alert::VeryHighValue,
                Alert::RapidTransactions,
                Alert::GeographicAnomaly,
                Alert::UnusualTime,
                Alert::RoundAmount,
            ]
        );
        assert_eq!(result.risk_score.score(), 100);
        assert_eq!(result.risk_tier, RiskTier::High);
    }

    #[test]
    fn test_invalid_config() {
        let config = ScoringConfig {
            velocity_window_secs: 0,
            ..ScoringConfig::default()
        };
        assert!(RiskScorer::new(config).is_err());

        let config = ScoringConfig {
            very_high_value_threshold: dec!(10),
            ..ScoringConfig::default()
        };
        assert!(RiskScorer::new(config).is_err());

        let config = ScoringConfig {
            reference_utc_offset_secs: 86_400,
            ..ScoringConfig::default()
        };
        assert!(RiskScorer::new(config).is_err());
    }

    fn history_strategy() -> impl Strategy<Value = Vec<Transaction>> {
        prop::collection::vec(
            (0u8..3, 1i64..500_000_00, 0usize..3, 0i64..7_200),
            0..8,
        )
        .prop_map(|rows| {
            let locations = ["Tokyo", "London", "Paris"];
            rows.into_iter()
                .enumerate()
                .map(|(i, (account, cents, loc, offset))| {
                    tx(
                        i as u64 + 1,
                        &account.to_string(),
                        Decimal::new(cents, 2),
                        locations[loc],
                        noon() - Duration::seconds(offset),
                    )
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_result_is_consistent(
            history in history_strategy(),
            cents in 1i64..500_000_00,
            hour in 0u32..24,
        ) {
            let scorer = RiskScorer::default();
            let at = Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap();
            let candidate = tx(1_000, "0", Decimal::new(cents, 2), "Tokyo", at);

            let result = scorer.evaluate(&candidate, &history);
            prop_assert!(result.risk_score.score() <= 100);
            prop_assert!(!result.alerts.is_empty());

            let fired: Vec<Rule> = Rule::ALL
                .into_iter()
                .filter(|rule| result.has_alert(rule.alert()))
                .collect();
            let expected_tier = fired
                .iter()
                .map(|rule| rule.tier_floor(scorer.config()))
                .max()
                .unwrap_or_default();
            prop_assert_eq!(result.risk_tier, expected_tier);

            if fired.is_empty() {
                prop_assert_eq!(result.labels(), vec!["No fraud detected"]);
                prop_assert!(result.is_clean());
            } else {
                prop_assert_eq!(result.status, TransactionStatus::Suspicious);
            }

            // Deterministic
            prop_assert_eq!(result, scorer.evaluate(&candidate, &history));
        }
    }
}
