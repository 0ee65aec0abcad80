//! Main ledger orchestration layer
//!
//! Ties the scoring engine, clock and snapshot store together behind one
//! handle. Submission looks up the account's recent history, scores the
//! candidate and appends it together with its result.
//!
//! # Example
//!
//! ```
//! use ledger_core::{Ledger, SystemClock, TransactionRequest};
//! use rust_decimal::Decimal;
//! use std::sync::Arc;
//!
//! let ledger = Ledger::new(Arc::new(SystemClock));
//! let entry = ledger
//!     .submit(TransactionRequest::new("100", Decimal::from(60_000), "Paris"))
//!     .unwrap();
//! assert_eq!(entry.result.risk_score.score(), 25);
//! ```

use crate::{
    clock::Clock,
    storage::{JsonFileStore, SnapshotStore},
    types::{check_fields, validate, LedgerEntry, LedgerReport, Statistics, TransactionRequest},
    Error, LedgerConfig, Result,
};
use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use risk_engine::velocity::within_window;
use risk_engine::{AccountId, EvaluationResult, RiskScorer, Transaction, TransactionId, TransactionStatus};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

const REPORT_SYSTEM: &str = "Transdetect Fraud Detection";

#[derive(Debug, Default)]
struct LedgerState {
    /// Chronological (insertion order)
    entries: Vec<LedgerEntry>,

    /// account_id -> positions in `entries`, ascending
    by_account: HashMap<AccountId, Vec<usize>>,

    last_id: Option<TransactionId>,

    clean: usize,
    suspicious: usize,
}

impl LedgerState {
    fn next_id(&self) -> TransactionId {
        self.last_id
            .map(|id| id.next())
            .unwrap_or_else(|| TransactionId::new(1))
    }

    fn push(&mut self, entry: LedgerEntry) -> Result<LedgerEntry> {
        if let Some(last) = self.last_id {
            if entry.id() <= last {
                return Err(Error::IdConflict {
                    id: entry.id(),
                    last,
                });
            }
        }

        let position = self.entries.len();
        self.by_account
            .entry(entry.account_id().clone())
            .or_default()
            .push(position);
        self.last_id = Some(entry.id());
        match entry.status() {
            TransactionStatus::Clean => self.clean += 1,
            TransactionStatus::Suspicious => self.suspicious += 1,
        }
        self.entries.push(entry.clone());
        Ok(entry)
    }

    /// Entries for the account, most recent first
    fn account_entries(&self, account_id: &AccountId) -> impl Iterator<Item = &LedgerEntry> + '_ {
        self.by_account
            .get(account_id)
            .into_iter()
            .flat_map(|positions| positions.iter().rev())
            .map(move |&pos| &self.entries[pos])
    }

    fn recent_for(&self, account_id: &AccountId, within: Duration, now: DateTime<Utc>) -> Vec<Transaction> {
        self.account_entries(account_id)
            .filter(|entry| within_window(entry.timestamp(), now, within))
            .map(|entry| entry.transaction.clone())
            .collect()
    }

    fn most_recent_for(&self, account_id: &AccountId) -> Option<&LedgerEntry> {
        self.account_entries(account_id).next()
    }

    /// History the scorer needs: the velocity window plus the latest entry
    fn scoring_history(&self, account_id: &AccountId, window: Duration, now: DateTime<Utc>) -> Vec<Transaction> {
        let mut history = self.recent_for(account_id, window, now);
        if let Some(latest) = self.most_recent_for(account_id) {
            if !history.iter().any(|tx| tx.id == latest.id()) {
                history.push(latest.transaction.clone());
            }
        }
        history
    }
}

/// Main ledger interface
pub struct Ledger {
    state: RwLock<LedgerState>,

    /// Scoring engine
    scorer: RiskScorer,

    /// Time source for stamping and windowed queries
    clock: Arc<dyn Clock>,

    /// Optional persistence backend
    store: Option<Arc<dyn SnapshotStore>>,

    /// Serializes snapshot writes so a newer snapshot is never overwritten
    persist_lock: Mutex<()>,
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("len", &self.len())
            .field("scorer", &self.scorer)
            .field("clock", &self.clock)
            .field("store", &self.store)
            .finish()
    }
}

impl Ledger {
    /// Empty ledger with the default scoring rules
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_scorer(RiskScorer::default(), clock)
    }

    /// Empty ledger with a configured scorer
    pub fn with_scorer(scorer: RiskScorer, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            scorer,
            clock,
            store: None,
            persist_lock: Mutex::new(()),
        }
    }

    /// Rebuild from stored entries without rescoring them.
    ///
    /// Entries are ordered by id; duplicate ids or invalid fields fail the
    /// whole restore.
    pub fn restore(mut entries: Vec<LedgerEntry>, scorer: RiskScorer, clock: Arc<dyn Clock>) -> Result<Self> {
        entries.sort_by_key(|entry| entry.id());

        let ledger = Self::with_scorer(scorer, clock);
        {
            let mut state = ledger.state.write();
            for entry in entries {
                let tx = &entry.transaction;
                check_fields(&tx.account_id, tx.amount, &tx.location)?;
                state.push(entry)?;
            }
        }
        tracing::info!("Restored ledger with {} transactions", ledger.len());
        Ok(ledger)
    }

    /// Open according to configuration, restoring the snapshot file if set
    pub fn open(config: &LedgerConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let scorer = RiskScorer::new(config.scoring.clone())?;

        match &config.snapshot_path {
            Some(path) => {
                let store = Arc::new(JsonFileStore::new(path));
                let entries = store.load()?;
                Ok(Self::restore(entries, scorer, clock)?.with_store(store))
            }
            None => Ok(Self::with_scorer(scorer, clock)),
        }
    }

    /// Attach a persistence backend
    pub fn with_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Scoring engine in use
    pub fn scorer(&self) -> &RiskScorer {
        &self.scorer
    }

    /// Validate, stamp, score and append a new transaction.
    ///
    /// History lookup, scoring and append happen under one write lock.
    pub fn submit(&self, request: TransactionRequest) -> Result<LedgerEntry> {
        validate(&request)?;

        let mut state = self.state.write();
        let now = self.clock.now();
        let transaction = Transaction {
            id: state.next_id(),
            account_id: request.account_id,
            amount: request.amount,
            location: request.location,
            timestamp: now,
        };

        let history = state.scoring_history(
            &transaction.account_id,
            self.scorer.config().velocity_window(),
            now,
        );
        let result = self.scorer.evaluate(&transaction, &history);

        tracing::info!(
            transaction_id = %transaction.id,
            account_id = %transaction.account_id,
            status = %result.status,
            risk_tier = %result.risk_tier,
            risk_score = %result.risk_score,
            "Transaction evaluated"
        );

        state.push(LedgerEntry { transaction, result })
    }

    /// Append an already-scored transaction
    pub fn append(&self, transaction: Transaction, result: EvaluationResult) -> Result<LedgerEntry> {
        check_fields(&transaction.account_id, transaction.amount, &transaction.location)?;
        self.state.write().push(LedgerEntry { transaction, result })
    }

    /// Account transactions within `within` of now, most recent first
    pub fn recent_for(&self, account_id: &AccountId, within: Duration) -> Vec<Transaction> {
        self.recent_for_at(account_id, within, self.clock.now())
    }

    /// Account transactions within `within` of `now`, most recent first
    pub fn recent_for_at(&self, account_id: &AccountId, within: Duration, now: DateTime<Utc>) -> Vec<Transaction> {
        self.state.read().recent_for(account_id, within, now)
    }

    /// Latest transaction for the account
    pub fn most_recent_for(&self, account_id: &AccountId) -> Option<Transaction> {
        self.state
            .read()
            .most_recent_for(account_id)
            .map(|entry| entry.transaction.clone())
    }

    /// Every entry for the account, most recent first
    pub fn history_for(&self, account_id: &AccountId) -> Vec<LedgerEntry> {
        self.state.read().account_entries(account_id).cloned().collect()
    }

    /// Latest entries across all accounts, most recent first
    pub fn recent(&self, limit: usize) -> Vec<LedgerEntry> {
        self.state
            .read()
            .entries
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Chronological copy of all entries
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.state.read().entries.clone()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    /// True when nothing has been appended
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aggregate counts
    pub fn statistics(&self) -> Statistics {
        let state = self.state.read();
        Statistics::from_counts(state.clean, state.suspicious)
    }

    /// Statistics plus the latest `limit` entries
    pub fn report(&self, limit: usize) -> LedgerReport {
        let state = self.state.read();
        let statistics = Statistics::from_counts(state.clean, state.suspicious);
        let fraud_rate_percent = statistics.fraud_rate_percent();
        LedgerReport {
            system: REPORT_SYSTEM.to_string(),
            generated_at: self.clock.now(),
            statistics,
            fraud_rate_percent,
            recent_transactions: state.entries.iter().rev().take(limit).cloned().collect(),
        }
    }

    /// Write the current snapshot to the attached store, if any
    pub fn persist(&self) -> Result<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };

        let _guard = self.persist_lock.lock();
        let entries = self.entries();
        store.save(&entries)
    }
}
