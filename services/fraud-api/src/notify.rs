//! Notification dispatch
//!
//! Scoring never waits on delivery. Handlers push onto a bounded queue and a
//! single dispatcher task drains it into a [`Notifier`]:
//!
//! ```text
//! handler ──try_send──▶ mpsc (bounded) ──▶ dispatcher task ──▶ Notifier
//!                                                 │
//!                                                 ▼
//!                                        NotificationHistory
//! ```
//!
//! A full or closed queue drops the notification with a warning.

use crate::metrics::NOTIFICATIONS_TOTAL;
use chrono::{DateTime, Utc};
use ledger_core::LedgerEntry;
use parking_lot::Mutex;
use risk_engine::{AccountId, Alert, RiskScore, TransactionId, TransactionStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    FraudAlert,
    Confirmation,
}

/// Payload handed to a notifier
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub transaction_id: TransactionId,
    pub account_id: AccountId,
    pub amount: Decimal,
    pub location: String,
    pub alerts: Vec<Alert>,
    pub risk_score: RiskScore,
    pub status: TransactionStatus,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn from_entry(entry: &LedgerEntry, kind: NotificationKind) -> Self {
        let tx = &entry.transaction;
        Self {
            kind,
            transaction_id: tx.id,
            account_id: tx.account_id.clone(),
            amount: tx.amount,
            location: tx.location.clone(),
            alerts: entry.result.alerts.clone(),
            risk_score: entry.result.risk_score,
            status: entry.result.status,
            timestamp: tx.timestamp,
        }
    }

    /// Plain-text body for SMS/email style channels
    pub fn message(&self) -> String {
        match self.kind {
            NotificationKind::FraudAlert => format!(
                "FRAUD ALERT: Suspicious transaction detected\n\
                 Account: {}\nAmount: {}\nLocation: {}\nRisk Score: {}%\nAlerts: {}\nTime: {}\n\n\
                 Please review immediately.",
                self.account_id,
                self.amount,
                self.location,
                self.risk_score,
                self.alerts.iter().map(Alert::label).collect::<Vec<_>>().join(", "),
                self.timestamp.to_rfc3339(),
            ),
            NotificationKind::Confirmation => format!(
                "TRANSACTION CONFIRMED: Your transaction was processed\n\
                 Account: {}\nAmount: {}\nLocation: {}\nStatus: {}\nTime: {}",
                self.account_id,
                self.amount,
                self.location,
                self.status,
                self.timestamp.to_rfc3339(),
            ),
        }
    }
}

/// Delivery channel (SMS gateway, mailer, webhook, ...)
pub trait Notifier: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn deliver(&self, notification: &Notification) -> Result<(), String>;
}

/// Writes notifications to the log
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    fn deliver(&self, notification: &Notification) -> Result<(), String> {
        tracing::info!(
            transaction_id = %notification.transaction_id,
            kind = ?notification.kind,
            "{}",
            notification.message()
        );
        Ok(())
    }
}

/// Outcome of one delivery attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub transaction_id: TransactionId,
    pub kind: NotificationKind,
    pub channel: String,
    pub delivered_at: DateTime<Utc>,
    pub success: bool,
    pub error: Option<String>,
}

/// Bounded log of delivery attempts, newest first
#[derive(Debug)]
pub struct NotificationHistory {
    records: Mutex<VecDeque<DeliveryRecord>>,
    limit: usize,
}

impl NotificationHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(limit)),
            limit,
        }
    }

    pub fn record(&self, record: DeliveryRecord) {
        let mut records = self.records.lock();
        records.push_front(record);
        records.truncate(self.limit);
    }

    pub fn recent(&self, limit: usize) -> Vec<DeliveryRecord> {
        self.records.lock().iter().take(limit).cloned().collect()
    }

    pub fn for_transaction(&self, id: TransactionId) -> Vec<DeliveryRecord> {
        self.records
            .lock()
            .iter()
            .filter(|record| record.transaction_id == id)
            .cloned()
            .collect()
    }
}

/// Sending side of the dispatcher
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    sender: Option<mpsc::Sender<Notification>>,
    confirmations: bool,
}

impl NotificationQueue {
    /// Queue that drops everything
    pub fn disabled() -> Self {
        Self {
            sender: None,
            confirmations: false,
        }
    }

    /// Enqueue the notification an entry calls for, if any.
    ///
    /// Returns true when something was queued.
    pub fn enqueue_for(&self, entry: &LedgerEntry) -> bool {
        let Some(sender) = &self.sender else {
            return false;
        };

        let kind = match entry.status() {
            TransactionStatus::Suspicious => NotificationKind::FraudAlert,
            TransactionStatus::Clean if self.confirmations => NotificationKind::Confirmation,
            TransactionStatus::Clean => return false,
        };

        match sender.try_send(Notification::from_entry(entry, kind)) {
            Ok(()) => {
                NOTIFICATIONS_TOTAL.with_label_values(&["queued"]).inc();
                true
            }
            Err(TrySendError::Full(n)) => {
                tracing::warn!(transaction_id = %n.transaction_id, "Notification queue full, dropping");
                NOTIFICATIONS_TOTAL.with_label_values(&["dropped"]).inc();
                false
            }
            Err(TrySendError::Closed(n)) => {
                tracing::warn!(transaction_id = %n.transaction_id, "Notification dispatcher stopped, dropping");
                NOTIFICATIONS_TOTAL.with_label_values(&["dropped"]).inc();
                false
            }
        }
    }
}

/// Spawn the dispatcher task. It exits once every queue clone is dropped.
pub fn spawn_dispatcher(
    notifier: Arc<dyn Notifier>,
    capacity: usize,
    confirmations: bool,
    history: Arc<NotificationHistory>,
) -> (NotificationQueue, JoinHandle<()>) {
    let (sender, mut mailbox) = mpsc::channel::<Notification>(capacity.max(1));

    let handle = tokio::spawn(async move {
        while let Some(notification) = mailbox.recv().await {
            let result = notifier.deliver(&notification);
            let outcome = if result.is_ok() { "delivered" } else { "failed" };
            NOTIFICATIONS_TOTAL.with_label_values(&[outcome]).inc();

            if let Err(e) = &result {
                tracing::error!(
                    transaction_id = %notification.transaction_id,
                    channel = notifier.name(),
                    "Notification delivery failed: {}",
                    e
                );
            }

            history.record(DeliveryRecord {
                transaction_id: notification.transaction_id,
                kind: notification.kind,
                channel: notifier.name().to_string(),
                delivered_at: Utc::now(),
                success: result.is_ok(),
                error: result.err(),
            });
        }
        tracing::info!("Notification dispatcher stopped");
    });

    let queue = NotificationQueue {
        sender: Some(sender),
        confirmations,
    };
    (queue, handle)
}
