//! Transdetect Ledger Core
//!
//! Append-only record of scored transactions.
//!
//! # Architecture
//!
//! - **Single Writer**: submissions take one write lock for history lookup,
//!   scoring and append, so concurrent submitters never see each other
//!   half-done
//! - **Immutable Results**: a transaction is scored once, before it is
//!   appended, and its result is never recomputed
//! - **Pluggable Snapshots**: persistence sits behind [`SnapshotStore`]
//!
//! # Invariants
//!
//! - Append-only: entries never modified or deleted
//! - Ids strictly increase in insertion order
//! - Unknown accounts have empty history, never an error

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod clock;
pub mod storage;
pub mod ledger;
pub mod error;
pub mod config;

// Re-exports
pub use error::{Error, Result};
pub use types::{validate, LedgerEntry, LedgerReport, Statistics, TransactionRequest};
pub use clock::{Clock, ManualClock, SystemClock};
pub use storage::{JsonFileStore, SnapshotStore};
pub use ledger::Ledger;
pub use config::LedgerConfig;
