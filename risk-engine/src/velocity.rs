//! Sliding-window helpers for transaction velocity

use crate::Transaction;
use chrono::{DateTime, Duration, Utc};

/// True when `timestamp` lies less than `window` before `reference`.
///
/// Records stamped after the reference still count; timestamps are only
/// expected to be non-decreasing, not enforced.
pub fn within_window(timestamp: DateTime<Utc>, reference: DateTime<Utc>, window: Duration) -> bool {
    reference.signed_duration_since(timestamp) < window
}

/// Count transactions inside the window ending at `reference`
pub fn count_within<'a, I>(transactions: I, reference: DateTime<Utc>, window: Duration) -> usize
where
    I: IntoIterator<Item = &'a Transaction>,
{
    transactions
        .into_iter()
        .filter(|tx| within_window(tx.timestamp, reference, window))
        .count()
}
