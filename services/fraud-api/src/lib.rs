pub mod config;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod notify;

// Re-exports for convenience
pub use notify::{LogNotifier, NotificationQueue, Notifier};
