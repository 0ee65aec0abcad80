use lazy_static::lazy_static;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Once;

static INIT: Once = Once::new();

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Business metrics
    pub static ref TRANSACTIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("fraud_transactions_total", "Total evaluated transactions"),
        &["status"]
    ).expect("metric can be created");

    pub static ref ALERTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("fraud_alerts_total", "Total alerts raised"),
        &["alert"]
    ).expect("metric can be created");

    pub static ref REJECTED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("fraud_rejected_submissions_total", "Submissions rejected before scoring"),
        &["reason"]
    ).expect("metric can be created");

    pub static ref EVALUATION_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new("fraud_evaluation_duration_seconds", "Submit (score + append) duration in seconds")
            .buckets(vec![0.00001, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05])
    ).expect("metric can be created");

    // Notification metrics
    pub static ref NOTIFICATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("fraud_notifications_total", "Notifications by outcome"),
        &["outcome"]
    ).expect("metric can be created");
}

/// Register all metrics with the given registry
pub fn register_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(TRANSACTIONS_TOTAL.clone()))?;
    registry.register(Box::new(ALERTS_TOTAL.clone()))?;
    registry.register(Box::new(REJECTED_TOTAL.clone()))?;
    registry.register(Box::new(EVALUATION_DURATION.clone()))?;
    registry.register(Box::new(NOTIFICATIONS_TOTAL.clone()))?;
    Ok(())
}

/// Register everything with the service registry, once per process
pub fn init() {
    INIT.call_once(|| {
        if let Err(e) = register_metrics(&REGISTRY) {
            tracing::error!("Failed to register metrics: {}", e);
        }
    });
}

/// Generate metrics output in Prometheus text format
pub fn render(registry: &Registry) -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
