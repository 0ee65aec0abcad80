use crate::errors::{ApiError, ApiResult};
use crate::metrics::{self, ALERTS_TOTAL, EVALUATION_DURATION, REJECTED_TOTAL, TRANSACTIONS_TOTAL};
use crate::models::*;
use crate::notify::{NotificationHistory, NotificationQueue};
use actix_web::{web, HttpResponse};
use chrono::Duration;
use ledger_core::{Ledger, TransactionRequest};
use risk_engine::{AccountId, TransactionId};
use std::sync::Arc;

/// Report size when the request does not ask for one
#[derive(Debug, Clone, Copy)]
pub struct ReportLimit(pub usize);

// ===== Health Check =====
pub async fn health_check(ledger: web::Data<Arc<Ledger>>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        transactions: ledger.len(),
    })
}

// ===== Submit Transaction =====
pub async fn submit_transaction(
    req: web::Json<TransactionRequest>,
    ledger: web::Data<Arc<Ledger>>,
    queue: web::Data<NotificationQueue>,
) -> ApiResult<HttpResponse> {
    let request = req.into_inner();
    let ledger = ledger.get_ref().clone();

    let timer = EVALUATION_DURATION.start_timer();
    let submitted = {
        let ledger = ledger.clone();
        web::block(move || ledger.submit(request))
            .await
            .map_err(|e| ApiError::InternalError(e.to_string()))?
    };
    timer.observe_duration();

    let entry = match submitted {
        Ok(entry) => entry,
        Err(e) => {
            if e.is_validation() {
                REJECTED_TOTAL.with_label_values(&["validation"]).inc();
            }
            return Err(e.into());
        }
    };

    TRANSACTIONS_TOTAL
        .with_label_values(&[entry.status().as_str()])
        .inc();
    for alert in &entry.result.alerts {
        ALERTS_TOTAL.with_label_values(&[alert.label()]).inc();
    }

    // Downstream collaborators run after the result is fixed and never fail the request
    queue.enqueue_for(&entry);
    let transaction_id = entry.id();
    tokio::task::spawn_blocking(move || {
        if let Err(e) = ledger.persist() {
            tracing::error!(transaction_id = %transaction_id, "Failed to persist snapshot: {}", e);
        }
    });

    Ok(HttpResponse::Created().json(entry))
}

// ===== List Transactions =====
pub async fn list_transactions(
    query: web::Query<LimitQuery>,
    ledger: web::Data<Arc<Ledger>>,
) -> HttpResponse {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    HttpResponse::Ok().json(ledger.recent(limit))
}

// ===== Account History =====
pub async fn account_history(
    path: web::Path<String>,
    query: web::Query<HistoryQuery>,
    ledger: web::Data<Arc<Ledger>>,
) -> ApiResult<HttpResponse> {
    let account_id = AccountId::new(path.into_inner());

    match query.within_secs {
        Some(secs) => {
            let window = i64::try_from(secs)
                .ok()
                .and_then(Duration::try_seconds)
                .ok_or_else(|| ApiError::ValidationError(format!("within_secs out of range: {}", secs)))?;
            Ok(HttpResponse::Ok().json(ledger.recent_for(&account_id, window)))
        }
        None => Ok(HttpResponse::Ok().json(ledger.history_for(&account_id))),
    }
}

// ===== Statistics =====
pub async fn get_statistics(ledger: web::Data<Arc<Ledger>>) -> HttpResponse {
    HttpResponse::Ok().json(ledger.statistics())
}

// ===== Report Export =====
pub async fn get_report(
    query: web::Query<LimitQuery>,
    ledger: web::Data<Arc<Ledger>>,
    default_limit: web::Data<ReportLimit>,
) -> HttpResponse {
    let limit = query.limit.unwrap_or(default_limit.0);
    HttpResponse::Ok().json(ledger.report(limit))
}

// ===== Notification History =====
pub async fn list_notifications(
    query: web::Query<LimitQuery>,
    history: web::Data<Arc<NotificationHistory>>,
) -> HttpResponse {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    HttpResponse::Ok().json(history.recent(limit))
}

pub async fn transaction_notifications(
    path: web::Path<u64>,
    history: web::Data<Arc<NotificationHistory>>,
) -> HttpResponse {
    let transaction_id = TransactionId::new(path.into_inner());
    HttpResponse::Ok().json(history.for_transaction(transaction_id))
}

// ===== Prometheus =====
pub async fn metrics_endpoint() -> ApiResult<HttpResponse> {
    let body = metrics::render(&metrics::REGISTRY).map_err(|e| ApiError::InternalError(e.to_string()))?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

// ===== Configure Routes =====
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::ValidationError(err.to_string()).into())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .app_data(json_config())
            .route("/transactions", web::post().to(submit_transaction))
            .route("/transactions", web::get().to(list_transactions))
            .route(
                "/accounts/{account_id}/transactions",
                web::get().to(account_history),
            )
            .route("/statistics", web::get().to(get_statistics))
            .route("/report", web::get().to(get_report))
            .route("/notifications", web::get().to(list_notifications))
            .route(
                "/notifications/{transaction_id}",
                web::get().to(transaction_notifications),
            ),
    )
    .route("/health", web::get().to(health_check))
    .route("/metrics", web::get().to(metrics_endpoint));
}
