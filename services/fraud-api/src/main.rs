use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use fraud_api::{
    config::Config,
    handlers::{self, ReportLimit},
    metrics,
    notify::{spawn_dispatcher, LogNotifier, NotificationHistory, NotificationQueue},
};
use ledger_core::{Ledger, SystemClock};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    info!("Starting Fraud API...");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Configuration loaded successfully");

    metrics::init();

    // Open ledger, restoring the snapshot if one is configured
    let ledger = Arc::new(
        Ledger::open(&config.ledger, Arc::new(SystemClock)).context("Failed to open ledger")?,
    );
    info!("Ledger opened with {} transactions", ledger.len());

    let history = Arc::new(NotificationHistory::new(config.notifications.history_limit));
    let queue = if config.notifications.enabled {
        let (queue, _dispatcher) = spawn_dispatcher(
            Arc::new(LogNotifier),
            config.notifications.queue_capacity,
            config.notifications.confirmations,
            history.clone(),
        );
        queue
    } else {
        info!("Notifications disabled");
        NotificationQueue::disabled()
    };

    let report_limit = ReportLimit(config.ledger.report_limit);
    let server_config = config.server.clone();

    info!(
        "Starting HTTP server on {}:{}",
        server_config.host, server_config.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(ledger.clone()))
            .app_data(web::Data::new(queue.clone()))
            .app_data(web::Data::new(history.clone()))
            .app_data(web::Data::new(report_limit))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(middleware::Logger::default())
            .configure(handlers::configure_routes)
    })
    .workers(server_config.workers)
    .bind((server_config.host, server_config.port))?
    .run()
    .await?;

    info!("Fraud API stopped");
    Ok(())
}
