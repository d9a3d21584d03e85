//! booking-gateway server entry point.
//!
//! Starts the Axum HTTP server exposing the booking REST endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use booking_gateway::api;
use booking_gateway::app_state::AppState;
use booking_gateway::audit::{AuditSink, TracingAuditSink};
use booking_gateway::config::GatewayConfig;
use booking_gateway::domain::{BookingStore, EventCatalog};
use booking_gateway::persistence::PostgresAuditSink;
use booking_gateway::service::BookingService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    tracing::info!(addr = %config.listen_addr, "starting booking-gateway");

    // Build domain layer
    let store = Arc::new(BookingStore::new());
    let catalog = Arc::new(EventCatalog::new());

    // Select the audit sink
    let (audit_sink, audit_log): (Arc<dyn AuditSink>, Option<PostgresAuditSink>) =
        if config.audit_persistence_enabled {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .min_connections(config.database_min_connections)
                .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
                .connect(&config.database_url)
                .await?;
            let sink = PostgresAuditSink::new(pool);
            sink.ensure_schema().await?;
            tracing::info!("audit persistence enabled");
            (Arc::new(sink.clone()), Some(sink))
        } else {
            (Arc::new(TracingAuditSink), None)
        };

    // Build service layer
    let booking_service = Arc::new(BookingService::new(
        store,
        catalog,
        audit_sink,
        config.audit_policy,
    ));

    // Build application state
    let app_state = AppState {
        booking_service,
        audit_log,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
