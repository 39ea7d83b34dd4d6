//! API server — router assembly, HTTP startup, and the metrics exporter.

use crate::history::OutcomeHistory;
use crate::rest::{self, AppState};
use axum::routing::{get, post};
use axum::Router;
use churn_core::config::AppConfig;
use churn_engine::InterventionEngine;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// HTTP front end over a shared intervention engine.
pub struct ApiServer {
    config: AppConfig,
    engine: Arc<InterventionEngine>,
    history: Arc<OutcomeHistory>,
}

impl ApiServer {
    pub fn new(config: AppConfig, engine: Arc<InterventionEngine>) -> Self {
        Self {
            config,
            engine,
            history: Arc::new(OutcomeHistory::new()),
        }
    }

    /// Start the HTTP REST server. Runs until the listener fails.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let state = AppState {
            engine: self.engine.clone(),
            history: self.history.clone(),
            node_id: self.config.node_id.clone(),
            start_time: Instant::now(),
        };

        let app = Router::new()
            // Decision endpoints
            .route("/v1/decide", post(rest::handle_decide))
            .route("/v1/feedback", post(rest::handle_feedback))
            .route("/v1/dashboard", get(rest::handle_dashboard))
            // Operational endpoints
            .route("/health", get(rest::health_check))
            .route("/ready", get(rest::readiness))
            .route("/live", get(rest::liveness))
            // Middleware
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the Prometheus exporter on the metrics port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        builder
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");

        Ok(())
    }
}
