use crate::config::ServerConfig;
use crate::server::{handlers, types::AppState};
use crate::service::PredictionService;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

pub fn create_router(
    service: PredictionService,
    metrics: PrometheusHandle,
    server: &ServerConfig,
) -> Router {
    let state = Arc::new(AppState {
        service,
        metrics,
        strict_status_codes: server.strict_status_codes,
    });

    // Unlimited unless configured; an oversized body becomes an error result.
    let body_limit = match server.max_body_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::render_metrics))
        .route("/predict", post(handlers::predict))
        .layer(body_limit)
        .with_state(state)
}
