use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use super::state::AppState;

const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/readiness", get(readiness_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// GET /health - process is up.
async fn health_handler() -> StatusCode {
    StatusCode::OK
}

/// GET /readiness - run every readiness check now. 500 if any failed.
async fn readiness_handler(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.monitor.readiness(&state.ctx.child()).await;
    let status = if report.is_ready() {
        StatusCode::OK
    } else {
        tracing::warn!(errors = ?report.errors(), "readiness check failed");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(report.to_json()))
}

/// GET /metrics - Prometheus text exposition.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)],
        state.registry.render(),
    )
}
