//! Exposition, dump, health, and test-metric handlers.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::Json;
use tracing::{error, info};

use crate::ApiState;

/// GET /metrics
///
/// Renders the current store contents as Prometheus text, fresh on every
/// request. Render failures surface as a 500 without touching collector or
/// flusher state.
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    match meterline_render::render(state.store.as_ref()).await {
        Ok(body) => (
            [(header::CONTENT_TYPE, meterline_render::CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "error rendering metrics").into_response()
        }
    }
}

/// GET /healthz
pub async fn healthz(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.health_check().await {
        Ok(()) => (StatusCode::OK, "ok").into_response(),
        Err(e) => {
            error!(error = %e, backend = state.store.backend_name(), "store health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "store unavailable").into_response()
        }
    }
}

/// GET /api/v1/metrics
pub async fn metrics_dump(State(state): State<ApiState>) -> impl IntoResponse {
    match meterline_render::snapshot_dump(state.store.as_ref()).await {
        Ok(metrics) => Json(serde_json::json!({
            "count": metrics.len(),
            "metrics": metrics,
        }))
        .into_response(),
        Err(e) => {
            error!(error = %e, "failed to dump snapshots");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": e.to_string()})),
            )
                .into_response()
        }
    }
}

/// POST /api/v1/test/generate
///
/// Records one sample of each metric kind so a fresh deployment has
/// something to flush and render.
pub async fn generate_test_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    state
        .collector
        .increment_counter("test_requests_total", 1.0, &[("method", "GET"), ("status", "200")]);
    state
        .collector
        .set_gauge("test_active_connections", 42.0, &[("service", "api")]);
    state
        .collector
        .record_histogram("test_request_duration_seconds", 0.125, &[("method", "GET")]);

    info!("test metrics generated");
    Json(serde_json::json!({"message": "test metrics generated"}))
}
