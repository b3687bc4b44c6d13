use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;

use threadsdash_shared::{HealthResponse, HealthStatus};

use crate::AppState;

/// Probes the store and, when configured, the RabbitMQ channel.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let mut checks = vec![state.store.check_health()];

    // Events are best effort; assignments still work without them.
    checks.extend(state.rabbitmq.as_ref().map(|r| r.check_health()));

    let response = HealthResponse::healthy("threadsdash-queue", env!("CARGO_PKG_VERSION"))
        .with_checks(checks);

    let status = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(response)).into_response()
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}
