use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;

use threadsdash_shared::{HealthResponse, HealthStatus};

use crate::AppState;

/// Store check plus the broker when the subscriber is running.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let mut checks = vec![state.store.check_health()];
    checks.extend(state.rabbitmq.as_ref().map(|r| r.check_health()));

    let response = HealthResponse::healthy("threadsdash-analytics", env!("CARGO_PKG_VERSION"))
        .with_checks(checks);

    let status = match response.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };

    (status, Json(response)).into_response()
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}
