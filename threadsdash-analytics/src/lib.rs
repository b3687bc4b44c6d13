pub mod config;
pub mod events;
pub mod models;
pub mod repository;
pub mod routes;
pub mod schema;
pub mod services;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use threadsdash_shared::clients::rabbitmq::RabbitMQClient;
use threadsdash_shared::middleware::metrics_middleware;

use repository::AnalyticsRepository;

pub struct AppState {
    pub config: config::AppConfig,
    pub store: Arc<dyn AnalyticsRepository>,
    /// Present when the metrics-synced subscriber is connected.
    pub rabbitmq: Option<RabbitMQClient>,
    pub metrics_handle: PrometheusHandle,
}

pub fn router(state: Arc<AppState>) -> Router {
    use routes::{analytics, health};

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .route("/accounts/:id/analytics/summary", get(analytics::get_summary))
        .route("/accounts/:id/analytics/top-posts", get(analytics::get_top_posts))
        .route("/accounts/:id/analytics/optimal-times", get(analytics::get_optimal_times))
        .route("/accounts/:id/analytics/insights", get(analytics::get_insights))
        .route("/accounts/:id/analytics/daily", get(analytics::get_daily))
        .route("/accounts/:id/analytics/export.csv", get(analytics::export_csv))
        .layer(axum::middleware::from_fn(metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
