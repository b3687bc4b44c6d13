pub mod config;
pub mod events;
pub mod models;
pub mod repository;
pub mod routes;
pub mod scheduler;
pub mod schema;

use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use threadsdash_shared::clients::rabbitmq::RabbitMQClient;
use threadsdash_shared::middleware::metrics_middleware;

use repository::QueueRepository;
use scheduler::assign::AccountLocks;

pub struct AppState {
    pub config: config::AppConfig,
    pub store: Arc<dyn QueueRepository>,
    pub locks: AccountLocks,
    /// `None` disables `post.scheduled` events.
    pub rabbitmq: Option<RabbitMQClient>,
    pub metrics_handle: PrometheusHandle,
}

pub fn router(state: Arc<AppState>) -> Router {
    use routes::{health, queue, slots};

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        // Slot lifecycle
        .route(
            "/accounts/:account_id/slots",
            get(slots::list_slots).post(slots::create_slot),
        )
        .route(
            "/slots/:slot_id",
            patch(slots::update_slot).delete(slots::delete_slot),
        )
        // Queue
        .route("/accounts/:account_id/queue/next-slot", get(queue::next_slot))
        .route(
            "/accounts/:account_id/queue/posts/:post_id",
            post(queue::enqueue_post),
        )
        .route("/accounts/:account_id/queue/batch", post(queue::batch_enqueue))
        .layer(axum::middleware::from_fn(metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
