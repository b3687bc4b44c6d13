use std::sync::Arc;

use threadsdash_queue::config::AppConfig;
use threadsdash_queue::repository::PgQueueStore;
use threadsdash_queue::scheduler::assign::AccountLocks;
use threadsdash_queue::{router, AppState};
use threadsdash_shared::clients::db::create_pool;
use threadsdash_shared::clients::rabbitmq::RabbitMQClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    threadsdash_shared::middleware::init_tracing("threadsdash-queue");

    let config = AppConfig::load()?;

    let metrics_handle = threadsdash_shared::middleware::init_metrics("threadsdash-queue")?;

    // Database pool
    let pool = create_pool(&config.database_url, config.db_pool_size)?;

    // Events are optional: the queue keeps working without a broker.
    let rabbitmq = match RabbitMQClient::connect(&config.rabbitmq_url).await {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!(error = %e, "RabbitMQ unavailable, post.scheduled events disabled");
            None
        }
    };

    let state = Arc::new(AppState {
        config,
        store: Arc::new(PgQueueStore::new(pool)),
        locks: AccountLocks::new(),
        rabbitmq,
        metrics_handle,
    });

    let addr = format!("0.0.0.0:{}", state.config.port);
    let app = router(state);

    tracing::info!(addr = %addr, "threadsdash-queue starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
