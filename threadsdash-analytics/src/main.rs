use std::sync::Arc;

use threadsdash_analytics::config::AppConfig;
use threadsdash_analytics::events::subscriber;
use threadsdash_analytics::repository::PgAnalyticsStore;
use threadsdash_analytics::services::aggregation;
use threadsdash_analytics::{router, AppState};
use threadsdash_shared::clients::db::create_pool;
use threadsdash_shared::clients::rabbitmq::RabbitMQClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    threadsdash_shared::middleware::init_tracing("threadsdash-analytics");

    let config = AppConfig::load()?;
    let port = config.port;

    let metrics_handle = threadsdash_shared::middleware::init_metrics("threadsdash-analytics")?;
    let pool = create_pool(&config.database_url, config.db_pool_size)?;

    // Metric syncs trigger re-aggregation; without a broker the hourly run still covers it.
    let rabbitmq = match RabbitMQClient::connect(&config.rabbitmq_url).await {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!(error = %e, "RabbitMQ unavailable, metrics.synced subscriber disabled");
            None
        }
    };

    let state = Arc::new(AppState {
        config,
        store: Arc::new(PgAnalyticsStore::new(pool)),
        rabbitmq: rabbitmq.clone(),
        metrics_handle,
    });

    if let Some(rabbitmq) = rabbitmq {
        let sub_state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = subscriber::listen_metrics_synced(sub_state, rabbitmq).await {
                tracing::error!(error = %e, "analytics event subscriber failed");
            }
        });
    }

    aggregation::spawn_aggregation_task(state.clone());

    let app = router(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "threadsdash-analytics starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
