use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};
use futures_lite::StreamExt;
use lapin::options::BasicAckOptions;

use threadsdash_shared::clients::rabbitmq::RabbitMQClient;
use threadsdash_shared::errors::AppResult;
use threadsdash_shared::types::event::{payloads::MetricsSynced, routing_keys, Event};
use threadsdash_shared::types::DailyAnalytics;

use crate::repository::AnalyticsRepository;
use crate::services::aggregation::aggregate_account;
use crate::AppState;

const QUEUE_NAME: &str = "threadsdash-analytics.metrics-synced";

/// Re-aggregate today's snapshot of the account whose post metrics changed.
/// Unknown accounts are ignored.
pub fn handle_metrics_synced<R, Tz>(
    repo: &R,
    payload: &MetricsSynced,
    now: &DateTime<Tz>,
) -> AppResult<Option<DailyAnalytics>>
where
    R: AnalyticsRepository + ?Sized,
    Tz: TimeZone,
{
    let Some(account) = repo.get_account(payload.account_id)? else {
        tracing::warn!(account_id = %payload.account_id, post_id = %payload.post_id, "metrics synced for unknown account");
        return Ok(None);
    };

    aggregate_account(repo, &account, now).map(Some)
}

/// Consume `threadsdash.posts.metrics.synced` until the channel closes.
/// Every delivery is acked, malformed ones included, so a bad message
/// cannot wedge the queue.
pub async fn listen_metrics_synced(state: Arc<AppState>, rabbitmq: RabbitMQClient) -> anyhow::Result<()> {
    let mut consumer = rabbitmq
        .subscribe(QUEUE_NAME, &[routing_keys::POSTS_METRICS_SYNCED])
        .await?;

    tracing::info!(queue = QUEUE_NAME, "analytics subscriber listening for metrics.synced");

    while let Some(delivery) = consumer.next().await {
        let delivery = match delivery {
            Ok(d) => d,
            Err(e) => {
                tracing::error!(error = %e, "analytics consumer error");
                continue;
            }
        };

        match serde_json::from_slice::<Event<MetricsSynced>>(&delivery.data) {
            Ok(event) => {
                tracing::debug!(
                    event_id = %event.id,
                    post_id = %event.data.post_id,
                    account_id = %event.data.account_id,
                    "metrics.synced received"
                );
                if let Err(e) = handle_metrics_synced(&*state.store, &event.data, &Local::now()) {
                    tracing::error!(error = %e, account_id = %event.data.account_id, "re-aggregation after metrics sync failed");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, routing_key = %delivery.routing_key, "failed to parse metrics.synced event");
            }
        }

        if let Err(e) = delivery.ack(BasicAckOptions::default()).await {
            tracing::error!(error = %e, "failed to ack delivery");
        }
    }

    Ok(())
}
