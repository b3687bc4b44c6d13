use chrono::{DateTime, Utc};
use uuid::Uuid;

use threadsdash_shared::clients::rabbitmq::RabbitMQClient;
use threadsdash_shared::types::event::{payloads, routing_keys, Event};

pub async fn publish_post_scheduled(
    rabbitmq: &RabbitMQClient,
    post_id: Uuid,
    account_id: Uuid,
    scheduled_for: DateTime<Utc>,
) {
    let event = Event::new(
        "threadsdash-queue",
        routing_keys::QUEUE_POST_SCHEDULED,
        payloads::PostScheduled {
            post_id,
            account_id,
            scheduled_for,
        },
    )
    .with_account(account_id);

    if let Err(e) = rabbitmq.publish(routing_keys::QUEUE_POST_SCHEDULED, &event).await {
        tracing::error!(error = %e, post_id = %post_id, "failed to publish post.scheduled event");
    }
}
