use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// RabbitMQ Event envelope wrapping all domain events.
///
/// Routing key format: `threadsdash.{domain}.{entity}.{action}`
/// Example: `threadsdash.queue.post.scheduled`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event<T: Serialize> {
    pub id: Uuid,
    pub source: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub data: T,
}

impl<T: Serialize> Event<T> {
    pub fn new(source: impl Into<String>, event_type: impl Into<String>, data: T) -> Self {
        Self {
            id: Uuid::now_v7(),
            source: source.into(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            correlation_id: None,
            account_id: None,
            data,
        }
    }

    pub fn with_account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }
}

/// RabbitMQ routing keys
pub mod routing_keys {
    // Queue events
    pub const QUEUE_POST_SCHEDULED: &str = "threadsdash.queue.post.scheduled";

    // Post events (produced by the publishing worker)
    pub const POSTS_METRICS_SYNCED: &str = "threadsdash.posts.metrics.synced";
}

/// Common event data payloads
pub mod payloads {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PostScheduled {
        pub post_id: Uuid,
        pub account_id: Uuid,
        pub scheduled_for: DateTime<Utc>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MetricsSynced {
        pub post_id: Uuid,
        pub account_id: Uuid,
    }
}
