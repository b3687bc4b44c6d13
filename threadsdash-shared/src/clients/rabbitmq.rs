use lapin::{
    options::*, types::FieldTable, BasicProperties, Channel, Connection, ConnectionProperties,
    Consumer, ExchangeKind,
};
use serde::Serialize;

use crate::types::api::{HealthCheck, HealthStatus};
use crate::types::Event;

/// Topic exchange every ThreadsDash event goes through.
pub const EXCHANGE_NAME: &str = "threadsdash.events";

/// Unacked deliveries a consumer may hold at once.
const CONSUMER_PREFETCH: u16 = 16;

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("broker rejected event: {0}")]
    Broker(#[from] lapin::Error),
}

/// Serialize an event envelope into the message body.
pub fn encode_event<T: Serialize>(event: &Event<T>) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(event)
}

/// Broker check for `/health`. A closed channel degrades the service
/// without failing it.
pub fn broker_health(connected: bool) -> HealthCheck {
    if connected {
        HealthCheck::healthy("rabbitmq")
    } else {
        HealthCheck {
            name: "rabbitmq".into(),
            status: HealthStatus::Degraded,
            message: Some("channel closed".into()),
        }
    }
}

#[derive(Clone)]
pub struct RabbitMQClient {
    channel: Channel,
}

impl RabbitMQClient {
    /// Connect, open a channel and make sure the durable topic exchange exists.
    pub async fn connect(url: &str) -> Result<Self, lapin::Error> {
        let conn = Connection::connect(url, ConnectionProperties::default()).await?;
        let channel = conn.create_channel().await?;

        channel
            .exchange_declare(
                EXCHANGE_NAME,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        tracing::info!(exchange = EXCHANGE_NAME, "connected to RabbitMQ");
        Ok(Self { channel })
    }

    /// Publish a persistent JSON event and wait for the broker's confirmation.
    pub async fn publish<T: Serialize>(
        &self,
        routing_key: &str,
        event: &Event<T>,
    ) -> Result<(), PublishError> {
        let payload = encode_event(event)?;

        let mut properties = BasicProperties::default()
            .with_content_type("application/json".into())
            .with_message_id(event.id.to_string().into())
            .with_delivery_mode(2);
        if let Some(correlation_id) = event.correlation_id {
            properties = properties.with_correlation_id(correlation_id.to_string().into());
        }

        self.channel
            .basic_publish(
                EXCHANGE_NAME,
                routing_key,
                BasicPublishOptions::default(),
                &payload,
                properties,
            )
            .await?
            .await?;

        tracing::debug!(
            routing_key = %routing_key,
            event_id = %event.id,
            account_id = ?event.account_id,
            "event published"
        );

        Ok(())
    }

    /// Declare a durable queue, bind it to `routing_keys` and start consuming
    /// with manual acks.
    pub async fn subscribe(
        &self,
        queue_name: &str,
        routing_keys: &[&str],
    ) -> Result<Consumer, lapin::Error> {
        self.channel
            .basic_qos(CONSUMER_PREFETCH, BasicQosOptions::default())
            .await?;

        self.channel
            .queue_declare(
                queue_name,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        for key in routing_keys {
            self.channel
                .queue_bind(
                    queue_name,
                    EXCHANGE_NAME,
                    key,
                    QueueBindOptions::default(),
                    FieldTable::default(),
                )
                .await?;
        }

        let consumer = self
            .channel
            .basic_consume(
                queue_name,
                &format!("{queue_name}-consumer"),
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        tracing::info!(
            queue = %queue_name,
            bindings = ?routing_keys,
            prefetch = CONSUMER_PREFETCH,
            "subscribed to RabbitMQ queue"
        );

        Ok(consumer)
    }

    pub fn is_connected(&self) -> bool {
        self.channel.status().connected()
    }

    pub fn check_health(&self) -> HealthCheck {
        broker_health(self.is_connected())
    }
}
