//! Redis-backed command publisher.

use async_trait::async_trait;
use redis::AsyncCommands;
use ruleflow_application::{CommandPublisher, OutboundMessage};
use ruleflow_core::{AppError, AppResult};
use tracing::debug;

/// Publishes outbound messages by pushing JSON onto one list per routing key.
#[derive(Clone)]
pub struct RedisCommandPublisher {
    client: redis::Client,
    key_prefix: String,
}

impl RedisCommandPublisher {
    /// Creates a publisher with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn key_for(&self, routing_key: &str) -> String {
        format!("{}:{routing_key}", self.key_prefix)
    }
}

#[async_trait]
impl CommandPublisher for RedisCommandPublisher {
    async fn publish(&self, message: OutboundMessage) -> AppResult<()> {
        let key = self.key_for(message.routing_key());
        let payload = serde_json::to_string(&message).map_err(|error| {
            AppError::Internal(format!(
                "failed to encode '{}' message: {error}",
                message.routing_key()
            ))
        })?;

        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Integration(format!("failed to connect to redis: {error}")))?;

        let _: i64 = connection.lpush(&key, payload).await.map_err(|error| {
            AppError::Integration(format!("failed to publish message to '{key}': {error}"))
        })?;
        debug!(queue = %key, "published workflow message");

        Ok(())
    }
}
