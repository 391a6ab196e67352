//! Redis-backed entity change event consumer.

use ruleflow_core::{AppError, AppResult};
use ruleflow_domain::EntityChangeEvent;

/// Pops entity change events from a Redis list with a blocking pop.
#[derive(Clone)]
pub struct RedisEntityEventConsumer {
    client: redis::Client,
    queue_key: String,
    poll_timeout_seconds: u64,
}

impl RedisEntityEventConsumer {
    /// Creates a consumer reading `{key_prefix}:events`.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: &str, poll_timeout_seconds: u64) -> Self {
        Self {
            client,
            queue_key: format!("{key_prefix}:events"),
            poll_timeout_seconds,
        }
    }

    /// Returns the list key events are read from.
    #[must_use]
    pub fn queue_key(&self) -> &str {
        &self.queue_key
    }

    /// Waits up to the poll timeout for the next event.
    ///
    /// Returns `Ok(None)` when the timeout elapses. A payload that does not
    /// decode is consumed and reported as a validation error.
    pub async fn next_event(&self) -> AppResult<Option<EntityChangeEvent>> {
        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Integration(format!("failed to connect to redis: {error}")))?;

        let popped: Option<(String, String)> = redis::cmd("BRPOP")
            .arg(&self.queue_key)
            .arg(self.poll_timeout_seconds)
            .query_async(&mut connection)
            .await
            .map_err(|error| {
                AppError::Integration(format!(
                    "failed to pop from '{}': {error}",
                    self.queue_key
                ))
            })?;

        popped
            .map(|(_, payload)| decode_event(&payload))
            .transpose()
    }
}

fn decode_event(payload: &str) -> AppResult<EntityChangeEvent> {
    serde_json::from_str(payload)
        .map_err(|error| AppError::Validation(format!("malformed entity change event: {error}")))
}
