use async_trait::async_trait;
use ruleflow_core::AppResult;

use super::OutboundMessage;

/// Port for publishing commands and events to the broker.
#[async_trait]
pub trait CommandPublisher: Send + Sync {
    /// Publishes one message under its routing key.
    async fn publish(&self, message: OutboundMessage) -> AppResult<()>;
}
