use async_trait::async_trait;
use ruleflow_core::AppResult;
use ruleflow_domain::EventMetadata;

/// Port yielding the bearer token used for directory calls on behalf of an
/// event.
#[async_trait]
pub trait AuthTokenProvider: Send + Sync {
    /// Returns a bearer token valid for the event's tenant and user.
    async fn bearer_token(&self, metadata: &EventMetadata) -> AppResult<String>;
}
