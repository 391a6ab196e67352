use async_trait::async_trait;
use ruleflow_application::AuthTokenProvider;
use ruleflow_core::AppResult;
use ruleflow_domain::EventMetadata;

/// Token provider returning one configured service token for every event.
#[derive(Clone)]
pub struct StaticAuthTokenProvider {
    token: String,
}

impl StaticAuthTokenProvider {
    /// Creates a provider for the given service token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AuthTokenProvider for StaticAuthTokenProvider {
    async fn bearer_token(&self, _metadata: &EventMetadata) -> AppResult<String> {
        Ok(self.token.clone())
    }
}
