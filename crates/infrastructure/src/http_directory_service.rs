//! HTTP-backed user, tenant and currency directory.

use async_trait::async_trait;
use ruleflow_application::{Currency, DirectoryService, TenantProfile, UserProfile};
use ruleflow_core::{AppError, AppResult, TenantId, UserId};
use serde::de::DeserializeOwned;

/// Directory adapter calling the identity and configuration services.
#[derive(Clone)]
pub struct HttpDirectoryService {
    http_client: reqwest::Client,
    iam_base_url: String,
    config_base_url: String,
}

impl HttpDirectoryService {
    /// Creates a directory adapter. Trailing slashes on base URLs are ignored.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        iam_base_url: impl Into<String>,
        config_base_url: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            iam_base_url: trim_base(iam_base_url.into()),
            config_base_url: trim_base(config_base_url.into()),
        }
    }

    fn user_url(&self, user_id: UserId) -> String {
        format!("{}/v1/users/{user_id}", self.iam_base_url)
    }

    fn tenant_url(&self, tenant_id: TenantId) -> String {
        format!("{}/v1/tenants/{tenant_id}", self.iam_base_url)
    }

    fn currency_url(&self, currency_id: i64) -> String {
        format!("{}/v1/currencies/{currency_id}", self.config_base_url)
    }

    async fn fetch<T>(&self, token: &str, url: &str, what: &str) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|error| {
                AppError::Integration(format!("failed to fetch {what} from '{url}': {error}"))
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("{what} not found at '{url}'")));
        }
        if !status.is_success() {
            return Err(AppError::Integration(format!(
                "{what} lookup at '{url}' failed with status {status}"
            )));
        }

        response.json::<T>().await.map_err(|error| {
            AppError::Integration(format!("failed to decode {what} from '{url}': {error}"))
        })
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_owned()
}

#[async_trait]
impl DirectoryService for HttpDirectoryService {
    async fn user(&self, token: &str, user_id: UserId) -> AppResult<UserProfile> {
        self.fetch(token, &self.user_url(user_id), "user").await
    }

    async fn tenant(&self, token: &str, tenant_id: TenantId) -> AppResult<TenantProfile> {
        self.fetch(token, &self.tenant_url(tenant_id), "tenant").await
    }

    async fn currency(&self, token: &str, currency_id: i64) -> AppResult<Currency> {
        self.fetch(token, &self.currency_url(currency_id), "currency")
            .await
    }
}
