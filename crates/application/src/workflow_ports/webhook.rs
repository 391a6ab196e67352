use std::collections::BTreeMap;

use ruleflow_core::{AppResult, TenantId};
use ruleflow_domain::{HttpMethod, WorkflowId};

/// Resolved authorization for one webhook call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAuthorization {
    /// No credentials.
    None,
    /// A single header, used for API keys and bearer tokens.
    Header {
        /// Header name.
        name: String,
        /// Header value.
        value: String,
    },
    /// HTTP basic credentials.
    Basic {
        /// User name.
        username: String,
        /// Password.
        password: String,
    },
}

/// Fully resolved webhook call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookRequest {
    /// Workflow that issued the call.
    pub workflow_id: WorkflowId,
    /// Tenant of the workflow.
    pub tenant_id: TenantId,
    /// Webhook name, for logs.
    pub name: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Target URL.
    pub url: String,
    /// Credentials.
    pub authorization: WebhookAuthorization,
    /// Parameter name to rendered values. Absent parameters are omitted.
    pub parameters: BTreeMap<String, Vec<String>>,
}

/// Port for issuing webhook calls without waiting for the response.
pub trait WebhookClient: Send + Sync {
    /// Starts the call and returns immediately.
    fn fire(&self, request: WebhookRequest);
}

/// Port for decrypting stored webhook authorization parameters.
pub trait WebhookSecretDecryptor: Send + Sync {
    /// Decrypts one encoded authorization parameter.
    fn decrypt_parameter(&self, encoded: &str) -> AppResult<String>;
}
