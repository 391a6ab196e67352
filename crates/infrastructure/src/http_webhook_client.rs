//! Fire-and-forget webhook client.

use std::collections::BTreeMap;

use ruleflow_application::{WebhookAuthorization, WebhookClient, WebhookRequest};
use ruleflow_domain::HttpMethod;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Webhook client that sends each call on the ambient tokio runtime.
#[derive(Clone)]
pub struct HttpWebhookClient {
    http_client: reqwest::Client,
}

impl HttpWebhookClient {
    /// Creates a webhook client.
    #[must_use]
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    fn build_request(&self, request: &WebhookRequest) -> reqwest::RequestBuilder {
        let builder = self
            .http_client
            .request(method_of(request.method), request.url.as_str());

        let builder = match &request.authorization {
            WebhookAuthorization::None => builder,
            WebhookAuthorization::Header { name, value } => builder.header(name, value),
            WebhookAuthorization::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
        };

        if request.method.uses_query() {
            builder.query(&query_pairs(&request.parameters))
        } else {
            builder.json(&json_body(&request.parameters))
        }
    }
}

fn method_of(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

fn query_pairs(parameters: &BTreeMap<String, Vec<String>>) -> Vec<(&str, &str)> {
    parameters
        .iter()
        .flat_map(|(name, values)| {
            values
                .iter()
                .map(move |value| (name.as_str(), value.as_str()))
        })
        .collect()
}

/// Single values travel as strings, repeated parameters as arrays.
fn json_body(parameters: &BTreeMap<String, Vec<String>>) -> Value {
    let body = parameters
        .iter()
        .map(|(name, values)| {
            let value = match values.as_slice() {
                [single] => Value::String(single.clone()),
                many => Value::Array(many.iter().cloned().map(Value::String).collect()),
            };
            (name.clone(), value)
        })
        .collect::<Map<String, Value>>();

    Value::Object(body)
}

impl WebhookClient for HttpWebhookClient {
    fn fire(&self, request: WebhookRequest) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(
                workflow_id = %request.workflow_id,
                webhook = %request.name,
                "no async runtime available, webhook not sent"
            );
            return;
        };

        let builder = self.build_request(&request);
        runtime.spawn(async move {
            match builder.send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(
                        workflow_id = %request.workflow_id,
                        webhook = %request.name,
                        status = %response.status(),
                        "webhook delivered"
                    );
                }
                Ok(response) => {
                    warn!(
                        tenant_id = %request.tenant_id,
                        workflow_id = %request.workflow_id,
                        webhook = %request.name,
                        url = %request.url,
                        status = %response.status(),
                        "webhook returned non-success status"
                    );
                }
                Err(error) => {
                    warn!(
                        tenant_id = %request.tenant_id,
                        workflow_id = %request.workflow_id,
                        webhook = %request.name,
                        url = %request.url,
                        error = %error,
                        "webhook transport error"
                    );
                }
            }
        });
    }
}
