use super::*;

use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiKeyCredential {
    key_name: String,
    value: String,
}

impl WorkflowService {
    pub(super) async fn execute_webhook(
        &self,
        workflow: &Workflow,
        entity: &Value,
        metadata: &EventMetadata,
        action: &WebhookAction,
    ) -> AppResult<()> {
        let authorization = self.webhook_authorization(action)?;
        let token = self.token_provider.bearer_token(metadata).await?;
        let parameters = self
            .parameter_builder
            .build(
                action,
                workflow.entity_type(),
                entity,
                workflow.tenant_id(),
                &token,
            )
            .await?;

        self.webhook_client.fire(WebhookRequest {
            workflow_id: workflow.id(),
            tenant_id: workflow.tenant_id(),
            name: action.name.clone(),
            method: action.method,
            url: action.request_url.trim().to_owned(),
            authorization,
            parameters,
        });
        debug!(workflow_id = %workflow.id(), webhook = %action.name, "webhook fired");

        Ok(())
    }

    fn webhook_authorization(&self, action: &WebhookAction) -> AppResult<WebhookAuthorization> {
        if action.authorization_type == AuthorizationType::None {
            return Ok(WebhookAuthorization::None);
        }

        let encoded = action
            .authorization_parameter
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                execution_error(
                    ExecutionStage::Webhook,
                    format!("webhook '{}' has no authorization parameter", action.name),
                )
            })?;
        let secret = self
            .secret_decryptor
            .decrypt_parameter(encoded)
            .map_err(|error| {
                execution_error(
                    ExecutionStage::Webhook,
                    format!(
                        "failed to decrypt authorization for webhook '{}': {error}",
                        action.name
                    ),
                )
            })?;

        match action.authorization_type {
            AuthorizationType::None => Ok(WebhookAuthorization::None),
            AuthorizationType::ApiKey => {
                let credential = serde_json::from_str::<ApiKeyCredential>(&secret).map_err(
                    |error| {
                        execution_error(
                            ExecutionStage::Webhook,
                            format!("webhook '{}' has a malformed api key: {error}", action.name),
                        )
                    },
                )?;

                Ok(WebhookAuthorization::Header {
                    name: credential.key_name,
                    value: credential.value,
                })
            }
            AuthorizationType::BearerToken => Ok(WebhookAuthorization::Header {
                name: "Authorization".to_owned(),
                value: format!("Bearer {secret}"),
            }),
            AuthorizationType::BasicAuth => {
                let (username, password) = secret.split_once(':').ok_or_else(|| {
                    execution_error(
                        ExecutionStage::Webhook,
                        format!(
                            "webhook '{}' basic credentials must be 'user:password'",
                            action.name
                        ),
                    )
                })?;

                Ok(WebhookAuthorization::Basic {
                    username: username.to_owned(),
                    password: password.to_owned(),
                })
            }
        }
    }
}
