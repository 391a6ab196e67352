use ruleflow_core::{AppError, AppResult, UserId};
use serde::{Deserialize, Serialize};
use url::Url;

/// Side effect performed when a workflow fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowAction {
    /// Sets one property on the triggering entity.
    EditProperty(EditPropertyAction),
    /// Moves the triggering entity to a new owner.
    Reassign(ReassignAction),
    /// Creates a task linked to the triggering entity.
    CreateTask(CreateTaskAction),
    /// Calls an external HTTP endpoint.
    Webhook(WebhookAction),
    /// Sends a templated email.
    SendEmail(SendEmailAction),
}

/// Execution phase of an action; phases run in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionPhase {
    /// Entity edits land before anything reads the entity.
    EditProperty,
    /// Ownership change.
    Reassign,
    /// Task creation.
    CreateTask,
    /// Outbound webhook.
    Webhook,
    /// Outbound email.
    SendEmail,
}

impl WorkflowAction {
    /// Returns stable action type value.
    #[must_use]
    pub fn action_type(&self) -> &'static str {
        match self {
            Self::EditProperty(_) => "EDIT_PROPERTY",
            Self::Reassign(_) => "REASSIGN",
            Self::CreateTask(_) => "CREATE_TASK",
            Self::Webhook(_) => "WEBHOOK",
            Self::SendEmail(_) => "SEND_EMAIL",
        }
    }

    /// Returns the execution phase of the action.
    #[must_use]
    pub fn phase(&self) -> ActionPhase {
        match self {
            Self::EditProperty(_) => ActionPhase::EditProperty,
            Self::Reassign(_) => ActionPhase::Reassign,
            Self::CreateTask(_) => ActionPhase::CreateTask,
            Self::Webhook(_) => ActionPhase::Webhook,
            Self::SendEmail(_) => ActionPhase::SendEmail,
        }
    }

    /// Validates the action payload at workflow save time.
    pub fn validate(&self) -> AppResult<()> {
        match self {
            Self::EditProperty(action) => require_text(&action.name, "edit_property name"),
            Self::Reassign(action) => require_text(&action.name, "reassign owner name"),
            Self::CreateTask(action) => action.validate(),
            Self::Webhook(action) => action.validate(),
            Self::SendEmail(action) => action.validate(),
        }
    }
}

/// Property edit payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditPropertyAction {
    /// Target field name.
    pub name: String,
    /// Raw textual value converted to the field's declared shape.
    pub value: String,
}

/// Reassignment payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignAction {
    /// New owner id.
    pub owner_id: UserId,
    /// New owner display name.
    pub name: String,
}

/// Who a created task is assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskAssignee {
    /// A fixed user.
    User {
        /// Assigned user id.
        id: UserId,
    },
    /// The owner of the triggering record.
    RecordOwner,
}

/// Largest due offset accepted for created tasks, in days.
pub const MAX_DUE_OFFSET_DAYS: u32 = 3650;

/// Due date offset relative to workflow execution time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueOffset {
    /// Whole days to add.
    #[serde(default)]
    pub days: u32,
    /// Whole hours to add.
    #[serde(default)]
    pub hours: u32,
}

/// Task creation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskAction {
    /// Task title.
    pub name: String,
    /// Optional task description.
    #[serde(default)]
    pub description: Option<String>,
    /// Priority picklist id.
    #[serde(default)]
    pub priority: Option<i64>,
    /// Outcome picklist id.
    #[serde(default)]
    pub outcome: Option<i64>,
    /// Task type picklist id.
    #[serde(default)]
    pub task_type: Option<i64>,
    /// Status picklist id.
    #[serde(default)]
    pub status: Option<i64>,
    /// Assignee.
    pub assigned_to: TaskAssignee,
    /// Due date offset.
    #[serde(default)]
    pub due_offset: DueOffset,
}

impl CreateTaskAction {
    fn validate(&self) -> AppResult<()> {
        require_text(&self.name, "create_task name")?;
        if self.due_offset.days > MAX_DUE_OFFSET_DAYS {
            return Err(AppError::Validation(format!(
                "create_task due offset days must not exceed {MAX_DUE_OFFSET_DAYS}"
            )));
        }
        if self.due_offset.hours >= 24 * 365 {
            return Err(AppError::Validation(
                "create_task due offset hours must be less than one year".to_owned(),
            ));
        }

        Ok(())
    }
}

/// HTTP method used by webhook actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET with query parameters.
    Get,
    /// POST with JSON body.
    Post,
    /// PUT with JSON body.
    Put,
    /// PATCH with JSON body.
    Patch,
    /// DELETE with query parameters.
    Delete,
}

impl HttpMethod {
    /// Returns stable method value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Returns whether parameters travel in the query string.
    #[must_use]
    pub fn uses_query(&self) -> bool {
        matches!(self, Self::Get | Self::Delete)
    }
}

/// Webhook authorization scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationType {
    /// No authorization header.
    None,
    /// Custom API key header.
    ApiKey,
    /// Bearer token header.
    BearerToken,
    /// HTTP basic authentication.
    BasicAuth,
}

/// Logical entity a webhook parameter reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WebhookEntity {
    /// The triggering record itself.
    Record,
    /// The record owner.
    RecordOwner,
    /// The user who created the record.
    CreatedBy,
    /// The user who last updated the record.
    UpdatedBy,
    /// The tenant account.
    Tenant,
}

/// One named webhook parameter bound to an entity attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookParameter {
    /// Parameter name sent to the endpoint.
    pub name: String,
    /// Entity alias the attribute is read from.
    pub entity: WebhookEntity,
    /// Attribute name on the aliased entity.
    pub attribute: String,
}

/// Webhook payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAction {
    /// Webhook name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// HTTP method.
    pub method: HttpMethod,
    /// Endpoint URL.
    pub request_url: String,
    /// Authorization scheme.
    pub authorization_type: AuthorizationType,
    /// Encrypted authorization parameter, base64 encoded.
    #[serde(default)]
    pub authorization_parameter: Option<String>,
    /// Parameters resolved at execution time.
    #[serde(default)]
    pub parameters: Vec<WebhookParameter>,
}

impl WebhookAction {
    fn validate(&self) -> AppResult<()> {
        require_text(&self.name, "webhook name")?;

        let url = Url::parse(self.request_url.trim()).map_err(|error| {
            AppError::Validation(format!(
                "webhook '{}' has invalid request url: {error}",
                self.name
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::Validation(format!(
                "webhook '{}' request url must use http or https",
                self.name
            )));
        }

        if self.authorization_type != AuthorizationType::None
            && self
                .authorization_parameter
                .as_deref()
                .is_none_or(|value| value.trim().is_empty())
        {
            return Err(AppError::Validation(format!(
                "webhook '{}' requires an authorization parameter",
                self.name
            )));
        }

        for parameter in &self.parameters {
            require_text(&parameter.name, "webhook parameter name")?;
            require_text(&parameter.attribute, "webhook parameter attribute")?;
        }

        Ok(())
    }
}

/// Recipient or sender of a workflow email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmailParticipant {
    /// Explicit participant bound to a directory entity.
    Fixed {
        /// Participant entity kind, e.g. `user` or `contact`.
        entity: String,
        /// Participant entity id.
        id: i64,
        /// Display name.
        name: String,
        /// Email address.
        email: String,
    },
    /// Owner of the triggering record.
    RecordOwner,
    /// Creator of the triggering record.
    RecordCreatedBy,
    /// Last updater of the triggering record.
    RecordUpdatedBy,
    /// Every email address on the triggering record.
    AllAvailableEmails,
    /// The primary email address on the triggering record.
    PrimaryEmail,
}

/// Email payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailAction {
    /// Email template id.
    pub email_template_id: i64,
    /// Sender.
    pub from: EmailParticipant,
    /// Primary recipients.
    pub to: Vec<EmailParticipant>,
    /// Carbon-copy recipients.
    #[serde(default)]
    pub cc: Vec<EmailParticipant>,
    /// Blind carbon-copy recipients.
    #[serde(default)]
    pub bcc: Vec<EmailParticipant>,
}

impl SendEmailAction {
    fn validate(&self) -> AppResult<()> {
        if self.email_template_id <= 0 {
            return Err(AppError::Validation(
                "send_email action requires an email template".to_owned(),
            ));
        }

        if self.to.is_empty() {
            return Err(AppError::Validation(
                "send_email action requires at least one recipient".to_owned(),
            ));
        }

        Ok(())
    }
}

fn require_text(value: &str, label: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{label} must not be empty")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use ruleflow_core::UserId;
    use serde_json::json;

    use super::{
        ActionPhase, AuthorizationType, CreateTaskAction, DueOffset, EditPropertyAction,
        HttpMethod, MAX_DUE_OFFSET_DAYS, ReassignAction, TaskAssignee, WebhookAction,
        WorkflowAction,
    };

    fn webhook(url: &str) -> WebhookAction {
        WebhookAction {
            name: "notify".to_owned(),
            description: None,
            method: HttpMethod::Post,
            request_url: url.to_owned(),
            authorization_type: AuthorizationType::None,
            authorization_parameter: None,
            parameters: Vec::new(),
        }
    }

    #[test]
    fn webhook_rejects_unparseable_url() {
        let action = WorkflowAction::Webhook(webhook("not a url"));
        assert!(action.validate().is_err());
    }

    #[test]
    fn webhook_rejects_non_http_scheme() {
        let action = WorkflowAction::Webhook(webhook("ftp://example.com/hook"));
        assert!(action.validate().is_err());
    }

    #[test]
    fn webhook_requires_parameter_for_authorization() {
        let mut payload = webhook("https://example.com/hook");
        payload.authorization_type = AuthorizationType::BearerToken;

        assert!(WorkflowAction::Webhook(payload).validate().is_err());
    }

    #[test]
    fn create_task_rejects_due_offset_beyond_limit() {
        let task = |days| {
            WorkflowAction::CreateTask(CreateTaskAction {
                name: "Call back".to_owned(),
                description: None,
                priority: None,
                outcome: None,
                task_type: None,
                status: None,
                assigned_to: TaskAssignee::RecordOwner,
                due_offset: DueOffset { days, hours: 0 },
            })
        };

        assert!(task(MAX_DUE_OFFSET_DAYS).validate().is_ok());
        assert!(task(MAX_DUE_OFFSET_DAYS + 1).validate().is_err());
        assert!(task(u32::MAX).validate().is_err());
    }

    #[test]
    fn phases_order_edits_before_reassign() {
        let edit = WorkflowAction::EditProperty(EditPropertyAction {
            name: "city".to_owned(),
            value: "Pune".to_owned(),
        });
        let reassign = WorkflowAction::Reassign(ReassignAction {
            owner_id: UserId::new(7),
            name: "Jane".to_owned(),
        });

        assert!(edit.phase() < reassign.phase());
        assert!(ActionPhase::Webhook < ActionPhase::SendEmail);
    }

    #[test]
    fn action_parses_tagged_wire_form() {
        let parsed = serde_json::from_value::<WorkflowAction>(json!({
            "type": "REASSIGN",
            "payload": {"ownerId": 12, "name": "Jane Doe"}
        }));

        assert_eq!(
            parsed.ok(),
            Some(WorkflowAction::Reassign(ReassignAction {
                owner_id: UserId::new(12),
                name: "Jane Doe".to_owned(),
            }))
        );
    }
}
