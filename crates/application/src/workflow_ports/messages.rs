use chrono::{DateTime, Utc};
use ruleflow_core::UserId;
use ruleflow_domain::{EntityId, EntityType, EventMetadata};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Possibly mutated entity handed to the next stage after property edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityUpdatedCommand {
    /// Entity type.
    pub entity_type: EntityType,
    /// Record id when known.
    pub entity_id: Option<EntityId>,
    /// Entity payload after the edits.
    pub entity: Value,
    /// Propagated metadata.
    pub metadata: EventMetadata,
}

/// Ownership change request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignCommand {
    /// Entity type.
    pub entity_type: EntityType,
    /// Record to reassign.
    pub entity_id: EntityId,
    /// New owner.
    pub owner_id: UserId,
    /// New owner display name.
    pub owner_name: String,
    /// Propagated metadata.
    pub metadata: EventMetadata,
}

/// Record a created task is linked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRelation {
    /// Entity type.
    pub entity_type: EntityType,
    /// Record id.
    pub entity_id: EntityId,
}

/// Task creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreationEvent {
    /// Task title.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Priority picklist id.
    pub priority: Option<i64>,
    /// Outcome picklist id.
    pub outcome: Option<i64>,
    /// Task type picklist id.
    pub task_type: Option<i64>,
    /// Status picklist id.
    pub status: Option<i64>,
    /// Assignee.
    pub assigned_to: UserId,
    /// Absolute due date.
    pub due_date: DateTime<Utc>,
    /// Linked record.
    pub related_to: TaskRelation,
    /// Propagated metadata.
    pub metadata: EventMetadata,
}

/// Resolved email sender or recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRecipient {
    /// Entity kind, e.g. `user` or `lead`.
    pub entity: String,
    /// Entity id when known.
    pub id: Option<i64>,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
}

/// Email send request for the mail service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailEvent {
    /// Email template id.
    pub template_id: i64,
    /// Sender.
    pub from: EmailRecipient,
    /// Primary recipients.
    pub to: Vec<EmailRecipient>,
    /// Carbon-copy recipients.
    pub cc: Vec<EmailRecipient>,
    /// Blind carbon-copy recipients.
    pub bcc: Vec<EmailRecipient>,
    /// Entity type of the triggering record.
    pub entity_type: EntityType,
    /// Triggering record id when known.
    pub entity_id: Option<EntityId>,
    /// Propagated metadata.
    pub metadata: EventMetadata,
}

/// Message published by the workflow runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutboundMessage {
    /// Entity payload after property edits.
    EntityUpdated(EntityUpdatedCommand),
    /// Ownership change.
    Reassign(ReassignCommand),
    /// Task creation.
    CreateTask(TaskCreationEvent),
    /// Email send.
    SendEmail(SendEmailEvent),
}

impl OutboundMessage {
    /// Returns the broker routing key.
    #[must_use]
    pub fn routing_key(&self) -> &'static str {
        match self {
            Self::EntityUpdated(_) => "workflow.entity.updated",
            Self::Reassign(_) => "workflow.entity.reassign",
            Self::CreateTask(_) => "workflow.task.create",
            Self::SendEmail(_) => "workflow.email.send",
        }
    }

    /// Returns the metadata carried by the message.
    #[must_use]
    pub fn metadata(&self) -> &EventMetadata {
        match self {
            Self::EntityUpdated(command) => &command.metadata,
            Self::Reassign(command) => &command.metadata,
            Self::CreateTask(event) => &event.metadata,
            Self::SendEmail(event) => &event.metadata,
        }
    }
}
