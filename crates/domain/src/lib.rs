//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod action;
mod condition;
mod entity;
mod event;
mod security;
mod workflow;

pub use action::{
    ActionPhase, AuthorizationType, CreateTaskAction, DueOffset, EditPropertyAction,
    EmailParticipant, HttpMethod, MAX_DUE_OFFSET_DAYS, ReassignAction, SendEmailAction,
    TaskAssignee, WebhookAction, WebhookEntity, WebhookParameter, WorkflowAction,
};
pub use condition::{ConditionExpression, ConditionOperator, ConditionType, WorkflowCondition};
pub use entity::{EntityAction, EntityId, EntityType, TriggerFrequency};
pub use event::{EntityChangeEvent, EventMetadata};
pub use security::{Actor, Permission};
pub use workflow::{
    TriggerType, Workflow, WorkflowExecutionStats, WorkflowId, WorkflowInput, WorkflowSnapshot,
    WorkflowTrigger,
};
