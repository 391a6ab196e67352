use std::collections::BTreeSet;

use ruleflow_core::{TenantId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{EntityAction, EntityId, EntityType};
use crate::workflow::WorkflowId;

/// Per-event context threaded through workflow dispatch.
///
/// Values are never mutated in place: every `with_*` method returns a new
/// snapshot, and the executed-workflow set only ever grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    tenant_id: TenantId,
    user_id: UserId,
    entity_type: EntityType,
    entity_action: EntityAction,
    #[serde(default)]
    entity_id: Option<EntityId>,
    #[serde(default)]
    workflow_id: Option<WorkflowId>,
    #[serde(default)]
    executed_workflows: BTreeSet<WorkflowId>,
}

impl EventMetadata {
    /// Creates metadata for a fresh causal chain.
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        user_id: UserId,
        entity_type: EntityType,
        entity_action: EntityAction,
    ) -> Self {
        Self {
            tenant_id,
            user_id,
            entity_type,
            entity_action,
            entity_id: None,
            workflow_id: None,
            executed_workflows: BTreeSet::new(),
        }
    }

    /// Returns tenant id.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns acting user id.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns entity type of the triggering record.
    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Returns lifecycle action of the triggering event.
    #[must_use]
    pub fn entity_action(&self) -> EntityAction {
        self.entity_action
    }

    /// Returns triggering record id when known.
    #[must_use]
    pub fn entity_id(&self) -> Option<EntityId> {
        self.entity_id
    }

    /// Returns the workflow currently being processed.
    #[must_use]
    pub fn workflow_id(&self) -> Option<WorkflowId> {
        self.workflow_id
    }

    /// Returns workflows already executed in this causal chain.
    #[must_use]
    pub fn executed_workflows(&self) -> &BTreeSet<WorkflowId> {
        &self.executed_workflows
    }

    /// Returns whether the workflow already ran in this causal chain.
    #[must_use]
    pub fn has_executed(&self, workflow_id: WorkflowId) -> bool {
        self.executed_workflows.contains(&workflow_id)
    }

    /// Returns a copy with the record id set.
    #[must_use]
    pub fn with_entity_id(&self, entity_id: EntityId) -> Self {
        Self {
            entity_id: Some(entity_id),
            ..self.clone()
        }
    }

    /// Returns a copy with the workflow credited in the executed set.
    #[must_use]
    pub fn with_executed_workflow(&self, workflow_id: WorkflowId) -> Self {
        let mut executed_workflows = self.executed_workflows.clone();
        executed_workflows.insert(workflow_id);
        Self {
            executed_workflows,
            ..self.clone()
        }
    }

    /// Returns a copy stamped for one workflow: marks it as processing and
    /// credits it in the executed set.
    #[must_use]
    pub fn for_workflow(&self, workflow_id: WorkflowId) -> Self {
        Self {
            workflow_id: Some(workflow_id),
            ..self.with_executed_workflow(workflow_id)
        }
    }
}

/// Inbound domain-entity change delivered by the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityChangeEvent {
    /// Event context.
    pub metadata: EventMetadata,
    /// Entity payload after the change.
    pub entity: Value,
    /// Entity payload before the change, for update events.
    #[serde(default)]
    pub old_entity: Option<Value>,
}

impl EntityChangeEvent {
    /// Returns the record id from metadata, falling back to the payload `id`.
    #[must_use]
    pub fn entity_id(&self) -> Option<EntityId> {
        self.metadata.entity_id().or_else(|| {
            self.entity
                .get("id")
                .and_then(Value::as_i64)
                .map(EntityId::new)
        })
    }
}
