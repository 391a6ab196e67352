use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ruleflow_core::{AppResult, TenantId};
use ruleflow_domain::{EntityType, TriggerFrequency, Workflow, WorkflowId};

/// Read access to workflow definitions plus execution bookkeeping.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Lists active workflows for a tenant, entity type and trigger frequency.
    async fn list_active_workflows(
        &self,
        tenant_id: TenantId,
        entity_type: EntityType,
        frequency: TriggerFrequency,
    ) -> AppResult<Vec<Workflow>>;

    /// Increments the trigger counter and stamps the last-triggered time.
    async fn record_execution(
        &self,
        tenant_id: TenantId,
        workflow_id: WorkflowId,
        triggered_at: DateTime<Utc>,
    ) -> AppResult<()>;
}
