use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ruleflow_application::WorkflowStore;
use ruleflow_core::{AppError, AppResult, TenantId, UserId};
use ruleflow_domain::{
    EntityType, TriggerFrequency, Workflow, WorkflowAction, WorkflowCondition,
    WorkflowExecutionStats, WorkflowId, WorkflowSnapshot, WorkflowTrigger,
};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tracing::warn;

/// PostgreSQL-backed workflow store.
///
/// Conditions and actions live in JSONB columns using their wire form.
#[derive(Clone)]
pub struct PostgresWorkflowStore {
    pool: PgPool,
}

impl PostgresWorkflowStore {
    /// Creates a workflow store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct WorkflowRow {
    id: uuid::Uuid,
    tenant_id: i64,
    name: String,
    description: Option<String>,
    entity_type: String,
    trigger_frequency: String,
    condition: Value,
    actions: Value,
    active: bool,
    created_by: i64,
    updated_by: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    trigger_count: i64,
    last_triggered_at: Option<DateTime<Utc>>,
}

impl WorkflowRow {
    fn into_workflow(self) -> AppResult<Workflow> {
        let id = self.id;
        let condition = serde_json::from_value::<WorkflowCondition>(self.condition).map_err(
            |error| AppError::Internal(format!("workflow '{id}' has invalid condition: {error}")),
        )?;
        let actions = serde_json::from_value::<Vec<WorkflowAction>>(self.actions).map_err(
            |error| AppError::Internal(format!("workflow '{id}' has invalid actions: {error}")),
        )?;
        let trigger_count = u64::try_from(self.trigger_count).map_err(|error| {
            AppError::Internal(format!("workflow '{id}' has invalid trigger count: {error}"))
        })?;

        Workflow::restore(WorkflowSnapshot {
            id: WorkflowId::from_uuid(id),
            tenant_id: TenantId::new(self.tenant_id),
            name: self.name,
            description: self.description,
            entity_type: EntityType::from_str(&self.entity_type)?,
            trigger: WorkflowTrigger::on(TriggerFrequency::from_str(&self.trigger_frequency)?),
            condition,
            actions,
            active: self.active,
            created_by: UserId::new(self.created_by),
            updated_by: UserId::new(self.updated_by),
            created_at: self.created_at,
            updated_at: self.updated_at,
            stats: WorkflowExecutionStats {
                last_triggered_at: self.last_triggered_at,
                trigger_count,
            },
        })
    }
}

/// Rows that no longer decode are skipped so their siblings still run.
fn decode_rows(rows: Vec<WorkflowRow>) -> Vec<Workflow> {
    rows.into_iter()
        .filter_map(|row| {
            let workflow_id = row.id;
            let tenant_id = row.tenant_id;
            row.into_workflow()
                .map_err(|error| {
                    warn!(
                        workflow_id = %workflow_id,
                        tenant_id,
                        error = %error,
                        "skipping undecodable workflow row"
                    );
                })
                .ok()
        })
        .collect()
}

#[async_trait]
impl WorkflowStore for PostgresWorkflowStore {
    async fn list_active_workflows(
        &self,
        tenant_id: TenantId,
        entity_type: EntityType,
        frequency: TriggerFrequency,
    ) -> AppResult<Vec<Workflow>> {
        let rows = sqlx::query_as::<_, WorkflowRow>(
            r#"
            SELECT
                id,
                tenant_id,
                name,
                description,
                entity_type,
                trigger_frequency,
                condition,
                actions,
                active,
                created_by,
                updated_by,
                created_at,
                updated_at,
                trigger_count,
                last_triggered_at
            FROM workflows
            WHERE tenant_id = $1
              AND entity_type = $2
              AND trigger_frequency = $3
              AND active
            ORDER BY created_at, id
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(entity_type.as_str())
        .bind(frequency.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list active {entity_type} workflows for tenant '{tenant_id}': {error}"
            ))
        })?;

        Ok(decode_rows(rows))
    }

    async fn record_execution(
        &self,
        tenant_id: TenantId,
        workflow_id: WorkflowId,
        triggered_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE workflows
            SET trigger_count = trigger_count + 1,
                last_triggered_at = $3
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(workflow_id.as_uuid())
        .bind(triggered_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to record execution of workflow '{workflow_id}': {error}"
            ))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "workflow '{workflow_id}' does not exist for tenant '{tenant_id}'"
            )));
        }

        Ok(())
    }
}
