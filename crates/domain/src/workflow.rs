use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use ruleflow_core::{AppError, AppResult, NonEmptyString, TenantId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::WorkflowAction;
use crate::condition::WorkflowCondition;
use crate::entity::{EntityType, TriggerFrequency};
use crate::security::{Actor, Permission};

/// Stable workflow identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(Uuid);

impl WorkflowId {
    /// Creates a random workflow identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a workflow identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for WorkflowId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for WorkflowId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Trigger source kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    /// Entity lifecycle event.
    Event,
}

/// Workflow trigger: lifecycle event on the workflow's entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTrigger {
    /// Trigger kind.
    pub trigger_type: TriggerType,
    /// Lifecycle event.
    pub frequency: TriggerFrequency,
}

impl WorkflowTrigger {
    /// Creates an event trigger.
    #[must_use]
    pub fn on(frequency: TriggerFrequency) -> Self {
        Self {
            trigger_type: TriggerType::Event,
            frequency,
        }
    }
}

/// Execution statistics persisted per workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowExecutionStats {
    /// Last time the workflow fired.
    pub last_triggered_at: Option<DateTime<Utc>>,
    /// Number of times the workflow fired.
    pub trigger_count: u64,
}

/// Input used to create or update a workflow definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowInput {
    /// Workflow name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Target entity type.
    pub entity_type: Option<EntityType>,
    /// Trigger configuration.
    pub trigger: Option<WorkflowTrigger>,
    /// Gating condition.
    pub condition: Option<WorkflowCondition>,
    /// Actions performed when the workflow fires.
    pub actions: Vec<WorkflowAction>,
}

/// Stored workflow state, used by store adapters to rebuild a workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSnapshot {
    /// Workflow id.
    pub id: WorkflowId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Workflow name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Target entity type.
    pub entity_type: EntityType,
    /// Trigger.
    pub trigger: WorkflowTrigger,
    /// Condition.
    pub condition: WorkflowCondition,
    /// Actions.
    pub actions: Vec<WorkflowAction>,
    /// Active flag.
    pub active: bool,
    /// Creator.
    pub created_by: UserId,
    /// Last updater.
    pub updated_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Execution statistics.
    pub stats: WorkflowExecutionStats,
}

/// Tenant-scoped workflow definition.
///
/// Every mutation returns a new snapshot; shared instances are never
/// changed in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    id: WorkflowId,
    tenant_id: TenantId,
    name: NonEmptyString,
    description: Option<String>,
    entity_type: EntityType,
    trigger: WorkflowTrigger,
    condition: WorkflowCondition,
    actions: Vec<WorkflowAction>,
    active: bool,
    created_by: UserId,
    updated_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    stats: WorkflowExecutionStats,
}

struct ValidatedInput {
    name: NonEmptyString,
    description: Option<String>,
    entity_type: EntityType,
    trigger: WorkflowTrigger,
    condition: WorkflowCondition,
    actions: Vec<WorkflowAction>,
}

impl Workflow {
    /// Creates a validated, active workflow owned by the actor's tenant.
    pub fn create(input: WorkflowInput, actor: &Actor, now: DateTime<Utc>) -> AppResult<Self> {
        actor.require(Permission::WorkflowCreate)?;
        let validated = validate_input(input)?;
        let user_id = actor.identity().user_id();

        Ok(Self {
            id: WorkflowId::new(),
            tenant_id: actor.identity().tenant_id(),
            name: validated.name,
            description: validated.description,
            entity_type: validated.entity_type,
            trigger: validated.trigger,
            condition: validated.condition,
            actions: validated.actions,
            active: true,
            created_by: user_id,
            updated_by: user_id,
            created_at: now,
            updated_at: now,
            stats: WorkflowExecutionStats::default(),
        })
    }

    /// Rebuilds a stored workflow without privilege checks.
    pub fn restore(snapshot: WorkflowSnapshot) -> AppResult<Self> {
        Ok(Self {
            id: snapshot.id,
            tenant_id: snapshot.tenant_id,
            name: NonEmptyString::new(snapshot.name)?,
            description: snapshot.description,
            entity_type: snapshot.entity_type,
            trigger: snapshot.trigger,
            condition: snapshot.condition,
            actions: snapshot.actions,
            active: snapshot.active,
            created_by: snapshot.created_by,
            updated_by: snapshot.updated_by,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            stats: snapshot.stats,
        })
    }

    /// Returns a new snapshot with replaced definition fields.
    pub fn update(&self, input: WorkflowInput, actor: &Actor, now: DateTime<Utc>) -> AppResult<Self> {
        self.require_update(actor)?;
        let validated = validate_input(input)?;

        Ok(Self {
            name: validated.name,
            description: validated.description,
            entity_type: validated.entity_type,
            trigger: validated.trigger,
            condition: validated.condition,
            actions: validated.actions,
            updated_by: actor.identity().user_id(),
            updated_at: now,
            ..self.clone()
        })
    }

    /// Returns an active snapshot.
    pub fn activate(&self, actor: &Actor, now: DateTime<Utc>) -> AppResult<Self> {
        self.with_active(true, actor, now)
    }

    /// Returns an inactive snapshot.
    pub fn deactivate(&self, actor: &Actor, now: DateTime<Utc>) -> AppResult<Self> {
        self.with_active(false, actor, now)
    }

    /// Returns a snapshot crediting one more execution at `triggered_at`.
    #[must_use]
    pub fn record_execution(&self, triggered_at: DateTime<Utc>) -> Self {
        Self {
            stats: WorkflowExecutionStats {
                last_triggered_at: Some(triggered_at),
                trigger_count: self.stats.trigger_count.saturating_add(1),
            },
            ..self.clone()
        }
    }

    fn with_active(&self, active: bool, actor: &Actor, now: DateTime<Utc>) -> AppResult<Self> {
        self.require_update(actor)?;

        Ok(Self {
            active,
            updated_by: actor.identity().user_id(),
            updated_at: now,
            ..self.clone()
        })
    }

    fn require_update(&self, actor: &Actor) -> AppResult<()> {
        actor.require(Permission::WorkflowUpdate)?;
        if actor.identity().tenant_id() != self.tenant_id {
            return Err(AppError::Forbidden(format!(
                "workflow '{}' belongs to another tenant",
                self.id
            )));
        }

        Ok(())
    }

    /// Returns workflow id.
    #[must_use]
    pub fn id(&self) -> WorkflowId {
        self.id
    }

    /// Returns owning tenant.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns workflow name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns optional workflow description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns target entity type.
    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Returns trigger configuration.
    #[must_use]
    pub fn trigger(&self) -> WorkflowTrigger {
        self.trigger
    }

    /// Returns gating condition.
    #[must_use]
    pub fn condition(&self) -> &WorkflowCondition {
        &self.condition
    }

    /// Returns actions in definition order.
    #[must_use]
    pub fn actions(&self) -> &[WorkflowAction] {
        self.actions.as_slice()
    }

    /// Returns actions ordered by execution phase.
    #[must_use]
    pub fn actions_in_phase_order(&self) -> Vec<&WorkflowAction> {
        let mut ordered: Vec<&WorkflowAction> = self.actions.iter().collect();
        ordered.sort_by_key(|action| action.phase());
        ordered
    }

    /// Returns whether the workflow is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns creator id.
    #[must_use]
    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns last updater id.
    #[must_use]
    pub fn updated_by(&self) -> UserId {
        self.updated_by
    }

    /// Returns creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns last update timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns execution statistics.
    #[must_use]
    pub fn stats(&self) -> WorkflowExecutionStats {
        self.stats
    }
}

fn validate_input(input: WorkflowInput) -> AppResult<ValidatedInput> {
    let WorkflowInput {
        name,
        description,
        entity_type,
        trigger,
        condition,
        actions,
    } = input;

    let entity_type = entity_type.ok_or_else(|| {
        AppError::Validation("workflow entity type must be provided".to_owned())
    })?;
    let trigger = trigger
        .ok_or_else(|| AppError::Validation("workflow trigger must be provided".to_owned()))?;
    let condition = condition
        .ok_or_else(|| AppError::Validation("workflow condition must be provided".to_owned()))?;

    if actions.is_empty() {
        return Err(AppError::Validation(
            "workflow must define at least one action".to_owned(),
        ));
    }

    condition.validate()?;
    for action in &actions {
        action.validate()?;
    }

    let description = description.and_then(|value| {
        let trimmed = value.trim().to_owned();
        (!trimmed.is_empty()).then_some(trimmed)
    });

    Ok(ValidatedInput {
        name: NonEmptyString::new(name)?,
        description,
        entity_type,
        trigger,
        condition,
        actions,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use ruleflow_core::{TenantId, UserId, UserIdentity};

    use super::{Workflow, WorkflowInput, WorkflowTrigger};
    use crate::action::{EditPropertyAction, WorkflowAction};
    use crate::condition::{ConditionExpression, ConditionOperator, WorkflowCondition};
    use crate::entity::{EntityType, TriggerFrequency};
    use crate::security::{Actor, Permission};

    fn maker(permissions: &[Permission]) -> Actor {
        Actor::new(
            UserIdentity::new(UserId::new(10), "Maker", TenantId::new(1)),
            permissions.iter().copied(),
        )
    }

    fn input() -> WorkflowInput {
        WorkflowInput {
            name: "Tag Pune leads".to_owned(),
            description: Some("  ".to_owned()),
            entity_type: Some(EntityType::Lead),
            trigger: Some(WorkflowTrigger::on(TriggerFrequency::Created)),
            condition: Some(WorkflowCondition::unconditional()),
            actions: vec![WorkflowAction::EditProperty(EditPropertyAction {
                name: "city".to_owned(),
                value: "Pune".to_owned(),
            })],
        }
    }

    #[test]
    fn create_requires_privilege() {
        let result = Workflow::create(input(), &maker(&[Permission::WorkflowRead]), Utc::now());
        assert!(result.is_err());
    }

    #[test]
    fn create_requires_trigger_and_actions() {
        let actor = maker(&[Permission::WorkflowCreate]);

        let missing_trigger = WorkflowInput {
            trigger: None,
            ..input()
        };
        assert!(Workflow::create(missing_trigger, &actor, Utc::now()).is_err());

        let no_actions = WorkflowInput {
            actions: Vec::new(),
            ..input()
        };
        assert!(Workflow::create(no_actions, &actor, Utc::now()).is_err());
    }

    #[test]
    fn create_rejects_malformed_condition() {
        let actor = maker(&[Permission::WorkflowCreate]);
        let malformed = WorkflowInput {
            condition: Some(WorkflowCondition::when(ConditionExpression::comparison(
                ConditionOperator::Greater,
                "requirementBudget",
                None,
            ))),
            ..input()
        };

        assert!(Workflow::create(malformed, &actor, Utc::now()).is_err());
    }

    #[test]
    fn create_stamps_creator_and_blank_description() {
        let now = Utc::now();
        let workflow = Workflow::create(input(), &maker(&[Permission::WorkflowCreate]), now)
            .unwrap_or_else(|_| unreachable!());

        assert!(workflow.is_active());
        assert_eq!(workflow.created_by(), UserId::new(10));
        assert_eq!(workflow.tenant_id(), TenantId::new(1));
        assert_eq!(workflow.description(), None);
        assert_eq!(workflow.stats().trigger_count, 0);
    }

    #[test]
    fn deactivate_returns_new_snapshot() {
        let actor = maker(&[Permission::WorkflowCreate, Permission::WorkflowUpdate]);
        let created = Workflow::create(input(), &actor, Utc::now())
            .unwrap_or_else(|_| unreachable!());
        let later = created.updated_at() + Duration::minutes(5);

        let deactivated = created
            .deactivate(&actor, later)
            .unwrap_or_else(|_| unreachable!());

        assert!(created.is_active());
        assert!(!deactivated.is_active());
        assert_eq!(deactivated.updated_at(), later);
        assert_eq!(deactivated.id(), created.id());
    }

    #[test]
    fn update_from_other_tenant_is_forbidden() {
        let actor = maker(&[Permission::WorkflowCreate, Permission::WorkflowUpdate]);
        let created = Workflow::create(input(), &actor, Utc::now())
            .unwrap_or_else(|_| unreachable!());
        let stranger = Actor::new(
            UserIdentity::new(UserId::new(11), "Stranger", TenantId::new(2)),
            [Permission::WorkflowUpdate],
        );

        assert!(created.update(input(), &stranger, Utc::now()).is_err());
    }

    #[test]
    fn record_execution_increments_counter() {
        let workflow = Workflow::create(input(), &maker(&[Permission::WorkflowCreate]), Utc::now())
            .unwrap_or_else(|_| unreachable!());
        let triggered_at = Utc::now();

        let executed = workflow.record_execution(triggered_at).record_execution(triggered_at);

        assert_eq!(executed.stats().trigger_count, 2);
        assert_eq!(executed.stats().last_triggered_at, Some(triggered_at));
        assert_eq!(workflow.stats().trigger_count, 0);
    }
}
