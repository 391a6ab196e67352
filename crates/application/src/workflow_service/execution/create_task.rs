use super::*;

impl WorkflowService {
    pub(super) async fn execute_create_task(
        &self,
        entity_type: EntityType,
        entity: &Value,
        metadata: &EventMetadata,
        action: &CreateTaskAction,
    ) -> AppResult<()> {
        let entity_id = require_entity_id(metadata, ExecutionStage::CreateTask)?;
        let assigned_to = match action.assigned_to {
            TaskAssignee::User { id } => id,
            TaskAssignee::RecordOwner => self
                .resolver
                .id(entity_type, entity, "owner")
                .map(UserId::new)
                .ok_or_else(|| {
                    execution_error(ExecutionStage::CreateTask, "record owner cannot be resolved")
                })?,
        };

        let offset = Duration::try_days(i64::from(action.due_offset.days)).and_then(|days| {
            Duration::try_hours(i64::from(action.due_offset.hours))
                .and_then(|hours| days.checked_add(&hours))
        });
        let due_date = offset
            .and_then(|offset| Utc::now().checked_add_signed(offset))
            .ok_or_else(|| {
                execution_error(
                    ExecutionStage::CreateTask,
                    format!(
                        "due offset of {} days and {} hours is out of range",
                        action.due_offset.days, action.due_offset.hours
                    ),
                )
            })?;

        self.publisher
            .publish(OutboundMessage::CreateTask(TaskCreationEvent {
                name: action.name.clone(),
                description: action.description.clone(),
                priority: action.priority,
                outcome: action.outcome,
                task_type: action.task_type,
                status: action.status,
                assigned_to,
                due_date,
                related_to: TaskRelation {
                    entity_type,
                    entity_id,
                },
                metadata: metadata.clone(),
            }))
            .await
    }
}
