use super::*;

mod create_task;
mod edit_property;
mod reassign;
mod send_email;
mod webhook;

impl WorkflowService {
    /// Runs one workflow's actions phase by phase, then records the
    /// execution and publishes the edited entity.
    pub(super) async fn dispatch_workflow(
        &self,
        workflow: &Workflow,
        entity: Value,
        metadata: EventMetadata,
    ) -> AppResult<WorkflowOutcome> {
        let entity_type = workflow.entity_type();
        let mut entity = entity;
        let mut outcome = WorkflowOutcome::default();
        let mut edits_aborted = false;

        for action in workflow.actions_in_phase_order() {
            let result = match action {
                WorkflowAction::EditProperty(_) if edits_aborted => continue,
                WorkflowAction::EditProperty(edit) => {
                    match self.execute_edit_property(entity_type, &mut entity, edit) {
                        Ok(PropertyWrite::Applied) => {
                            outcome.applied_edits += 1;
                            Ok(())
                        }
                        Ok(PropertyWrite::UnknownField) => Ok(()),
                        Err(error) => {
                            edits_aborted = true;
                            Err(error)
                        }
                    }
                }
                WorkflowAction::Reassign(reassign) => {
                    self.execute_reassign(entity_type, &metadata, reassign).await
                }
                WorkflowAction::CreateTask(task) => {
                    self.execute_create_task(entity_type, &entity, &metadata, task)
                        .await
                }
                WorkflowAction::Webhook(webhook) => {
                    self.execute_webhook(workflow, &entity, &metadata, webhook)
                        .await
                }
                WorkflowAction::SendEmail(email) => {
                    self.execute_send_email(entity_type, &entity, &metadata, email)
                        .await
                }
            };

            if let Err(error) = result {
                warn!(
                    workflow_id = %workflow.id(),
                    action = action.action_type(),
                    error = %error,
                    "workflow action failed"
                );
                outcome.failed_actions += 1;
            }
        }

        match self
            .store
            .record_execution(workflow.tenant_id(), workflow.id(), Utc::now())
            .await
        {
            Ok(()) => outcome.execution_recorded = true,
            Err(error) => warn!(
                workflow_id = %workflow.id(),
                error = %error,
                "failed to record workflow execution"
            ),
        }

        if outcome.applied_edits > 0 {
            self.publisher
                .publish(OutboundMessage::EntityUpdated(EntityUpdatedCommand {
                    entity_type,
                    entity_id: metadata.entity_id(),
                    entity,
                    metadata,
                }))
                .await?;
        }

        Ok(outcome)
    }
}

fn execution_error(stage: ExecutionStage, message: impl Into<String>) -> AppError {
    AppError::WorkflowExecution {
        stage,
        message: message.into(),
    }
}

fn require_entity_id(metadata: &EventMetadata, stage: ExecutionStage) -> AppResult<EntityId> {
    metadata
        .entity_id()
        .ok_or_else(|| execution_error(stage, "triggering record has no id"))
}
