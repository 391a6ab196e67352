use super::*;

impl WorkflowService {
    /// Matches an inbound change event against the tenant's active workflows
    /// and dispatches every workflow that survives filtering.
    ///
    /// Workflows already credited in the event's executed set are skipped,
    /// as are workflows whose condition is false or cannot be evaluated.
    /// Survivors run concurrently; a failing workflow never stops its
    /// siblings.
    pub async fn process_event(&self, event: EntityChangeEvent) -> AppResult<DispatchSummary> {
        let metadata = match event.entity_id() {
            Some(entity_id) => event.metadata.with_entity_id(entity_id),
            None => event.metadata.clone(),
        };
        let entity_type = metadata.entity_type();
        let frequency = TriggerFrequency::from(metadata.entity_action());

        let workflows = self
            .store
            .list_active_workflows(metadata.tenant_id(), entity_type, frequency)
            .await?;
        let mut summary = DispatchSummary {
            matched: workflows.len(),
            ..DispatchSummary::default()
        };

        let mut eligible = Vec::new();
        for workflow in workflows {
            if metadata.has_executed(workflow.id()) {
                debug!(workflow_id = %workflow.id(), "workflow already executed in this chain");
                summary.skipped_already_executed += 1;
                continue;
            }

            match self
                .evaluator
                .evaluate(workflow.condition(), entity_type, &event.entity)
            {
                Ok(true) => eligible.push(workflow),
                Ok(false) => summary.skipped_condition += 1,
                Err(error) => {
                    warn!(
                        workflow_id = %workflow.id(),
                        error = %error,
                        "condition evaluation failed, skipping workflow"
                    );
                    summary.skipped_condition += 1;
                }
            }
        }

        let mut tasks = JoinSet::new();
        for workflow in eligible {
            let service = self.clone();
            let entity = event.entity.clone();
            let metadata = metadata.for_workflow(workflow.id());
            tasks.spawn(async move {
                let result = service.dispatch_workflow(&workflow, entity, metadata).await;
                (workflow.id(), result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((workflow_id, Ok(outcome))) => {
                    info!(
                        workflow_id = %workflow_id,
                        applied_edits = outcome.applied_edits,
                        failed_actions = outcome.failed_actions,
                        execution_recorded = outcome.execution_recorded,
                        "workflow dispatched"
                    );
                    summary.dispatched += 1;
                    summary.failed_actions += outcome.failed_actions;
                    if !outcome.execution_recorded {
                        summary.unrecorded_executions += 1;
                    }
                }
                Ok((workflow_id, Err(error))) => {
                    warn!(workflow_id = %workflow_id, error = %error, "workflow dispatch failed");
                    summary.failed += 1;
                }
                Err(error) => {
                    warn!(error = %error, "workflow dispatch task did not complete");
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}
