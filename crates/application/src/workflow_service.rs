use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use ruleflow_core::{AppError, AppResult, ExecutionStage, UserId};
use ruleflow_domain::{
    AuthorizationType, CreateTaskAction, EditPropertyAction, EmailParticipant, EntityChangeEvent,
    EntityId, EntityType, EventMetadata, ReassignAction, SendEmailAction, TaskAssignee,
    TriggerFrequency, WebhookAction, Workflow, WorkflowAction,
};
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::attribute_resolver::EntityAttributeResolver;
use crate::condition_evaluator::ConditionEvaluator;
use crate::property_accessor::{EntityPropertyAccessor, PropertyAccessor, PropertyWrite};
use crate::value_converter::ValueTypeConverter;
use crate::webhook_parameters::WebhookParameterBuilder;
use crate::workflow_ports::{
    AuthTokenProvider, CommandPublisher, DirectoryService, EmailRecipient, EntityUpdatedCommand,
    OutboundMessage, ReassignCommand, SendEmailEvent, TaskCreationEvent, TaskRelation,
    WebhookAuthorization, WebhookClient, WebhookRequest, WebhookSecretDecryptor, WorkflowStore,
};

mod dispatch;
mod execution;

/// External collaborators required by the workflow runtime.
#[derive(Clone)]
pub struct WorkflowServicePorts {
    /// Workflow definition store.
    pub store: Arc<dyn WorkflowStore>,
    /// Outbound command publisher.
    pub publisher: Arc<dyn CommandPublisher>,
    /// User, tenant and currency directory.
    pub directory: Arc<dyn DirectoryService>,
    /// Fire-and-forget webhook client.
    pub webhook_client: Arc<dyn WebhookClient>,
    /// Decryptor for webhook authorization parameters.
    pub secret_decryptor: Arc<dyn WebhookSecretDecryptor>,
    /// Bearer token source for directory calls.
    pub token_provider: Arc<dyn AuthTokenProvider>,
}

/// Counters describing how one inbound event was handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Active workflows returned for the event's tenant, entity type and frequency.
    pub matched: usize,
    /// Workflows skipped because the causal chain already ran them.
    pub skipped_already_executed: usize,
    /// Workflows whose condition was false or failed to evaluate.
    pub skipped_condition: usize,
    /// Workflows dispatched to completion.
    pub dispatched: usize,
    /// Workflows whose entity-updated publication failed or whose task aborted.
    pub failed: usize,
    /// Dispatched workflows whose execution stats could not be recorded.
    pub unrecorded_executions: usize,
    /// Individual actions that failed across dispatched workflows.
    pub failed_actions: usize,
}

#[derive(Debug, Default)]
struct WorkflowOutcome {
    applied_edits: usize,
    failed_actions: usize,
    execution_recorded: bool,
}

/// Workflow match and dispatch runtime.
#[derive(Clone)]
pub struct WorkflowService {
    store: Arc<dyn WorkflowStore>,
    publisher: Arc<dyn CommandPublisher>,
    directory: Arc<dyn DirectoryService>,
    webhook_client: Arc<dyn WebhookClient>,
    secret_decryptor: Arc<dyn WebhookSecretDecryptor>,
    token_provider: Arc<dyn AuthTokenProvider>,
    resolver: EntityAttributeResolver,
    evaluator: ConditionEvaluator,
    converter: ValueTypeConverter,
    parameter_builder: WebhookParameterBuilder,
}

impl WorkflowService {
    /// Creates a workflow service with the default attribute aliases.
    #[must_use]
    pub fn new(ports: WorkflowServicePorts) -> Self {
        let resolver = EntityAttributeResolver::default();
        Self {
            evaluator: ConditionEvaluator::new(resolver.clone()),
            parameter_builder: WebhookParameterBuilder::new(
                ports.directory.clone(),
                resolver.clone(),
            ),
            converter: ValueTypeConverter::default(),
            resolver,
            store: ports.store,
            publisher: ports.publisher,
            directory: ports.directory,
            webhook_client: ports.webhook_client,
            secret_decryptor: ports.secret_decryptor,
            token_provider: ports.token_provider,
        }
    }

    /// Replaces the attribute resolver used by conditions and actions.
    #[must_use]
    pub fn with_attribute_resolver(mut self, resolver: EntityAttributeResolver) -> Self {
        self.evaluator = ConditionEvaluator::new(resolver.clone());
        self.parameter_builder = WebhookParameterBuilder::new(self.directory.clone(), resolver.clone());
        self.resolver = resolver;
        self
    }
}

#[cfg(test)]
mod tests;
