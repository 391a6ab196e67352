use std::sync::{Arc, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use ruleflow_core::{AppError, AppResult, TenantId, UserId, UserIdentity};
use ruleflow_domain::{
    Actor, AuthorizationType, ConditionExpression, ConditionOperator, CreateTaskAction, DueOffset,
    EditPropertyAction, EmailParticipant, EntityAction, EntityChangeEvent, EntityId, EntityType,
    EventMetadata, HttpMethod, Permission, ReassignAction, SendEmailAction, TaskAssignee,
    TriggerFrequency, WebhookAction, WebhookEntity, WebhookParameter, Workflow, WorkflowAction,
    WorkflowCondition, WorkflowExecutionStats, WorkflowId, WorkflowInput, WorkflowSnapshot,
    WorkflowTrigger,
};

use crate::workflow_ports::{
    AuthTokenProvider, CommandPublisher, Currency, DirectoryService, OutboundMessage,
    TenantProfile, UserProfile, WebhookAuthorization, WebhookClient, WebhookRequest,
    WebhookSecretDecryptor, WorkflowStore,
};

use super::{DispatchSummary, WorkflowService, WorkflowServicePorts};

const TENANT: i64 = 5;

#[derive(Default)]
struct FakeWorkflowStore {
    workflows: Mutex<Vec<Workflow>>,
    executions: Mutex<Vec<(WorkflowId, DateTime<Utc>)>>,
    failing_records: Vec<WorkflowId>,
}

#[async_trait]
impl WorkflowStore for FakeWorkflowStore {
    async fn list_active_workflows(
        &self,
        tenant_id: TenantId,
        entity_type: EntityType,
        frequency: TriggerFrequency,
    ) -> AppResult<Vec<Workflow>> {
        Ok(self
            .workflows
            .lock()
            .await
            .iter()
            .filter(|workflow| {
                workflow.tenant_id() == tenant_id
                    && workflow.entity_type() == entity_type
                    && workflow.trigger().frequency == frequency
                    && workflow.is_active()
            })
            .cloned()
            .collect())
    }

    async fn record_execution(
        &self,
        _tenant_id: TenantId,
        workflow_id: WorkflowId,
        triggered_at: DateTime<Utc>,
    ) -> AppResult<()> {
        if self.failing_records.contains(&workflow_id) {
            return Err(AppError::Internal("store unavailable".to_owned()));
        }

        self.executions
            .lock()
            .await
            .push((workflow_id, triggered_at));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingPublisher {
    messages: Mutex<Vec<OutboundMessage>>,
}

#[async_trait]
impl CommandPublisher for RecordingPublisher {
    async fn publish(&self, message: OutboundMessage) -> AppResult<()> {
        self.messages.lock().await.push(message);
        Ok(())
    }
}

#[derive(Default)]
struct FakeDirectory {
    user_calls: Mutex<Vec<UserId>>,
}

#[async_trait]
impl DirectoryService for FakeDirectory {
    async fn user(&self, _token: &str, user_id: UserId) -> AppResult<UserProfile> {
        self.user_calls.lock().await.push(user_id);
        Ok(UserProfile {
            id: user_id.as_i64(),
            first_name: "Owner".to_owned(),
            last_name: user_id.to_string(),
            email: format!("owner{user_id}@example.com"),
            ..UserProfile::default()
        })
    }

    async fn tenant(&self, _token: &str, tenant_id: TenantId) -> AppResult<TenantProfile> {
        Ok(TenantProfile {
            id: tenant_id.as_i64(),
            ..TenantProfile::default()
        })
    }

    async fn currency(&self, _token: &str, currency_id: i64) -> AppResult<Currency> {
        Ok(Currency {
            id: currency_id,
            name: "USD".to_owned(),
        })
    }
}

#[derive(Default)]
struct RecordingWebhookClient {
    requests: std::sync::Mutex<Vec<WebhookRequest>>,
}

impl RecordingWebhookClient {
    fn requests(&self) -> Vec<WebhookRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl WebhookClient for RecordingWebhookClient {
    fn fire(&self, request: WebhookRequest) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
    }
}

struct PrefixDecryptor;

impl WebhookSecretDecryptor for PrefixDecryptor {
    fn decrypt_parameter(&self, encoded: &str) -> AppResult<String> {
        encoded
            .strip_prefix("enc:")
            .map(ToOwned::to_owned)
            .ok_or_else(|| AppError::Internal("authentication tag mismatch".to_owned()))
    }
}

struct StaticTokens;

#[async_trait]
impl AuthTokenProvider for StaticTokens {
    async fn bearer_token(&self, _metadata: &EventMetadata) -> AppResult<String> {
        Ok("service-token".to_owned())
    }
}

struct Harness {
    service: WorkflowService,
    store: Arc<FakeWorkflowStore>,
    publisher: Arc<RecordingPublisher>,
    directory: Arc<FakeDirectory>,
    webhooks: Arc<RecordingWebhookClient>,
}

impl Harness {
    fn new(workflows: Vec<Workflow>) -> Self {
        Self::with_store(FakeWorkflowStore {
            workflows: Mutex::new(workflows),
            ..FakeWorkflowStore::default()
        })
    }

    fn with_store(store: FakeWorkflowStore) -> Self {
        let store = Arc::new(store);
        let publisher = Arc::new(RecordingPublisher::default());
        let directory = Arc::new(FakeDirectory::default());
        let webhooks = Arc::new(RecordingWebhookClient::default());
        let service = WorkflowService::new(WorkflowServicePorts {
            store: store.clone(),
            publisher: publisher.clone(),
            directory: directory.clone(),
            webhook_client: webhooks.clone(),
            secret_decryptor: Arc::new(PrefixDecryptor),
            token_provider: Arc::new(StaticTokens),
        });

        Self {
            service,
            store,
            publisher,
            directory,
            webhooks,
        }
    }

    async fn messages(&self) -> Vec<OutboundMessage> {
        self.publisher.messages.lock().await.clone()
    }
}

fn actor() -> Actor {
    Actor::new(
        UserIdentity::new(UserId::new(1), "Admin", TenantId::new(TENANT)),
        [Permission::WorkflowCreate, Permission::WorkflowUpdate],
    )
}

fn workflow(condition: WorkflowCondition, actions: Vec<WorkflowAction>) -> Workflow {
    Workflow::create(
        WorkflowInput {
            name: "Lead automation".to_owned(),
            description: None,
            entity_type: Some(EntityType::Lead),
            trigger: Some(WorkflowTrigger::on(TriggerFrequency::Created)),
            condition: Some(condition),
            actions,
        },
        &actor(),
        Utc::now(),
    )
    .unwrap_or_else(|_| unreachable!())
}

fn edit(name: &str, value: &str) -> WorkflowAction {
    WorkflowAction::EditProperty(EditPropertyAction {
        name: name.to_owned(),
        value: value.to_owned(),
    })
}

fn reassign(owner_id: i64) -> WorkflowAction {
    WorkflowAction::Reassign(ReassignAction {
        owner_id: UserId::new(owner_id),
        name: "New Owner".to_owned(),
    })
}

fn metadata() -> EventMetadata {
    EventMetadata::new(
        TenantId::new(TENANT),
        UserId::new(2),
        EntityType::Lead,
        EntityAction::Created,
    )
}

fn lead() -> Value {
    json!({
        "id": 7,
        "firstName": "Ada",
        "lastName": "Lovelace",
        "city": "Mumbai",
        "ownerId": 9,
        "requirementBudget": 500,
        "emails": [
            {"type": "OFFICE", "value": "ada@work.io", "primary": true},
            {"type": "PERSONAL", "value": "ada@home.io", "primary": false}
        ],
        "products": [{"id": 1, "name": "CRM"}]
    })
}

fn created(entity: Value) -> EntityChangeEvent {
    EntityChangeEvent {
        metadata: metadata(),
        entity,
        old_entity: None,
    }
}

#[tokio::test]
async fn workflow_in_executed_set_is_not_dispatched() {
    let workflow = workflow(WorkflowCondition::unconditional(), vec![reassign(3)]);
    let event = EntityChangeEvent {
        metadata: metadata().with_executed_workflow(workflow.id()),
        entity: lead(),
        old_entity: None,
    };
    let harness = Harness::new(vec![workflow]);

    let summary = harness.service.process_event(event).await;

    assert_eq!(
        summary.ok(),
        Some(DispatchSummary {
            matched: 1,
            skipped_already_executed: 1,
            ..DispatchSummary::default()
        })
    );
    assert!(harness.messages().await.is_empty());
    assert!(harness.store.executions.lock().await.is_empty());
}

#[tokio::test]
async fn republished_entity_does_not_replay_the_workflow() {
    let workflow = workflow(WorkflowCondition::unconditional(), vec![edit("city", "Pune")]);
    let harness = Harness::new(vec![workflow]);

    let first = harness.service.process_event(created(lead())).await;
    assert_eq!(first.map(|summary| summary.dispatched).ok(), Some(1));

    let Some(OutboundMessage::EntityUpdated(command)) = harness.messages().await.pop() else {
        unreachable!()
    };
    let replay = EntityChangeEvent {
        metadata: command.metadata,
        entity: command.entity,
        old_entity: None,
    };

    let second = harness.service.process_event(replay).await;
    assert_eq!(second.map(|summary| summary.skipped_already_executed).ok(), Some(1));
    assert_eq!(harness.messages().await.len(), 1);
}

#[tokio::test]
async fn false_and_failing_conditions_are_skipped() {
    let budget = workflow(
        WorkflowCondition::when(ConditionExpression::comparison(
            ConditionOperator::Greater,
            "requirementBudget",
            Some("1000"),
        )),
        vec![reassign(3)],
    );
    let non_numeric = workflow(
        WorkflowCondition::when(ConditionExpression::comparison(
            ConditionOperator::Greater,
            "city",
            Some("1000"),
        )),
        vec![reassign(4)],
    );
    let harness = Harness::new(vec![budget, non_numeric]);

    let summary = harness.service.process_event(created(lead())).await;

    assert_eq!(
        summary.ok(),
        Some(DispatchSummary {
            matched: 2,
            skipped_condition: 2,
            ..DispatchSummary::default()
        })
    );
    assert!(harness.messages().await.is_empty());
}

#[tokio::test]
async fn edits_are_published_with_the_workflow_credited() {
    let workflow = workflow(
        WorkflowCondition::unconditional(),
        vec![edit("city", "Pune"), edit("products", "[]")],
    );
    let workflow_id = workflow.id();
    let harness = Harness::new(vec![workflow]);

    let summary = harness.service.process_event(created(lead())).await;
    assert_eq!(summary.map(|summary| summary.dispatched).ok(), Some(1));

    let messages = harness.messages().await;
    assert_eq!(messages.len(), 1);
    let Some(OutboundMessage::EntityUpdated(command)) = messages.first() else {
        unreachable!()
    };
    assert_eq!(command.entity["city"], json!("Pune"));
    assert_eq!(command.entity["products"], json!([]));
    assert_eq!(command.entity_id, Some(EntityId::new(7)));
    assert!(command.metadata.has_executed(workflow_id));
    assert_eq!(command.metadata.workflow_id(), Some(workflow_id));
    assert_eq!(messages[0].routing_key(), "workflow.entity.updated");

    let executions = harness.store.executions.lock().await;
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].0, workflow_id);
}

#[tokio::test]
async fn type_mismatch_stops_remaining_edits_but_not_reassign() {
    let workflow = workflow(
        WorkflowCondition::unconditional(),
        vec![
            reassign(3),
            edit("requirementBudget", "lots"),
            edit("city", "Pune"),
        ],
    );
    let harness = Harness::new(vec![workflow]);

    let summary = harness
        .service
        .process_event(created(lead()))
        .await
        .unwrap_or_default();

    assert_eq!(summary.dispatched, 1);
    assert_eq!(summary.failed_actions, 1);
    let messages = harness.messages().await;
    assert_eq!(messages.len(), 1);
    assert!(matches!(
        &messages[0],
        OutboundMessage::Reassign(command)
            if command.owner_id == UserId::new(3) && command.entity_id == EntityId::new(7)
    ));
}

#[tokio::test]
async fn unknown_edit_field_is_skipped() {
    let workflow = workflow(
        WorkflowCondition::unconditional(),
        vec![edit("favouriteColour", "teal"), edit("city", "Pune")],
    );
    let harness = Harness::new(vec![workflow]);

    let summary = harness
        .service
        .process_event(created(lead()))
        .await
        .unwrap_or_default();

    assert_eq!(summary.failed_actions, 0);
    let Some(OutboundMessage::EntityUpdated(command)) = harness.messages().await.pop() else {
        unreachable!()
    };
    assert_eq!(command.entity["city"], json!("Pune"));
    assert!(command.entity.get("favouriteColour").is_none());
}

#[tokio::test]
async fn failing_workflow_does_not_stop_siblings() {
    let failing = workflow(WorkflowCondition::unconditional(), vec![reassign(3)]);
    let healthy = workflow(WorkflowCondition::unconditional(), vec![reassign(4)]);
    let healthy_id = healthy.id();
    let harness = Harness::with_store(FakeWorkflowStore {
        failing_records: vec![failing.id()],
        workflows: Mutex::new(vec![failing, healthy]),
        ..FakeWorkflowStore::default()
    });

    let summary = harness
        .service
        .process_event(created(lead()))
        .await
        .unwrap_or_default();

    assert_eq!(summary.matched, 2);
    assert_eq!(summary.dispatched, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.unrecorded_executions, 1);
    assert_eq!(harness.messages().await.len(), 2);
    let executions = harness.store.executions.lock().await;
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].0, healthy_id);
}

#[tokio::test]
async fn stats_failure_still_publishes_applied_edits() {
    let workflow = workflow(WorkflowCondition::unconditional(), vec![edit("city", "Pune")]);
    let workflow_id = workflow.id();
    let harness = Harness::with_store(FakeWorkflowStore {
        failing_records: vec![workflow_id],
        workflows: Mutex::new(vec![workflow]),
        ..FakeWorkflowStore::default()
    });

    let summary = harness
        .service
        .process_event(created(lead()))
        .await
        .unwrap_or_default();

    assert_eq!(summary.dispatched, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.unrecorded_executions, 1);
    let messages = harness.messages().await;
    assert_eq!(messages.len(), 1);
    let Some(OutboundMessage::EntityUpdated(command)) = messages.first() else {
        unreachable!()
    };
    assert_eq!(command.entity["city"], json!("Pune"));
    assert!(command.metadata.has_executed(workflow_id));
}

#[tokio::test]
async fn out_of_range_due_offset_fails_only_the_task() {
    let oversized = WorkflowAction::CreateTask(CreateTaskAction {
        name: "Call back".to_owned(),
        description: None,
        priority: None,
        outcome: None,
        task_type: None,
        status: None,
        assigned_to: TaskAssignee::RecordOwner,
        due_offset: DueOffset {
            days: u32::MAX,
            hours: 0,
        },
    });
    // Stored before the save-time bound on due offsets existed.
    let workflow = Workflow::restore(WorkflowSnapshot {
        id: WorkflowId::new(),
        tenant_id: TenantId::new(TENANT),
        name: "Legacy follow-up".to_owned(),
        description: None,
        entity_type: EntityType::Lead,
        trigger: WorkflowTrigger::on(TriggerFrequency::Created),
        condition: WorkflowCondition::unconditional(),
        actions: vec![edit("city", "Pune"), oversized],
        active: true,
        created_by: UserId::new(1),
        updated_by: UserId::new(1),
        created_at: Utc::now(),
        updated_at: Utc::now(),
        stats: WorkflowExecutionStats::default(),
    })
    .unwrap_or_else(|_| unreachable!());
    let harness = Harness::new(vec![workflow]);

    let summary = harness
        .service
        .process_event(created(lead()))
        .await
        .unwrap_or_default();

    assert_eq!(summary.dispatched, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.failed_actions, 1);
    let messages = harness.messages().await;
    assert_eq!(messages.len(), 1);
    assert!(matches!(
        &messages[0],
        OutboundMessage::EntityUpdated(command) if command.entity["city"] == json!("Pune")
    ));
    assert_eq!(harness.store.executions.lock().await.len(), 1);
}

#[tokio::test]
async fn task_for_record_owner_gets_offset_due_date() {
    let workflow = workflow(
        WorkflowCondition::unconditional(),
        vec![WorkflowAction::CreateTask(CreateTaskAction {
            name: "Call back".to_owned(),
            description: Some("Follow up on enquiry".to_owned()),
            priority: Some(2),
            outcome: None,
            task_type: Some(1),
            status: None,
            assigned_to: TaskAssignee::RecordOwner,
            due_offset: DueOffset { days: 2, hours: 3 },
        })],
    );
    let harness = Harness::new(vec![workflow]);
    let started = Utc::now();

    let summary = harness.service.process_event(created(lead())).await;
    assert_eq!(summary.map(|summary| summary.failed_actions).ok(), Some(0));

    let Some(OutboundMessage::CreateTask(task)) = harness.messages().await.pop() else {
        unreachable!()
    };
    assert_eq!(task.assigned_to, UserId::new(9));
    assert_eq!(task.related_to.entity_id, EntityId::new(7));
    assert!(task.due_date >= started + Duration::hours(51));
    assert!(task.due_date <= Utc::now() + Duration::hours(51));
}

fn owner_webhook(authorization_parameter: &str) -> WorkflowAction {
    WorkflowAction::Webhook(WebhookAction {
        name: "crm-sync".to_owned(),
        description: None,
        method: HttpMethod::Post,
        request_url: "https://hooks.example.com/leads".to_owned(),
        authorization_type: AuthorizationType::BearerToken,
        authorization_parameter: Some(authorization_parameter.to_owned()),
        parameters: vec![
            WebhookParameter {
                name: "ownerEmail".to_owned(),
                entity: WebhookEntity::RecordOwner,
                attribute: "email".to_owned(),
            },
            WebhookParameter {
                name: "ownerName".to_owned(),
                entity: WebhookEntity::RecordOwner,
                attribute: "name".to_owned(),
            },
            WebhookParameter {
                name: "city".to_owned(),
                entity: WebhookEntity::Record,
                attribute: "city".to_owned(),
            },
        ],
    })
}

#[tokio::test]
async fn webhook_sees_edits_and_fetches_owner_once() {
    let workflow = workflow(
        WorkflowCondition::unconditional(),
        vec![owner_webhook("enc:s3cret"), edit("city", "Pune")],
    );
    let harness = Harness::new(vec![workflow]);

    let summary = harness.service.process_event(created(lead())).await;
    assert_eq!(summary.map(|summary| summary.failed_actions).ok(), Some(0));

    let requests = harness.webhooks.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(
        request.authorization,
        WebhookAuthorization::Header {
            name: "Authorization".to_owned(),
            value: "Bearer s3cret".to_owned(),
        }
    );
    assert_eq!(request.parameters.get("city"), Some(&vec!["Pune".to_owned()]));
    assert_eq!(
        request.parameters.get("ownerEmail"),
        Some(&vec!["owner9@example.com".to_owned()])
    );
    assert_eq!(*harness.directory.user_calls.lock().await, vec![UserId::new(9)]);
}

#[tokio::test]
async fn undecryptable_webhook_credentials_abort_only_the_webhook() {
    let workflow = workflow(
        WorkflowCondition::unconditional(),
        vec![owner_webhook("tampered"), reassign(3)],
    );
    let harness = Harness::new(vec![workflow]);

    let summary = harness
        .service
        .process_event(created(lead()))
        .await
        .unwrap_or_default();

    assert_eq!(summary.dispatched, 1);
    assert_eq!(summary.failed_actions, 1);
    assert!(harness.webhooks.requests().is_empty());
    assert!(harness.directory.user_calls.lock().await.is_empty());
    assert_eq!(harness.messages().await.len(), 1);
}

#[tokio::test]
async fn email_participants_expand_from_record_and_directory() {
    let workflow = workflow(
        WorkflowCondition::unconditional(),
        vec![WorkflowAction::SendEmail(SendEmailAction {
            email_template_id: 44,
            from: EmailParticipant::Fixed {
                entity: "user".to_owned(),
                id: 1,
                name: "Sales Desk".to_owned(),
                email: "sales@example.com".to_owned(),
            },
            to: vec![EmailParticipant::AllAvailableEmails],
            cc: vec![EmailParticipant::RecordOwner, EmailParticipant::PrimaryEmail],
            bcc: vec![EmailParticipant::RecordUpdatedBy],
        })],
    );
    let harness = Harness::new(vec![workflow]);

    let summary = harness.service.process_event(created(lead())).await;
    assert_eq!(summary.map(|summary| summary.failed_actions).ok(), Some(0));

    let Some(OutboundMessage::SendEmail(email)) = harness.messages().await.pop() else {
        unreachable!()
    };
    let addresses = |recipients: &[crate::workflow_ports::EmailRecipient]| {
        recipients
            .iter()
            .map(|recipient| recipient.email.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(email.template_id, 44);
    assert_eq!(email.from.email, "sales@example.com");
    assert_eq!(addresses(&email.to), vec!["ada@work.io", "ada@home.io"]);
    assert_eq!(
        addresses(&email.cc),
        vec!["owner9@example.com", "ada@work.io"]
    );
    assert!(email.bcc.is_empty());
    assert_eq!(email.to[0].name, "Ada Lovelace");
    assert_eq!(email.to[0].entity, "lead");
}
