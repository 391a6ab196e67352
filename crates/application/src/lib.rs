//! Application services and ports.

#![forbid(unsafe_code)]

mod attribute_resolver;
mod condition_evaluator;
mod property_accessor;
mod record_path;
mod value_converter;
mod webhook_parameters;
mod workflow_ports;
mod workflow_service;

pub use attribute_resolver::EntityAttributeResolver;
pub use condition_evaluator::ConditionEvaluator;
pub use property_accessor::{EntityPropertyAccessor, PropertyAccessor, PropertyWrite};
pub use value_converter::{FieldShape, ValueTypeConverter, convert};
pub use webhook_parameters::WebhookParameterBuilder;
pub use workflow_ports::{
    AuthTokenProvider, CommandPublisher, Currency, DirectoryService, EmailRecipient,
    EntityUpdatedCommand, OutboundMessage, PhoneNumber, ReassignCommand, SendEmailEvent,
    TaskCreationEvent, TaskRelation, TenantProfile, UserProfile, WebhookAuthorization,
    WebhookClient, WebhookRequest, WebhookSecretDecryptor, WorkflowStore,
};
pub use workflow_service::{DispatchSummary, WorkflowService, WorkflowServicePorts};
