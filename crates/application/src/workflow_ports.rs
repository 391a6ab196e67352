mod auth;
mod directory;
mod messages;
mod publisher;
mod store;
mod webhook;

pub use auth::AuthTokenProvider;
pub use directory::{Currency, DirectoryService, PhoneNumber, TenantProfile, UserProfile};
pub use messages::{
    EmailRecipient, EntityUpdatedCommand, OutboundMessage, ReassignCommand, SendEmailEvent,
    TaskCreationEvent, TaskRelation,
};
pub use publisher::CommandPublisher;
pub use store::WorkflowStore;
pub use webhook::{WebhookAuthorization, WebhookClient, WebhookRequest, WebhookSecretDecryptor};
