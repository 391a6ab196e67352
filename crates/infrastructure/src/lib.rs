//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod aes_secret_encryptor;
mod http_directory_service;
mod http_webhook_client;
mod postgres_workflow_store;
mod redis_command_publisher;
mod redis_entity_event_consumer;
mod static_auth_token_provider;

pub use aes_secret_encryptor::AesSecretEncryptor;
pub use http_directory_service::HttpDirectoryService;
pub use http_webhook_client::HttpWebhookClient;
pub use postgres_workflow_store::PostgresWorkflowStore;
pub use redis_command_publisher::RedisCommandPublisher;
pub use redis_entity_event_consumer::RedisEntityEventConsumer;
pub use static_auth_token_provider::StaticAuthTokenProvider;
