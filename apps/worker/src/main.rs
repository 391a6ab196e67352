//! Ruleflow workflow worker runtime.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use ruleflow_application::{WorkflowService, WorkflowServicePorts};
use ruleflow_core::{AppError, AppResult};
use ruleflow_infrastructure::{
    AesSecretEncryptor, HttpDirectoryService, HttpWebhookClient, PostgresWorkflowStore,
    RedisCommandPublisher, RedisEntityEventConsumer, StaticAuthTokenProvider,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::Semaphore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const BROKER_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
struct WorkerConfig {
    database_url: String,
    redis_url: String,
    queue_prefix: String,
    iam_base_url: String,
    config_base_url: String,
    service_token: String,
    webhook_secret_key: String,
    max_in_flight: usize,
    poll_timeout_seconds: u64,
    http_timeout_seconds: u64,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let pool = connect_pool(config.database_url.as_str()).await?;
    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    let redis_client = redis::Client::open(config.redis_url.as_str())
        .map_err(|error| AppError::Validation(format!("invalid REDIS_URL: {error}")))?;
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_seconds))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    let workflow_service = build_workflow_service(&config, pool, redis_client.clone(), http_client)?;
    let consumer = RedisEntityEventConsumer::new(
        redis_client,
        config.queue_prefix.as_str(),
        config.poll_timeout_seconds,
    );
    let in_flight = Arc::new(Semaphore::new(config.max_in_flight));

    info!(
        queue = %consumer.queue_key(),
        max_in_flight = config.max_in_flight,
        poll_timeout_seconds = config.poll_timeout_seconds,
        "ruleflow-worker started"
    );

    loop {
        let event = match consumer.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(AppError::Validation(message)) => {
                warn!(queue = %consumer.queue_key(), error = %message, "discarded malformed event");
                continue;
            }
            Err(error) => {
                warn!(queue = %consumer.queue_key(), error = %error, "failed to read next event");
                tokio::time::sleep(BROKER_RETRY_DELAY).await;
                continue;
            }
        };

        let Ok(permit) = Arc::clone(&in_flight).acquire_owned().await else {
            break;
        };
        let service = workflow_service.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let tenant_id = event.metadata.tenant_id();
            let entity_type = event.metadata.entity_type();
            let entity_id = event.entity_id();

            match service.process_event(event).await {
                Ok(summary) => info!(
                    tenant_id = %tenant_id,
                    entity_type = %entity_type,
                    entity_id = ?entity_id,
                    matched = summary.matched,
                    skipped_already_executed = summary.skipped_already_executed,
                    skipped_condition = summary.skipped_condition,
                    dispatched = summary.dispatched,
                    failed = summary.failed,
                    failed_actions = summary.failed_actions,
                    unrecorded_executions = summary.unrecorded_executions,
                    "entity event processed"
                ),
                Err(error) => warn!(
                    tenant_id = %tenant_id,
                    entity_type = %entity_type,
                    entity_id = ?entity_id,
                    error = %error,
                    "entity event processing failed"
                ),
            }
        });
    }

    Ok(())
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

fn build_workflow_service(
    config: &WorkerConfig,
    pool: PgPool,
    redis_client: redis::Client,
    http_client: reqwest::Client,
) -> AppResult<WorkflowService> {
    let secret_decryptor = AesSecretEncryptor::from_hex(config.webhook_secret_key.as_str())?;

    Ok(WorkflowService::new(WorkflowServicePorts {
        store: Arc::new(PostgresWorkflowStore::new(pool)),
        publisher: Arc::new(RedisCommandPublisher::new(
            redis_client,
            config.queue_prefix.as_str(),
        )),
        directory: Arc::new(HttpDirectoryService::new(
            http_client.clone(),
            config.iam_base_url.as_str(),
            config.config_base_url.as_str(),
        )),
        webhook_client: Arc::new(HttpWebhookClient::new(http_client)),
        secret_decryptor: Arc::new(secret_decryptor),
        token_provider: Arc::new(StaticAuthTokenProvider::new(config.service_token.as_str())),
    }))
}

impl WorkerConfig {
    fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = required_env(&lookup, "DATABASE_URL")?;
        let redis_url = required_env(&lookup, "REDIS_URL")?;
        let queue_prefix = lookup("RULEFLOW_QUEUE_PREFIX")
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "ruleflow".to_owned());
        let iam_base_url = required_base_url(&lookup, "RULEFLOW_IAM_BASE_URL")?;
        let config_base_url = required_base_url(&lookup, "RULEFLOW_CONFIG_BASE_URL")?;
        let service_token = required_env(&lookup, "RULEFLOW_SERVICE_TOKEN")?;
        let webhook_secret_key = required_env(&lookup, "RULEFLOW_WEBHOOK_SECRET_KEY")?;
        let max_in_flight = parse_env_usize(&lookup, "WORKER_MAX_IN_FLIGHT", 16)?;
        let poll_timeout_seconds = parse_env_u64(&lookup, "WORKER_POLL_TIMEOUT_SECONDS", 5)?;
        let http_timeout_seconds = parse_env_u64(&lookup, "HTTP_TIMEOUT_SECONDS", 15)?;

        if max_in_flight == 0 {
            return Err(AppError::Validation(
                "WORKER_MAX_IN_FLIGHT must be greater than zero".to_owned(),
            ));
        }

        if poll_timeout_seconds == 0 {
            return Err(AppError::Validation(
                "WORKER_POLL_TIMEOUT_SECONDS must be greater than zero".to_owned(),
            ));
        }

        if http_timeout_seconds == 0 {
            return Err(AppError::Validation(
                "HTTP_TIMEOUT_SECONDS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            redis_url,
            queue_prefix,
            iam_base_url,
            config_base_url,
            service_token,
            webhook_secret_key,
            max_in_flight,
            poll_timeout_seconds,
            http_timeout_seconds,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env<F>(lookup: &F, name: &str) -> AppResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn required_base_url<F>(lookup: &F, name: &str) -> AppResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    let value = required_env(lookup, name)?;
    let parsed = url::Url::parse(value.trim()).map_err(|error| {
        AppError::Validation(format!("invalid {name} value '{value}': {error}"))
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::Validation(format!(
            "{name} must use http or https, got '{}'",
            parsed.scheme()
        )));
    }

    Ok(value.trim().trim_end_matches('/').to_owned())
}

fn parse_env_usize<F>(lookup: &F, name: &str, default: usize) -> AppResult<usize>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value.trim().parse::<usize>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}

fn parse_env_u64<F>(lookup: &F, name: &str, default: u64) -> AppResult<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value.trim().parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use ruleflow_core::{AppError, AppResult};

    use super::WorkerConfig;

    fn base_env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/ruleflow".to_owned()),
            ("REDIS_URL", "redis://127.0.0.1/".to_owned()),
            ("RULEFLOW_IAM_BASE_URL", "https://iam.internal/".to_owned()),
            ("RULEFLOW_CONFIG_BASE_URL", "https://config.internal".to_owned()),
            ("RULEFLOW_SERVICE_TOKEN", "svc-token".to_owned()),
            ("RULEFLOW_WEBHOOK_SECRET_KEY", "00".repeat(32)),
        ])
    }

    fn load(env: &HashMap<&'static str, String>) -> AppResult<WorkerConfig> {
        WorkerConfig::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_optional_values_are_absent() -> AppResult<()> {
        let config = load(&base_env())?;

        assert_eq!(config.queue_prefix, "ruleflow");
        assert_eq!(config.iam_base_url, "https://iam.internal");
        assert_eq!(config.max_in_flight, 16);
        assert_eq!(config.poll_timeout_seconds, 5);
        assert_eq!(config.http_timeout_seconds, 15);
        Ok(())
    }

    #[test]
    fn missing_required_value_is_rejected() {
        let mut env = base_env();
        env.remove("RULEFLOW_SERVICE_TOKEN");

        assert!(matches!(load(&env), Err(AppError::Validation(_))));
    }

    #[test]
    fn zero_or_malformed_numbers_are_rejected() {
        let mut env = base_env();
        env.insert("WORKER_MAX_IN_FLIGHT", "0".to_owned());
        assert!(matches!(load(&env), Err(AppError::Validation(_))));

        let mut env = base_env();
        env.insert("HTTP_TIMEOUT_SECONDS", "soon".to_owned());
        assert!(matches!(load(&env), Err(AppError::Validation(_))));
    }

    #[test]
    fn base_url_must_be_http() {
        let mut env = base_env();
        env.insert("RULEFLOW_CONFIG_BASE_URL", "ftp://config.internal".to_owned());

        assert!(matches!(load(&env), Err(AppError::Validation(_))));
    }

    #[test]
    fn queue_prefix_override_is_trimmed() -> AppResult<()> {
        let mut env = base_env();
        env.insert("RULEFLOW_QUEUE_PREFIX", " crm ".to_owned());

        assert_eq!(load(&env)?.queue_prefix, "crm");
        Ok(())
    }
}
