//! Webhook parameter resolution.
//!
//! Parameters are scanned once to find which cross-entity aliases they
//! reference. Each referenced alias is fetched once, all fetches run
//! concurrently, and rendering starts after they have all completed.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use ruleflow_core::{AppError, AppResult, ExecutionStage, TenantId, UserId};
use ruleflow_domain::{EntityType, WebhookAction, WebhookEntity, WebhookParameter};
use serde_json::Value;
use tracing::warn;

use crate::attribute_resolver::EntityAttributeResolver;
use crate::record_path;
use crate::workflow_ports::{Currency, DirectoryService, TenantProfile, UserProfile};

mod contact;
mod deal;
mod lead;
mod render;


/// How a record attribute is read and rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RecordAttribute {
    /// Scalar at a path; lists render one value per element.
    Text(String),
    /// List of email objects.
    Emails(&'static str),
    /// List of phone objects rendered with their dial code.
    Phones(&'static str),
    /// List of named objects rendered by name.
    Names(&'static str),
    /// Money object `{value, currencyId}` rendered with the currency code.
    Money(&'static str),
}

/// Record attributes that webhooks may reference for one entity type.
pub(crate) trait RecordCatalog: Send + Sync {
    /// Returns the attribute for a declared name.
    fn declared(&self, name: &str) -> Option<RecordAttribute>;

    /// Returns the attribute for a name, accepting custom field paths.
    fn attribute(&self, name: &str) -> Option<RecordAttribute> {
        if name
            .strip_prefix("customFieldValues.")
            .is_some_and(|field| !field.is_empty())
        {
            return Some(RecordAttribute::Text(name.to_owned()));
        }

        self.declared(name)
    }
}

fn catalog_for(entity_type: EntityType) -> &'static dyn RecordCatalog {
    match entity_type {
        EntityType::Lead => &lead::LeadCatalog,
        EntityType::Deal => &deal::DealCatalog,
        EntityType::Contact => &contact::ContactCatalog,
    }
}

/// Attribute of a directory user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UserAttribute {
    Id,
    FirstName,
    LastName,
    FullName,
    Email,
    PhoneNumbers,
    Designation,
    Department,
    Timezone,
}

impl UserAttribute {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "id" => Self::Id,
            "firstName" => Self::FirstName,
            "lastName" => Self::LastName,
            "name" | "fullName" => Self::FullName,
            "email" => Self::Email,
            "phoneNumbers" => Self::PhoneNumbers,
            "designation" => Self::Designation,
            "department" => Self::Department,
            "timezone" => Self::Timezone,
            _ => return None,
        })
    }
}

/// Attribute of the tenant account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TenantAttribute {
    Id,
    AccountName,
    CompanyName,
    Website,
    Industry,
    Timezone,
}

impl TenantAttribute {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "id" => Self::Id,
            "accountName" => Self::AccountName,
            "companyName" => Self::CompanyName,
            "website" => Self::Website,
            "industry" => Self::Industry,
            "timezone" => Self::Timezone,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParameterSource {
    Record(RecordAttribute),
    Owner(UserAttribute),
    CreatedBy(UserAttribute),
    UpdatedBy(UserAttribute),
    Tenant(TenantAttribute),
}

#[derive(Debug)]
struct PlannedParameter<'a> {
    name: &'a str,
    source: ParameterSource,
}

/// Aliases referenced by at least one parameter.
#[derive(Debug, Default)]
struct ReferencedAliases {
    owner: bool,
    created_by: bool,
    updated_by: bool,
    tenant: bool,
    currencies: BTreeSet<i64>,
}

impl ReferencedAliases {
    fn scan(plan: &[PlannedParameter<'_>], entity: &Value) -> Self {
        let mut aliases = Self::default();
        for parameter in plan {
            match &parameter.source {
                ParameterSource::Owner(_) => aliases.owner = true,
                ParameterSource::CreatedBy(_) => aliases.created_by = true,
                ParameterSource::UpdatedBy(_) => aliases.updated_by = true,
                ParameterSource::Tenant(_) => aliases.tenant = true,
                ParameterSource::Record(RecordAttribute::Money(path)) => {
                    if let Some(currency_id) =
                        record_path::id_at(entity, &format!("{path}.currencyId"))
                    {
                        aliases.currencies.insert(currency_id);
                    }
                }
                ParameterSource::Record(_) => {}
            }
        }

        aliases
    }
}

/// Directory entities fetched for one webhook call.
#[derive(Debug, Default)]
struct ResolvedAliases {
    owner: UserProfile,
    created_by: UserProfile,
    updated_by: UserProfile,
    tenant: TenantProfile,
    currencies: HashMap<i64, Currency>,
}

/// Resolves webhook parameters for any supported entity type.
#[derive(Clone)]
pub struct WebhookParameterBuilder {
    directory: Arc<dyn DirectoryService>,
    resolver: EntityAttributeResolver,
}

impl WebhookParameterBuilder {
    /// Creates a parameter builder.
    #[must_use]
    pub fn new(directory: Arc<dyn DirectoryService>, resolver: EntityAttributeResolver) -> Self {
        Self {
            directory,
            resolver,
        }
    }

    /// Resolves and renders every parameter of a webhook action.
    ///
    /// Parameters whose rendered value list is empty are left out. An
    /// attribute the entity type does not expose aborts the whole call.
    pub async fn build(
        &self,
        action: &WebhookAction,
        entity_type: EntityType,
        entity: &Value,
        tenant_id: TenantId,
        token: &str,
    ) -> AppResult<BTreeMap<String, Vec<String>>> {
        let catalog = catalog_for(entity_type);
        let plan = action
            .parameters
            .iter()
            .map(|parameter| plan_parameter(catalog, entity_type, parameter))
            .collect::<AppResult<Vec<_>>>()?;

        let aliases = ReferencedAliases::scan(&plan, entity);
        let resolved = self
            .resolve_aliases(&aliases, entity_type, entity, tenant_id, token)
            .await;

        let mut parameters: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for parameter in plan {
            let values = render::values(&parameter.source, entity, &resolved);
            if values.is_empty() {
                continue;
            }

            parameters
                .entry(parameter.name.to_owned())
                .or_default()
                .extend(values);
        }

        Ok(parameters)
    }

    async fn resolve_aliases(
        &self,
        aliases: &ReferencedAliases,
        entity_type: EntityType,
        entity: &Value,
        tenant_id: TenantId,
        token: &str,
    ) -> ResolvedAliases {
        let user_id = |requested: bool, logical_name: &str| {
            requested.then(|| self.resolver.id(entity_type, entity, logical_name))
        };

        let (owner, created_by, updated_by, tenant, currencies) = tokio::join!(
            self.fetch_user(user_id(aliases.owner, "owner"), "owner", token),
            self.fetch_user(user_id(aliases.created_by, "createdBy"), "createdBy", token),
            self.fetch_user(user_id(aliases.updated_by, "updatedBy"), "updatedBy", token),
            self.fetch_tenant(aliases.tenant, tenant_id, token),
            self.fetch_currencies(&aliases.currencies, token),
        );

        ResolvedAliases {
            owner,
            created_by,
            updated_by,
            tenant,
            currencies,
        }
    }

    async fn fetch_user(
        &self,
        requested: Option<Option<i64>>,
        alias: &str,
        token: &str,
    ) -> UserProfile {
        let Some(user_id) = requested else {
            return UserProfile::default();
        };
        let Some(user_id) = user_id else {
            warn!(alias, "record has no user id for webhook alias");
            return UserProfile::default();
        };

        match self.directory.user(token, UserId::new(user_id)).await {
            Ok(profile) => profile,
            Err(error) => {
                warn!(alias, user_id, error = %error, "user lookup failed, using empty profile");
                UserProfile::default()
            }
        }
    }

    async fn fetch_tenant(&self, requested: bool, tenant_id: TenantId, token: &str) -> TenantProfile {
        if !requested {
            return TenantProfile::default();
        }

        match self.directory.tenant(token, tenant_id).await {
            Ok(profile) => profile,
            Err(error) => {
                warn!(tenant_id = %tenant_id, error = %error, "tenant lookup failed, using empty profile");
                TenantProfile::default()
            }
        }
    }

    async fn fetch_currencies(
        &self,
        currency_ids: &BTreeSet<i64>,
        token: &str,
    ) -> HashMap<i64, Currency> {
        let mut currencies = HashMap::new();
        for currency_id in currency_ids {
            match self.directory.currency(token, *currency_id).await {
                Ok(currency) => {
                    currencies.insert(*currency_id, currency);
                }
                Err(error) => {
                    warn!(currency_id, error = %error, "currency lookup failed, rendering amount only");
                }
            }
        }

        currencies
    }
}

fn plan_parameter<'a>(
    catalog: &dyn RecordCatalog,
    entity_type: EntityType,
    parameter: &'a WebhookParameter,
) -> AppResult<PlannedParameter<'a>> {
    let attribute = parameter.attribute.trim();
    let source = match parameter.entity {
        WebhookEntity::Record => catalog.attribute(attribute).map(ParameterSource::Record),
        WebhookEntity::RecordOwner => UserAttribute::parse(attribute).map(ParameterSource::Owner),
        WebhookEntity::CreatedBy => UserAttribute::parse(attribute).map(ParameterSource::CreatedBy),
        WebhookEntity::UpdatedBy => UserAttribute::parse(attribute).map(ParameterSource::UpdatedBy),
        WebhookEntity::Tenant => TenantAttribute::parse(attribute).map(ParameterSource::Tenant),
    }
    .ok_or_else(|| AppError::WorkflowExecution {
        stage: ExecutionStage::Webhook,
        message: format!(
            "parameter '{}' references unknown attribute '{attribute}' on {:?} of a {entity_type}",
            parameter.name, parameter.entity
        ),
    })?;

    Ok(PlannedParameter {
        name: parameter.name.as_str(),
        source,
    })
}
