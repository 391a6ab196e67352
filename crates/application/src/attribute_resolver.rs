use std::collections::HashMap;

use ruleflow_domain::EntityType;
use serde_json::Value;

use crate::record_path;

/// Maps logical field names to payload paths per entity type.
///
/// Names without a registered alias resolve to themselves, so dotted paths
/// such as `customFieldValues.region` pass through untouched.
#[derive(Debug, Clone)]
pub struct EntityAttributeResolver {
    aliases: HashMap<(EntityType, String), String>,
}

impl Default for EntityAttributeResolver {
    fn default() -> Self {
        Self::empty()
            .with_alias(EntityType::Lead, "pipeline", "pipeline.id")
            .with_alias(EntityType::Lead, "pipelineStage", "pipelineStage.id")
            .with_alias(EntityType::Lead, "owner", "ownerId")
            .with_alias(EntityType::Deal, "pipeline", "pipeline.id")
            .with_alias(EntityType::Deal, "pipelineStage", "pipelineStage.id")
            .with_alias(EntityType::Deal, "owner", "ownedBy.id")
            .with_alias(EntityType::Deal, "company", "company.id")
            .with_alias(EntityType::Deal, "createdBy", "createdBy.id")
            .with_alias(EntityType::Deal, "updatedBy", "updatedBy.id")
            .with_alias(EntityType::Contact, "company", "company.id")
            .with_alias(EntityType::Contact, "owner", "ownerId")
    }
}

impl EntityAttributeResolver {
    /// Creates a resolver without any aliases.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            aliases: HashMap::new(),
        }
    }

    /// Registers one alias, replacing any previous mapping for the name.
    #[must_use]
    pub fn with_alias(
        mut self,
        entity_type: EntityType,
        logical_name: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        self.aliases
            .insert((entity_type, logical_name.into()), path.into());
        self
    }

    /// Resolves a logical name to the payload path for the entity type.
    #[must_use]
    pub fn resolve<'a>(&'a self, entity_type: EntityType, logical_name: &'a str) -> &'a str {
        self.aliases
            .get(&(entity_type, logical_name.to_owned()))
            .map_or(logical_name, String::as_str)
    }

    /// Reads the value behind a logical name.
    #[must_use]
    pub fn lookup<'v>(
        &self,
        entity_type: EntityType,
        entity: &'v Value,
        logical_name: &str,
    ) -> Option<&'v Value> {
        record_path::value_at(entity, self.resolve(entity_type, logical_name))
    }

    /// Reads an identifier behind a logical name, e.g. `owner`.
    #[must_use]
    pub fn id(&self, entity_type: EntityType, entity: &Value, logical_name: &str) -> Option<i64> {
        record_path::id_at(entity, self.resolve(entity_type, logical_name))
    }
}
