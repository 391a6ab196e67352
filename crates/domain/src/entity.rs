use std::fmt::{Display, Formatter};
use std::str::FromStr;

use ruleflow_core::AppError;
use serde::{Deserialize, Serialize};

/// CRM record types that can trigger workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    /// Sales lead.
    Lead,
    /// Sales deal.
    Deal,
    /// Contact person.
    Contact,
}

impl EntityType {
    /// Returns stable wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lead => "LEAD",
            Self::Deal => "DEAL",
            Self::Contact => "CONTACT",
        }
    }
}

impl Display for EntityType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "LEAD" => Ok(Self::Lead),
            "DEAL" => Ok(Self::Deal),
            "CONTACT" => Ok(Self::Contact),
            _ => Err(AppError::Validation(format!(
                "unknown entity type '{value}'"
            ))),
        }
    }
}

/// Identifier of a CRM record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(i64);

impl EntityId {
    /// Creates an entity identifier from the upstream numeric id.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for EntityId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Lifecycle action carried by an inbound entity event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityAction {
    /// Record was created.
    Created,
    /// Record was updated.
    Updated,
}

impl EntityAction {
    /// Returns stable wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Updated => "UPDATED",
        }
    }
}

/// Lifecycle event a workflow listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerFrequency {
    /// Fires when a record is created.
    Created,
    /// Fires when a record is updated.
    Updated,
}

impl TriggerFrequency {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Updated => "UPDATED",
        }
    }
}

impl FromStr for TriggerFrequency {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "CREATED" => Ok(Self::Created),
            "UPDATED" => Ok(Self::Updated),
            _ => Err(AppError::Validation(format!(
                "unknown trigger frequency '{value}'"
            ))),
        }
    }
}

impl From<EntityAction> for TriggerFrequency {
    fn from(action: EntityAction) -> Self {
        match action {
            EntityAction::Created => Self::Created,
            EntityAction::Updated => Self::Updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EntityAction, EntityType, TriggerFrequency};

    #[test]
    fn entity_type_round_trips_wire_value() {
        for entity_type in [EntityType::Lead, EntityType::Deal, EntityType::Contact] {
            let parsed = entity_type.as_str().parse::<EntityType>();
            assert_eq!(parsed.ok(), Some(entity_type));
        }
    }

    #[test]
    fn updated_action_maps_to_updated_frequency() {
        assert_eq!(
            TriggerFrequency::from(EntityAction::Updated),
            TriggerFrequency::Updated
        );
    }
}
