use ruleflow_core::{AppError, AppResult, ExecutionStage};
use ruleflow_domain::EntityType;
use serde_json::{Map, Value};

use crate::record_path;

const LEAD_FIELDS: &[&str] = &[
    "salutation",
    "firstName",
    "lastName",
    "emails",
    "phoneNumbers",
    "address",
    "city",
    "state",
    "zipcode",
    "country",
    "timezone",
    "designation",
    "department",
    "companyName",
    "companyPhones",
    "companyWebsite",
    "companyIndustry",
    "companyEmployees",
    "companyAnnualRevenue",
    "requirementName",
    "requirementBudget",
    "requirementCurrency",
    "products",
    "pipeline",
    "pipelineStage",
    "ownerId",
    "dnd",
    "source",
    "campaign",
    "utm",
    "customFieldValues",
];

const DEAL_FIELDS: &[&str] = &[
    "name",
    "estimatedValue",
    "actualValue",
    "estimatedClosureOn",
    "actualClosureDate",
    "products",
    "associatedContacts",
    "company",
    "pipeline",
    "pipelineStage",
    "ownedBy",
    "forecastingType",
    "source",
    "campaign",
    "customFieldValues",
];

const CONTACT_FIELDS: &[&str] = &[
    "salutation",
    "firstName",
    "lastName",
    "emails",
    "phoneNumbers",
    "address",
    "city",
    "state",
    "zipcode",
    "country",
    "timezone",
    "designation",
    "department",
    "company",
    "stakeholder",
    "ownerId",
    "dnd",
    "source",
    "campaign",
    "utm",
    "customFieldValues",
];

/// Outcome of a property write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyWrite {
    /// Value was stored.
    Applied,
    /// Field is neither declared nor present; nothing was written.
    UnknownField,
}

/// Dotted-path property access over an entity payload.
pub trait PropertyAccessor: Send + Sync {
    /// Reads the value at `path`.
    fn get<'a>(&self, entity: &'a Value, path: &str) -> Option<&'a Value>;

    /// Writes `value` at `path`, creating missing intermediate objects.
    fn set(&self, entity: &mut Value, path: &str, value: Value) -> AppResult<PropertyWrite>;
}

/// Property accessor backed by the declared field table of one entity type.
#[derive(Debug, Clone, Copy)]
pub struct EntityPropertyAccessor {
    entity_type: EntityType,
    declared_fields: &'static [&'static str],
}

impl EntityPropertyAccessor {
    /// Creates the accessor for an entity type.
    #[must_use]
    pub fn for_entity_type(entity_type: EntityType) -> Self {
        let declared_fields = match entity_type {
            EntityType::Lead => LEAD_FIELDS,
            EntityType::Deal => DEAL_FIELDS,
            EntityType::Contact => CONTACT_FIELDS,
        };

        Self {
            entity_type,
            declared_fields,
        }
    }

    /// Returns the entity type this accessor serves.
    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    fn is_known(&self, entity: &Value, field: &str) -> bool {
        self.declared_fields.contains(&field) || entity.get(field).is_some()
    }
}

impl PropertyAccessor for EntityPropertyAccessor {
    fn get<'a>(&self, entity: &'a Value, path: &str) -> Option<&'a Value> {
        record_path::value_at(entity, path)
    }

    fn set(&self, entity: &mut Value, path: &str, value: Value) -> AppResult<PropertyWrite> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Ok(PropertyWrite::UnknownField);
        }

        let Some((field, parents)) = segments.split_last() else {
            return Ok(PropertyWrite::UnknownField);
        };
        let root = parents.first().unwrap_or(field);
        if !self.is_known(entity, root) {
            return Ok(PropertyWrite::UnknownField);
        }

        let mut current = entity;
        for segment in parents {
            let map = object_mut(current, path)?;
            current = map
                .entry((*segment).to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            if current.is_null() {
                *current = Value::Object(Map::new());
            }
        }

        let map = object_mut(current, path)?;
        let existing = map.get(*field).unwrap_or(&Value::Null);
        let coerced = coerce(existing, value, path)?;
        map.insert((*field).to_owned(), coerced);

        Ok(PropertyWrite::Applied)
    }
}

fn object_mut<'a>(value: &'a mut Value, path: &str) -> AppResult<&'a mut Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(mismatch(
            path,
            format!("cannot descend into {}", kind_of(other)),
        )),
    }
}

fn coerce(existing: &Value, value: Value, path: &str) -> AppResult<Value> {
    match (existing, value) {
        (_, Value::Null) => Ok(Value::Null),
        (Value::Null, value) => Ok(value),
        (Value::String(_), Value::Number(number)) => Ok(Value::String(number.to_string())),
        (Value::String(_), Value::Bool(flag)) => Ok(Value::String(flag.to_string())),
        (Value::String(_), value @ Value::String(_))
        | (Value::Number(_), value @ Value::Number(_))
        | (Value::Bool(_), value @ Value::Bool(_))
        | (Value::Array(_), value @ Value::Array(_))
        | (Value::Object(_), value @ Value::Object(_)) => Ok(value),
        (existing, value) => Err(mismatch(
            path,
            format!(
                "field holds {} but the new value is {}",
                kind_of(existing),
                kind_of(&value)
            ),
        )),
    }
}

fn mismatch(path: &str, detail: String) -> AppError {
    AppError::WorkflowExecution {
        stage: ExecutionStage::UpdateProperty,
        message: format!("type mismatch on '{path}': {detail}"),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use ruleflow_core::{AppError, ExecutionStage};
    use ruleflow_domain::EntityType;
    use serde_json::json;

    use super::{EntityPropertyAccessor, PropertyAccessor, PropertyWrite};

    fn lead_accessor() -> EntityPropertyAccessor {
        EntityPropertyAccessor::for_entity_type(EntityType::Lead)
    }

    #[test]
    fn declared_field_is_written_even_when_absent() {
        let mut lead = json!({"firstName": "Ada"});
        let write = lead_accessor().set(&mut lead, "city", json!("Pune"));

        assert_eq!(write.ok(), Some(PropertyWrite::Applied));
        assert_eq!(lead_accessor().get(&lead, "city"), Some(&json!("Pune")));
    }

    #[test]
    fn undeclared_absent_field_is_reported_unknown() {
        let mut lead = json!({"firstName": "Ada"});
        let write = lead_accessor().set(&mut lead, "favouriteColour", json!("teal"));

        assert_eq!(write.ok(), Some(PropertyWrite::UnknownField));
        assert!(lead.get("favouriteColour").is_none());
    }

    #[test]
    fn custom_field_path_creates_intermediate_object() {
        let mut contact = json!({"customFieldValues": null});
        let accessor = EntityPropertyAccessor::for_entity_type(EntityType::Contact);
        let write = accessor.set(&mut contact, "customFieldValues.region", json!("APAC"));

        assert_eq!(write.ok(), Some(PropertyWrite::Applied));
        assert_eq!(contact, json!({"customFieldValues": {"region": "APAC"}}));
    }

    #[test]
    fn number_written_into_text_field_is_stored_as_text() {
        let mut lead = json!({"zipcode": "411001"});
        let write = lead_accessor().set(&mut lead, "zipcode", json!(411045));

        assert_eq!(write.ok(), Some(PropertyWrite::Applied));
        assert_eq!(lead["zipcode"], json!("411045"));
    }

    #[test]
    fn text_into_numeric_field_is_a_mismatch() {
        let mut lead = json!({"requirementBudget": 500});
        let result = lead_accessor().set(&mut lead, "requirementBudget", json!("lots"));

        assert!(matches!(
            result,
            Err(AppError::WorkflowExecution {
                stage: ExecutionStage::UpdateProperty,
                ..
            })
        ));
        assert_eq!(lead["requirementBudget"], json!(500));
    }

    #[test]
    fn scalar_into_list_field_is_a_mismatch() {
        let mut lead = json!({"emails": []});
        let result = lead_accessor().set(&mut lead, "emails", json!("a@x.io"));

        assert!(result.is_err());
    }

    #[test]
    fn descending_into_scalar_is_a_mismatch() {
        let mut lead = json!({"city": "Pune"});
        let result = lead_accessor().set(&mut lead, "city.code", json!("PNQ"));

        assert!(result.is_err());
    }
}
