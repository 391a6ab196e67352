use std::collections::HashMap;

use ruleflow_core::{AppError, AppResult};
use ruleflow_domain::EntityType;
use serde_json::{Number, Value};
use tracing::warn;

/// Declared shape of an editable entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// JSON array.
    Array,
    /// JSON object.
    Object,
    /// Number, boolean or string.
    Plain,
}

const STRUCTURED_FIELDS: &[&str] = &["customFieldValues", "source", "campaign", "utm"];

const LEAD_SHAPES: &[(&str, FieldShape)] = &[
    ("emails", FieldShape::Array),
    ("phoneNumbers", FieldShape::Array),
    ("companyPhones", FieldShape::Array),
    ("products", FieldShape::Array),
    ("pipeline", FieldShape::Object),
    ("pipelineStage", FieldShape::Object),
];

const DEAL_SHAPES: &[(&str, FieldShape)] = &[
    ("products", FieldShape::Array),
    ("associatedContacts", FieldShape::Array),
    ("estimatedValue", FieldShape::Object),
    ("actualValue", FieldShape::Object),
    ("pipeline", FieldShape::Object),
    ("pipelineStage", FieldShape::Object),
    ("company", FieldShape::Object),
    ("ownedBy", FieldShape::Object),
];

const CONTACT_SHAPES: &[(&str, FieldShape)] = &[
    ("emails", FieldShape::Array),
    ("phoneNumbers", FieldShape::Array),
    ("company", FieldShape::Object),
];

/// Converts textual edit values into the shape the target field expects.
#[derive(Debug, Clone)]
pub struct ValueTypeConverter {
    shapes: HashMap<(EntityType, &'static str), FieldShape>,
}

impl Default for ValueTypeConverter {
    fn default() -> Self {
        let mut shapes = HashMap::new();
        for (entity_type, table) in [
            (EntityType::Lead, LEAD_SHAPES),
            (EntityType::Deal, DEAL_SHAPES),
            (EntityType::Contact, CONTACT_SHAPES),
        ] {
            for (field, shape) in table {
                shapes.insert((entity_type, *field), *shape);
            }
        }

        Self { shapes }
    }
}

impl ValueTypeConverter {
    /// Returns the declared shape of a field.
    #[must_use]
    pub fn shape_of(&self, entity_type: EntityType, field: &str) -> FieldShape {
        if let Some(shape) = self.shapes.get(&(entity_type, field)) {
            return *shape;
        }

        if STRUCTURED_FIELDS.contains(&field) {
            return FieldShape::Object;
        }

        FieldShape::Plain
    }

    /// Converts a field's raw value according to its declared shape.
    pub fn convert_for(
        &self,
        entity_type: EntityType,
        field: &str,
        raw: &str,
    ) -> AppResult<Value> {
        convert(field, raw, self.shape_of(entity_type, field))
    }
}

/// Converts a raw value into the given shape.
///
/// Known divergence: a malformed list falls back to an empty list while a
/// malformed object is rejected. Both behaviours are kept until upstream
/// confirms which one is intended.
pub fn convert(field: &str, raw: &str, shape: FieldShape) -> AppResult<Value> {
    match shape {
        FieldShape::Array => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(items)) => Ok(Value::Array(items)),
            Ok(_) | Err(_) => {
                warn!(field, "list value did not parse as an array, using empty list");
                Ok(Value::Array(Vec::new()))
            }
        },
        FieldShape::Object => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Ok(Value::Object(map)),
            Ok(other) => Err(AppError::InvalidValueType {
                field: field.to_owned(),
                message: format!("expected an object but got '{other}'"),
            }),
            Err(error) => Err(AppError::InvalidValueType {
                field: field.to_owned(),
                message: format!("value is not valid JSON: {error}"),
            }),
        },
        FieldShape::Plain => Ok(convert_plain(raw)),
    }
}

fn convert_plain(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }

    if let Ok(integer) = trimmed.parse::<i64>() {
        return Value::Number(integer.into());
    }

    if let Some(number) = trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
    {
        return Value::Number(number);
    }

    match trimmed {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_owned()),
    }
}
