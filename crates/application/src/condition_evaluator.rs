use ruleflow_core::{AppError, AppResult};
use ruleflow_domain::{
    ConditionExpression, ConditionOperator, ConditionType, EntityType, WorkflowCondition,
};
use serde_json::Value;

use crate::attribute_resolver::EntityAttributeResolver;
use crate::record_path::text_of;

/// Evaluates workflow conditions against entity payloads.
///
/// Evaluation is pure: it never mutates the payload and gives the same
/// answer for the same inputs.
#[derive(Debug, Clone, Default)]
pub struct ConditionEvaluator {
    resolver: EntityAttributeResolver,
}

impl ConditionEvaluator {
    /// Creates an evaluator using the given attribute resolver.
    #[must_use]
    pub fn new(resolver: EntityAttributeResolver) -> Self {
        Self { resolver }
    }

    /// Evaluates a workflow condition. Unconditional workflows always match.
    pub fn evaluate(
        &self,
        condition: &WorkflowCondition,
        entity_type: EntityType,
        entity: &Value,
    ) -> AppResult<bool> {
        match condition.condition_type() {
            ConditionType::ForAllConditions => Ok(true),
            ConditionType::ConditionBased => {
                let expression = condition.expression().ok_or_else(|| {
                    AppError::Evaluation("condition has no expression".to_owned())
                })?;
                self.evaluate_expression(expression, entity_type, entity)
            }
        }
    }

    /// Evaluates one expression tree, short-circuiting AND/OR on the left
    /// operand.
    pub fn evaluate_expression(
        &self,
        expression: &ConditionExpression,
        entity_type: EntityType,
        entity: &Value,
    ) -> AppResult<bool> {
        match expression {
            ConditionExpression::Logical {
                operator,
                left,
                right,
            } => {
                let (Some(left), Some(right)) = (left, right) else {
                    return Err(AppError::Evaluation(format!(
                        "{operator:?} node is missing an operand"
                    )));
                };

                let left = self.evaluate_expression(left, entity_type, entity)?;
                match operator {
                    ConditionOperator::And if !left => Ok(false),
                    ConditionOperator::Or if left => Ok(true),
                    ConditionOperator::And | ConditionOperator::Or => {
                        self.evaluate_expression(right, entity_type, entity)
                    }
                    other => Err(AppError::Evaluation(format!(
                        "{other:?} cannot join two expressions"
                    ))),
                }
            }
            ConditionExpression::Comparison {
                operator,
                name,
                value,
            } => {
                let name = name
                    .as_deref()
                    .ok_or_else(|| AppError::Evaluation("condition has no field name".to_owned()))?;
                let actual = self
                    .resolver
                    .lookup(entity_type, entity, name)
                    .filter(|resolved| !resolved.is_null());

                compare(*operator, name, actual, value.as_deref())
            }
        }
    }
}

/// Check applied once both sides of a value comparison are present.
#[derive(Debug, Clone, Copy)]
enum ValueCheck {
    Equal,
    NotEqual,
    Contain,
    NotContain,
    Order(fn(f64, f64) -> bool),
}

fn compare(
    operator: ConditionOperator,
    name: &str,
    actual: Option<&Value>,
    expected: Option<&str>,
) -> AppResult<bool> {
    let check = match operator {
        ConditionOperator::IsNull => return Ok(actual.is_none()),
        ConditionOperator::IsNotNull => return Ok(actual.is_some()),
        ConditionOperator::And | ConditionOperator::Or => {
            return Err(AppError::Evaluation(format!(
                "{operator:?} on field '{name}' has no operands"
            )));
        }
        ConditionOperator::Equal => ValueCheck::Equal,
        ConditionOperator::NotEqual => ValueCheck::NotEqual,
        ConditionOperator::Contain => ValueCheck::Contain,
        ConditionOperator::NotContain => ValueCheck::NotContain,
        ConditionOperator::Greater => ValueCheck::Order(|a, b| a > b),
        ConditionOperator::GreaterOrEqual => ValueCheck::Order(|a, b| a >= b),
        ConditionOperator::Less => ValueCheck::Order(|a, b| a < b),
        ConditionOperator::LessOrEqual => ValueCheck::Order(|a, b| a <= b),
    };

    let actual = actual.ok_or_else(|| {
        AppError::Evaluation(format!("field '{name}' does not resolve on the entity"))
    })?;
    let expected = expected.ok_or_else(|| {
        AppError::Evaluation(format!("{operator:?} on field '{name}' has no value"))
    })?;

    match check {
        ValueCheck::Equal => Ok(text_of(actual) == expected),
        ValueCheck::NotEqual => Ok(text_of(actual) != expected),
        ValueCheck::Contain => Ok(contains(actual, expected)),
        ValueCheck::NotContain => Ok(!contains(actual, expected)),
        ValueCheck::Order(holds) => order(name, actual, expected, holds),
    }
}

fn contains(actual: &Value, expected: &str) -> bool {
    match actual {
        Value::Array(items) => items.iter().any(|item| is_member(item, expected)),
        other => text_of(other)
            .to_lowercase()
            .contains(&expected.to_lowercase()),
    }
}

// Object elements such as `{"id": 3, "name": "CRM"}` match on id, name or value.
fn is_member(item: &Value, expected: &str) -> bool {
    match item {
        Value::Object(map) => ["id", "name", "value"]
            .iter()
            .filter_map(|key| map.get(*key))
            .any(|field| text_of(field) == expected),
        other => text_of(other) == expected,
    }
}

fn order(
    name: &str,
    actual: &Value,
    expected: &str,
    holds: impl Fn(f64, f64) -> bool,
) -> AppResult<bool> {
    let actual = parse_number(name, &text_of(actual))?;
    let expected = parse_number(name, expected)?;
    Ok(holds(actual, expected))
}

fn parse_number(name: &str, text: &str) -> AppResult<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| {
            AppError::Evaluation(format!(
                "field '{name}' compares '{text}' which is not numeric"
            ))
        })
}
