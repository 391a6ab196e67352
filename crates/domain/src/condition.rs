use ruleflow_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Operators accepted by condition expression nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionOperator {
    /// Both operands must hold.
    And,
    /// Either operand must hold.
    Or,
    /// String forms are equal.
    Equal,
    /// String forms differ.
    NotEqual,
    /// Numeric greater-than.
    Greater,
    /// Numeric greater-than-or-equal.
    GreaterOrEqual,
    /// Numeric less-than.
    Less,
    /// Numeric less-than-or-equal.
    LessOrEqual,
    /// Actual value contains the expected value.
    Contain,
    /// Actual value does not contain the expected value.
    NotContain,
    /// Field path does not resolve.
    IsNull,
    /// Field path resolves.
    IsNotNull,
}

impl ConditionOperator {
    /// Returns whether the operator joins two child expressions.
    #[must_use]
    pub fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// Returns whether a leaf with this operator needs a literal value.
    #[must_use]
    pub fn requires_value(&self) -> bool {
        !matches!(self, Self::IsNull | Self::IsNotNull | Self::And | Self::Or)
    }
}

/// Boolean/comparison tree gating workflow actions.
///
/// Children and leaf fields are optional so that malformed trees can be
/// represented and rejected by [`ConditionExpression::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ConditionNode", into = "ConditionNode")]
pub enum ConditionExpression {
    /// AND/OR node.
    Logical {
        /// Logical operator, always `And` or `Or`.
        operator: ConditionOperator,
        /// Left operand, evaluated first.
        left: Option<Box<ConditionExpression>>,
        /// Right operand.
        right: Option<Box<ConditionExpression>>,
    },
    /// Leaf comparing one entity field with a literal.
    Comparison {
        /// Comparison operator.
        operator: ConditionOperator,
        /// Logical field name or dotted path.
        name: Option<String>,
        /// Literal comparison value in textual form.
        value: Option<String>,
    },
}

impl ConditionExpression {
    /// Builds an AND node.
    #[must_use]
    pub fn and(left: ConditionExpression, right: ConditionExpression) -> Self {
        Self::Logical {
            operator: ConditionOperator::And,
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    /// Builds an OR node.
    #[must_use]
    pub fn or(left: ConditionExpression, right: ConditionExpression) -> Self {
        Self::Logical {
            operator: ConditionOperator::Or,
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    /// Builds a leaf node.
    #[must_use]
    pub fn comparison(
        operator: ConditionOperator,
        name: impl Into<String>,
        value: Option<&str>,
    ) -> Self {
        Self::Comparison {
            operator,
            name: Some(name.into()),
            value: value.map(ToOwned::to_owned),
        }
    }

    /// Validates the tree structure recursively.
    pub fn validate(&self) -> AppResult<()> {
        match self {
            Self::Logical {
                operator,
                left,
                right,
            } => {
                let (Some(left), Some(right)) = (left, right) else {
                    return Err(AppError::Validation(format!(
                        "{operator:?} condition requires two operands"
                    )));
                };

                left.validate()?;
                right.validate()
            }
            Self::Comparison {
                operator,
                name,
                value,
            } => {
                if name.as_deref().is_none_or(|name| name.trim().is_empty()) {
                    return Err(AppError::Validation(
                        "condition field name must not be empty".to_owned(),
                    ));
                }

                if operator.requires_value()
                    && value.as_deref().is_none_or(|value| value.trim().is_empty())
                {
                    return Err(AppError::Validation(format!(
                        "{operator:?} condition on '{}' requires a value",
                        name.as_deref().unwrap_or_default()
                    )));
                }

                Ok(())
            }
        }
    }
}

/// Flat wire representation shared with the workflow definition store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConditionNode {
    operator: ConditionOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    operand1: Option<Box<ConditionNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    operand2: Option<Box<ConditionNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
}

impl From<ConditionNode> for ConditionExpression {
    fn from(node: ConditionNode) -> Self {
        if node.operator.is_logical() {
            return Self::Logical {
                operator: node.operator,
                left: node.operand1.map(|child| Box::new(Self::from(*child))),
                right: node.operand2.map(|child| Box::new(Self::from(*child))),
            };
        }

        let value = node.value.and_then(|value| match value {
            Value::Null => None,
            Value::String(text) => Some(text),
            other => Some(other.to_string()),
        });

        Self::Comparison {
            operator: node.operator,
            name: node.name,
            value,
        }
    }
}

impl From<ConditionExpression> for ConditionNode {
    fn from(expression: ConditionExpression) -> Self {
        match expression {
            ConditionExpression::Logical {
                operator,
                left,
                right,
            } => Self {
                operator,
                operand1: left.map(|child| Box::new(Self::from(*child))),
                operand2: right.map(|child| Box::new(Self::from(*child))),
                name: None,
                value: None,
            },
            ConditionExpression::Comparison {
                operator,
                name,
                value,
            } => Self {
                operator,
                operand1: None,
                operand2: None,
                name,
                value: value.map(Value::String),
            },
        }
    }
}

/// Kind of workflow condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionType {
    /// Unconditional: always satisfied.
    ForAllConditions,
    /// Gated by an expression tree.
    ConditionBased,
}

/// Workflow condition: either unconditional or an expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowCondition {
    condition_type: ConditionType,
    #[serde(default)]
    expression: Option<ConditionExpression>,
}

impl WorkflowCondition {
    /// Creates an unconditional condition.
    #[must_use]
    pub fn unconditional() -> Self {
        Self {
            condition_type: ConditionType::ForAllConditions,
            expression: None,
        }
    }

    /// Creates an expression-gated condition.
    #[must_use]
    pub fn when(expression: ConditionExpression) -> Self {
        Self {
            condition_type: ConditionType::ConditionBased,
            expression: Some(expression),
        }
    }

    /// Returns condition kind.
    #[must_use]
    pub fn condition_type(&self) -> ConditionType {
        self.condition_type
    }

    /// Returns the expression tree when the condition is expression-gated.
    #[must_use]
    pub fn expression(&self) -> Option<&ConditionExpression> {
        match self.condition_type {
            ConditionType::ForAllConditions => None,
            ConditionType::ConditionBased => self.expression.as_ref(),
        }
    }

    /// Validates the condition at workflow save time.
    pub fn validate(&self) -> AppResult<()> {
        match self.condition_type {
            ConditionType::ForAllConditions => Ok(()),
            ConditionType::ConditionBased => self
                .expression
                .as_ref()
                .ok_or_else(|| {
                    AppError::Validation(
                        "condition based workflow requires an expression".to_owned(),
                    )
                })?
                .validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ConditionExpression, ConditionOperator, ConditionType, WorkflowCondition};

    #[test]
    fn logical_node_with_missing_operand_is_rejected() {
        let expression = ConditionExpression::Logical {
            operator: ConditionOperator::And,
            left: Some(Box::new(ConditionExpression::comparison(
                ConditionOperator::Equal,
                "city",
                Some("Pune"),
            ))),
            right: None,
        };

        assert!(expression.validate().is_err());
    }

    #[test]
    fn blank_value_is_rejected_unless_null_check() {
        let equal = ConditionExpression::comparison(ConditionOperator::Equal, "city", Some("  "));
        let is_null = ConditionExpression::comparison(ConditionOperator::IsNull, "city", None);

        assert!(equal.validate().is_err());
        assert!(is_null.validate().is_ok());
    }

    #[test]
    fn blank_field_name_is_rejected() {
        let expression =
            ConditionExpression::comparison(ConditionOperator::IsNotNull, "   ", None);

        assert!(expression.validate().is_err());
    }

    #[test]
    fn flat_wire_node_parses_into_tree() {
        let parsed = serde_json::from_value::<ConditionExpression>(json!({
            "operator": "OR",
            "operand1": {"operator": "GREATER", "name": "requirementBudget", "value": 1000},
            "operand2": {"operator": "IS_NULL", "name": "city"}
        }));

        let expected = ConditionExpression::or(
            ConditionExpression::comparison(
                ConditionOperator::Greater,
                "requirementBudget",
                Some("1000"),
            ),
            ConditionExpression::comparison(ConditionOperator::IsNull, "city", None),
        );
        assert_eq!(parsed.ok(), Some(expected));
    }

    #[test]
    fn wire_node_with_null_operand_fails_validation() {
        let parsed = serde_json::from_value::<ConditionExpression>(json!({
            "operator": "AND",
            "operand1": {"operator": "EQUAL", "name": "city", "value": "Pune"},
            "operand2": null
        }))
        .unwrap_or_else(|_| unreachable!());

        assert!(parsed.validate().is_err());
    }

    #[test]
    fn condition_based_requires_expression() {
        let condition = serde_json::from_value::<WorkflowCondition>(json!({
            "conditionType": "CONDITION_BASED"
        }))
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(condition.condition_type(), ConditionType::ConditionBased);
        assert!(condition.validate().is_err());
        assert!(WorkflowCondition::unconditional().validate().is_ok());
    }
}
