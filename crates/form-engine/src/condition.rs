use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::state::Values;

/// Comparison applied by a [`Condition`].
///
/// Operator names that are not recognised are kept as [`Operator::Unknown`]
/// instead of failing deserialization; they evaluate to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Equals,
    NotEquals,
    In,
    NotIn,
    GreaterThan,
    LessThan,
    Unknown(String),
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "notEquals",
            Operator::In => "in",
            Operator::NotIn => "notIn",
            Operator::GreaterThan => "greaterThan",
            Operator::LessThan => "lessThan",
            Operator::Unknown(name) => name,
        }
    }
}

impl From<String> for Operator {
    fn from(name: String) -> Self {
        match name.as_str() {
            "equals" => Operator::Equals,
            "notEquals" => Operator::NotEquals,
            "in" => Operator::In,
            "notIn" => Operator::NotIn,
            "greaterThan" => Operator::GreaterThan,
            "lessThan" => Operator::LessThan,
            _ => Operator::Unknown(name),
        }
    }
}

impl From<Operator> for String {
    fn from(operator: Operator) -> Self {
        operator.as_str().to_string()
    }
}

/// Single comparison between a referenced field's current value and a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Condition {
    pub field: String,
    #[schemars(with = "String")]
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    pub fn equals(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, Operator::Equals, value)
    }

    /// Evaluates this comparison against the current value bag.
    ///
    /// An absent field is distinct from an explicit `null`: it equals
    /// nothing, is in no list and never compares as a number.
    pub fn evaluate(&self, values: &Values) -> bool {
        let field_value = values.get(&self.field);
        let matches = |literal: &Value| field_value.is_some_and(|value| strict_eq(value, literal));
        match &self.operator {
            Operator::Equals => matches(&self.value),
            Operator::NotEquals => !matches(&self.value),
            Operator::In => match &self.value {
                Value::Array(items) => items.iter().any(matches),
                _ => false,
            },
            Operator::NotIn => match &self.value {
                Value::Array(items) => !items.iter().any(matches),
                _ => true,
            },
            Operator::GreaterThan => field_value
                .is_some_and(|value| compare(value, &self.value, |left, right| left > right)),
            Operator::LessThan => field_value
                .is_some_and(|value| compare(value, &self.value, |left, right| left < right)),
            Operator::Unknown(name) => {
                warn!(
                    field = %self.field,
                    operator = %name,
                    "unknown condition operator, treating as satisfied"
                );
                true
            }
        }
    }
}

/// `visibleWhen` / `enabledWhen` payload: one condition or an AND-ed list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ConditionSet {
    Single(Condition),
    All(Vec<Condition>),
}

impl ConditionSet {
    pub fn iter(&self) -> std::slice::Iter<'_, Condition> {
        match self {
            ConditionSet::Single(condition) => std::slice::from_ref(condition).iter(),
            ConditionSet::All(conditions) => conditions.iter(),
        }
    }

    /// True iff every condition holds. An empty list is always true.
    pub fn evaluate(&self, values: &Values) -> bool {
        self.iter().all(|condition| condition.evaluate(values))
    }

    pub fn references(&self, field_id: &str) -> bool {
        self.iter().any(|condition| condition.field == field_id)
    }
}

impl From<Condition> for ConditionSet {
    fn from(condition: Condition) -> Self {
        ConditionSet::Single(condition)
    }
}

impl From<Vec<Condition>> for ConditionSet {
    fn from(conditions: Vec<Condition>) -> Self {
        ConditionSet::All(conditions)
    }
}

/// Absent condition sets evaluate to `true`.
pub fn evaluate(conditions: Option<&ConditionSet>, values: &Values) -> bool {
    conditions.is_none_or(|set| set.evaluate(values))
}

/// Structural equality without cross-type coercion; numbers compare by value
/// so `1` and `1.0` are equal.
pub fn strict_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| strict_eq(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| strict_eq(x, y)))
        }
        _ => left == right,
    }
}

fn compare(field_value: &Value, literal: &Value, op: impl Fn(f64, f64) -> bool) -> bool {
    match (field_value.as_f64(), literal.as_f64()) {
        (Some(left), Some(right)) if field_value.is_number() => op(left, right),
        _ => false,
    }
}
