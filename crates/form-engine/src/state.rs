use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::condition::strict_eq;

/// Field identifier to current value.
pub type Values = Map<String, Value>;

/// Field identifier to active error message. Absence means valid or not yet validated.
pub type ErrorMap = BTreeMap<String, String>;

/// Mutable form state owned by a [`crate::FormStore`]. Consumers only ever
/// see clones of it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormState {
    pub values: Values,
    pub errors: ErrorMap,
    pub touched: BTreeSet<String>,
    pub is_submitting: bool,
    pub is_validating: bool,
    pub submit_count: u32,
}

impl FormState {
    pub(crate) fn with_values(values: Values) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Deep comparison against `initial`; cost grows with the total value size.
    pub fn is_dirty(&self, initial: &Values) -> bool {
        !values_eq(&self.values, initial)
    }
}

/// Metadata derived from [`FormState`] and the active schema. Never stored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormMeta {
    pub is_dirty: bool,
    pub is_valid: bool,
    pub touched_fields: Vec<String>,
    pub error_fields: Vec<String>,
    pub visible_fields: Vec<String>,
    pub enabled_fields: Vec<String>,
}

pub(crate) fn values_eq(left: &Values, right: &Values) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .all(|(key, value)| right.get(key).is_some_and(|other| strict_eq(value, other)))
}

/// Empty means null, a whitespace-only string, or an empty list.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn emptiness_covers_whitespace_and_empty_lists() {
        assert!(is_empty_value(None));
        assert!(is_empty_value(Some(&Value::Null)));
        assert!(is_empty_value(Some(&json!("   "))));
        assert!(is_empty_value(Some(&json!([]))));
        assert!(!is_empty_value(Some(&json!(0))));
        assert!(!is_empty_value(Some(&json!(false))));
        assert!(!is_empty_value(Some(&json!({}))));
    }

    #[test]
    fn dirty_check_is_structural() {
        let initial = json!({ "tags": ["a", "b"], "n": 1 })
            .as_object()
            .cloned()
            .unwrap_or_default();
        let mut state = FormState::with_values(initial.clone());
        assert!(!state.is_dirty(&initial));
        state.values.insert("tags".into(), json!(["a", "b"]));
        assert!(!state.is_dirty(&initial));
        state.values.insert("tags".into(), json!(["a"]));
        assert!(state.is_dirty(&initial));
    }
}
