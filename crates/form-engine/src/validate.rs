use serde_json::Value;

use crate::condition;
use crate::spec::field::{CustomVerdict, FieldSpec, Rules};
use crate::spec::schema::FormSchema;
use crate::state::{ErrorMap, Values, is_empty_value};
use crate::visibility::resolve_visibility;

const GENERIC_FAILURE: &str = "Validation failed";

/// Validates one field's value against its rules.
///
/// Returns the first failing rule's message. Fields hidden by their own
/// `visible_when` are never invalid.
pub fn validate_field(
    field: &FieldSpec,
    value: Option<&Value>,
    all_values: &Values,
) -> Option<String> {
    if !condition::evaluate(field.visible_when.as_ref(), all_values) {
        return None;
    }

    let rules = field.rules.as_ref()?;

    let empty = is_empty_value(value);
    if empty
        && let Some(required) = &rules.required
        && required.is_enabled()
    {
        return Some(required.message(&field.label));
    }

    // Optional and empty: nothing else applies.
    let value = match value {
        Some(value) if !empty => value,
        _ => return None,
    };

    enforce_rules(rules, value, all_values)
}

fn enforce_rules(rules: &Rules, value: &Value, all_values: &Values) -> Option<String> {
    if let Some(rule) = &rules.min_length
        && let Some(len) = measured_len(value)
        && len < rule.value
    {
        return Some(rule.message.clone());
    }

    if let Some(rule) = &rules.max_length
        && let Some(len) = measured_len(value)
        && len > rule.value
    {
        return Some(rule.message.clone());
    }

    if let Some(rule) = &rules.min
        && let Some(number) = value.as_f64()
        && number < rule.value
    {
        return Some(rule.message.clone());
    }

    if let Some(rule) = &rules.max
        && let Some(number) = value.as_f64()
        && number > rule.value
    {
        return Some(rule.message.clone());
    }

    if let Some(rule) = &rules.pattern
        && !rule.regex.is_match(&coerce_to_string(value))
    {
        return Some(rule.message.clone());
    }

    if let Some(custom) = &rules.custom {
        return match custom.check(value, all_values) {
            CustomVerdict::Pass => None,
            CustomVerdict::Fail => Some(GENERIC_FAILURE.to_string()),
            CustomVerdict::Message(message) => Some(message),
        };
    }

    None
}

/// Validates every visible field of `schema` and returns the resulting error map.
pub fn validate_values(schema: &FormSchema, values: &Values) -> ErrorMap {
    let visibility = resolve_visibility(schema, values);
    schema
        .fields
        .iter()
        .filter(|field| visibility.get(&field.id).copied().unwrap_or(true))
        .filter_map(|field| {
            validate_field(field, values.get(&field.id), values)
                .map(|message| (field.id.clone(), message))
        })
        .collect()
}

fn measured_len(value: &Value) -> Option<usize> {
    match value {
        Value::String(text) => Some(text.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => coerce_to_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        // f64 display drops an integral fraction: 5.0 -> "5".
        Value::Number(number) => match number.as_f64() {
            Some(float) if number.is_f64() => float.to_string(),
            _ => number.to_string(),
        },
        other => other.to_string(),
    }
}
