use std::fmt;
use std::sync::Arc;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::condition::{Condition, ConditionSet};
use crate::state::Values;

/// Renderer tag attached to a field.
///
/// The set is closed; tags the engine does not know deserialize into
/// [`FieldKind::Unsupported`] so a schema with a newer widget still loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Textarea,
    Select,
    Multiselect,
    Checkbox,
    Radio,
    Switch,
    Date,
    Number,
    File,
    #[serde(other)]
    Unsupported,
}

/// Coarse JSON shape a renderer produces for its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    String,
    List,
    Boolean,
    Number,
    Any,
}

impl ValueShape {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ValueShape::String => value.is_string(),
            ValueShape::List => value.is_array(),
            ValueShape::Boolean => value.is_boolean(),
            ValueShape::Number => value.is_number(),
            ValueShape::Any => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueShape::String => "string",
            ValueShape::List => "list",
            ValueShape::Boolean => "boolean",
            ValueShape::Number => "number",
            ValueShape::Any => "any",
        }
    }
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Textarea => "textarea",
            FieldKind::Select => "select",
            FieldKind::Multiselect => "multiselect",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Radio => "radio",
            FieldKind::Switch => "switch",
            FieldKind::Date => "date",
            FieldKind::Number => "number",
            FieldKind::File => "file",
            FieldKind::Unsupported => "unsupported",
        }
    }

    /// Shape of the value the renderer for this tag writes back.
    pub fn value_shape(&self) -> ValueShape {
        match self {
            FieldKind::Text
            | FieldKind::Textarea
            | FieldKind::Select
            | FieldKind::Radio
            | FieldKind::Date => ValueShape::String,
            FieldKind::Multiselect => ValueShape::List,
            FieldKind::Checkbox | FieldKind::Switch => ValueShape::Boolean,
            FieldKind::Number => ValueShape::Number,
            FieldKind::File | FieldKind::Unsupported => ValueShape::Any,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, FieldKind::Unsupported)
    }
}

/// `required` accepts either a flag or the message to show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Required {
    Flag(bool),
    Message(String),
}

impl Required {
    /// An empty message counts as "not required", same as `false`.
    pub fn is_enabled(&self) -> bool {
        match self {
            Required::Flag(flag) => *flag,
            Required::Message(message) => !message.is_empty(),
        }
    }

    pub fn message(&self, label: &str) -> String {
        match self {
            Required::Message(message) if !message.is_empty() => message.clone(),
            _ => format!("{} is required", label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LengthRule {
    pub value: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RangeRule {
    pub value: f64,
    pub message: String,
}

/// Regular-expression rule. The expression is compiled when the schema loads.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PatternRule {
    #[serde(with = "regex_text")]
    #[schemars(with = "String")]
    pub regex: Regex,
    pub message: String,
}

impl PatternRule {
    pub fn new(pattern: &str, message: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            message: message.into(),
        })
    }
}

impl PartialEq for PatternRule {
    fn eq(&self, other: &Self) -> bool {
        self.regex.as_str() == other.regex.as_str() && self.message == other.message
    }
}

mod regex_text {
    use regex::Regex;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(regex: &Regex, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(regex.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Regex, D::Error> {
        let pattern = String::deserialize(deserializer)?;
        Regex::new(&pattern).map_err(D::Error::custom)
    }
}

/// Result of a custom predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomVerdict {
    Pass,
    Fail,
    Message(String),
}

impl From<bool> for CustomVerdict {
    fn from(valid: bool) -> Self {
        if valid {
            CustomVerdict::Pass
        } else {
            CustomVerdict::Fail
        }
    }
}

impl From<String> for CustomVerdict {
    fn from(message: String) -> Self {
        CustomVerdict::Message(message)
    }
}

impl From<&str> for CustomVerdict {
    fn from(message: &str) -> Self {
        CustomVerdict::Message(message.to_string())
    }
}

type CustomFn = dyn Fn(&Value, &Values) -> CustomVerdict + Send + Sync;

/// Caller-supplied predicate `(value, all_values) -> verdict`.
///
/// Predicates cannot travel through JSON; they are attached in code after a
/// schema is loaded, see [`FieldSpec::with_custom`].
#[derive(Clone)]
pub struct CustomValidator(Arc<CustomFn>);

impl CustomValidator {
    pub fn new<F, V>(check: F) -> Self
    where
        F: Fn(&Value, &Values) -> V + Send + Sync + 'static,
        V: Into<CustomVerdict>,
    {
        Self(Arc::new(move |value: &Value, values: &Values| -> CustomVerdict {
            check(value, values).into()
        }))
    }

    pub fn check(&self, value: &Value, values: &Values) -> CustomVerdict {
        (self.0)(value, values)
    }
}

impl fmt::Debug for CustomValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomValidator(..)")
    }
}

impl PartialEq for CustomValidator {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Declared validation rules for a field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Rules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Required>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<LengthRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<LengthRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<RangeRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<RangeRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<PatternRule>,
    #[serde(skip)]
    pub custom: Option<CustomValidator>,
}

/// One input slot of a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Renderer-specific configuration; the engine never reads it.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Rules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_when: Option<ConditionSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_when: Option<ConditionSet>,
}

impl FieldSpec {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            placeholder: None,
            input_type: None,
            default_value: None,
            options: Map::new(),
            rules: None,
            visible_when: None,
            enabled_when: None,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_rules(mut self, rules: Rules) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn visible_when(mut self, conditions: impl Into<ConditionSet>) -> Self {
        self.visible_when = Some(conditions.into());
        self
    }

    pub fn enabled_when(mut self, conditions: impl Into<ConditionSet>) -> Self {
        self.enabled_when = Some(conditions.into());
        self
    }

    /// Attaches a custom predicate, creating an empty rule set if needed.
    pub fn with_custom(mut self, validator: CustomValidator) -> Self {
        self.rules.get_or_insert_with(Rules::default).custom = Some(validator);
        self
    }

    /// Iterates the conditions of `visible_when` followed by `enabled_when`.
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.visible_when
            .iter()
            .chain(self.enabled_when.iter())
            .flat_map(|set| set.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_renderer_tag_falls_back() {
        let field: FieldSpec = serde_json::from_value(json!({
            "id": "color",
            "label": "Color",
            "type": "colorpicker"
        }))
        .expect("deserialize");
        assert_eq!(field.kind, FieldKind::Unsupported);
        assert_eq!(field.kind.value_shape(), ValueShape::Any);
    }

    #[test]
    fn empty_required_message_is_not_required() {
        assert!(!Required::Message(String::new()).is_enabled());
        assert!(Required::Message("Needed".into()).is_enabled());
        assert_eq!(Required::Flag(true).message("Email"), "Email is required");
    }

    #[test]
    fn invalid_pattern_is_rejected_on_load() {
        let result: Result<Rules, _> = serde_json::from_value(json!({
            "pattern": { "regex": "([a-z", "message": "bad" }
        }));
        assert!(result.is_err());
    }
}
