use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::warn;

use crate::condition::Operator;
use crate::spec::field::FieldSpec;
use crate::spec::layout::{FieldIds, field_ids};
use crate::spec::schema::FormSchema;
use crate::state::Values;

/// Every declared default, keyed by field id.
pub fn default_values(schema: &FormSchema) -> Values {
    schema
        .fields
        .iter()
        .filter_map(|field| {
            field
                .default_value
                .clone()
                .map(|value| (field.id.clone(), value))
        })
        .collect()
}

/// Identifiers referenced by the schema's layout tree.
pub fn layout_field_ids(schema: &FormSchema) -> FieldIds<'_> {
    field_ids(&schema.layout)
}

/// True when `field`'s `visible_when` or `enabled_when` mentions `id`.
pub fn field_depends_on(field: &FieldSpec, id: &str) -> bool {
    field.conditions().any(|condition| condition.field == id)
}

/// Fields whose visibility or enablement depends on `id`, in declaration order.
///
/// Recomputed on every call; O(fields x conditions).
pub fn dependents<'a>(schema: &'a FormSchema, id: &'a str) -> impl Iterator<Item = &'a FieldSpec> {
    schema
        .fields
        .iter()
        .filter(move |field| field_depends_on(field, id))
}

/// Reverse dependency index: referenced id to the set of fields that depend on it.
pub fn dependency_graph(schema: &FormSchema) -> BTreeMap<String, BTreeSet<String>> {
    let mut graph: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for field in &schema.fields {
        for condition in field.conditions() {
            graph
                .entry(condition.field.clone())
                .or_default()
                .insert(field.id.clone());
        }
    }
    graph
}

/// Schema problems that do not stop a form from running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    DuplicateField { field: String },
    UnknownLayoutField { field: String },
    UnreachableField { field: String },
    UnknownConditionField { field: String, referenced: String },
    UnknownOperator { field: String, operator: String },
    UnsupportedRenderer { field: String },
    DefaultShapeMismatch { field: String, expected: &'static str },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DuplicateField { field } => {
                write!(f, "field '{}' is declared more than once", field)
            }
            Diagnostic::UnknownLayoutField { field } => {
                write!(f, "layout references unknown field '{}'", field)
            }
            Diagnostic::UnreachableField { field } => {
                write!(f, "field '{}' is not placed in the layout", field)
            }
            Diagnostic::UnknownConditionField { field, referenced } => write!(
                f,
                "field '{}' has a condition on unknown field '{}'",
                field, referenced
            ),
            Diagnostic::UnknownOperator { field, operator } => write!(
                f,
                "field '{}' uses unknown operator '{}' (always satisfied)",
                field, operator
            ),
            Diagnostic::UnsupportedRenderer { field } => {
                write!(f, "field '{}' has an unsupported renderer type", field)
            }
            Diagnostic::DefaultShapeMismatch { field, expected } => write!(
                f,
                "default value of field '{}' is not a {}",
                field, expected
            ),
        }
    }
}

/// Collects schema diagnostics and logs each one at warn level.
pub fn lint(schema: &FormSchema) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let mut seen = BTreeSet::new();
    for field in &schema.fields {
        if !seen.insert(field.id.as_str()) {
            diagnostics.push(Diagnostic::DuplicateField {
                field: field.id.clone(),
            });
        }
    }

    let placed: BTreeSet<&str> = layout_field_ids(schema).collect();
    for id in layout_field_ids(schema) {
        if !schema.contains(id) {
            diagnostics.push(Diagnostic::UnknownLayoutField {
                field: id.to_string(),
            });
        }
    }
    if !schema.layout.is_empty() {
        for field in &schema.fields {
            if !placed.contains(field.id.as_str()) {
                diagnostics.push(Diagnostic::UnreachableField {
                    field: field.id.clone(),
                });
            }
        }
    }

    for field in &schema.fields {
        for condition in field.conditions() {
            if !schema.contains(&condition.field) {
                diagnostics.push(Diagnostic::UnknownConditionField {
                    field: field.id.clone(),
                    referenced: condition.field.clone(),
                });
            }
            if let Operator::Unknown(name) = &condition.operator {
                diagnostics.push(Diagnostic::UnknownOperator {
                    field: field.id.clone(),
                    operator: name.clone(),
                });
            }
        }

        if !field.kind.is_supported() {
            diagnostics.push(Diagnostic::UnsupportedRenderer {
                field: field.id.clone(),
            });
        }

        let shape = field.kind.value_shape();
        if let Some(default) = &field.default_value
            && !default.is_null()
            && !shape.accepts(default)
        {
            diagnostics.push(Diagnostic::DefaultShapeMismatch {
                field: field.id.clone(),
                expected: shape.as_str(),
            });
        }
    }

    for diagnostic in &diagnostics {
        warn!(schema = %schema.id, "{}", diagnostic);
    }
    diagnostics
}
