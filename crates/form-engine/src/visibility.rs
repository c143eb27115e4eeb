use crate::condition;
use crate::spec::schema::FormSchema;
use crate::state::Values;

pub type VisibilityMap = std::collections::BTreeMap<String, bool>;

/// Visibility flag of every field in `schema` for the given values.
pub fn resolve_visibility(schema: &FormSchema, values: &Values) -> VisibilityMap {
    schema
        .fields
        .iter()
        .map(|field| {
            let visible = condition::evaluate(field.visible_when.as_ref(), values);
            (field.id.clone(), visible)
        })
        .collect()
}

/// Enablement flag of every field in `schema` for the given values.
pub fn resolve_enablement(schema: &FormSchema, values: &Values) -> VisibilityMap {
    schema
        .fields
        .iter()
        .map(|field| {
            let enabled = condition::evaluate(field.enabled_when.as_ref(), values);
            (field.id.clone(), enabled)
        })
        .collect()
}

/// Identifiers of visible fields, in declaration order.
pub fn visible_field_ids(schema: &FormSchema, values: &Values) -> Vec<String> {
    schema
        .fields
        .iter()
        .filter(|field| condition::evaluate(field.visible_when.as_ref(), values))
        .map(|field| field.id.clone())
        .collect()
}
