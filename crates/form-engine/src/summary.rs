use serde_json::{Map, Value, json};

use crate::spec::field::FieldKind;
use crate::store::FormStore;

/// Status labels used by the summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryStatus {
    /// Some visible field currently has an error.
    Invalid,
    /// No errors are recorded.
    Valid,
    /// A submit callback is in flight.
    Submitting,
}

impl SummaryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryStatus::Invalid => "invalid",
            SummaryStatus::Valid => "valid",
            SummaryStatus::Submitting => "submitting",
        }
    }
}

/// One row per declared field.
#[derive(Debug, Clone)]
pub struct SummaryField {
    pub id: String,
    pub label: String,
    pub kind: FieldKind,
    pub visible: bool,
    pub enabled: bool,
    pub touched: bool,
    pub value: Option<Value>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FormSummary {
    pub form_id: String,
    pub title: String,
    pub status: SummaryStatus,
    pub dirty: bool,
    pub submit_count: u32,
    pub fields: Vec<SummaryField>,
}

impl FormSummary {
    pub fn visible_count(&self) -> usize {
        self.fields.iter().filter(|field| field.visible).count()
    }
}

/// Snapshot the store into a summary. Errors are only carried for touched fields.
pub fn build_summary(store: &FormStore) -> FormSummary {
    let schema = store.schema();
    let state = store.state();
    let meta = store.meta();

    let fields = schema
        .fields
        .iter()
        .map(|field| SummaryField {
            id: field.id.clone(),
            label: field.label.clone(),
            kind: field.kind,
            visible: meta.visible_fields.contains(&field.id),
            enabled: meta.enabled_fields.contains(&field.id),
            touched: state.touched.contains(&field.id),
            value: state.values.get(&field.id).cloned(),
            error: store.displayed_error(&field.id),
        })
        .collect();

    let status = if state.is_submitting {
        SummaryStatus::Submitting
    } else if meta.is_valid {
        SummaryStatus::Valid
    } else {
        SummaryStatus::Invalid
    };

    FormSummary {
        form_id: schema.id,
        title: schema.title,
        status,
        dirty: meta.is_dirty,
        submit_count: state.submit_count,
        fields,
    }
}

pub fn render_json(summary: &FormSummary) -> Value {
    let fields = summary
        .fields
        .iter()
        .map(|field| {
            let mut map = Map::new();
            map.insert("id".into(), Value::String(field.id.clone()));
            map.insert("label".into(), Value::String(field.label.clone()));
            map.insert("type".into(), Value::String(field.kind.as_str().into()));
            map.insert("visible".into(), Value::Bool(field.visible));
            map.insert("enabled".into(), Value::Bool(field.enabled));
            map.insert("touched".into(), Value::Bool(field.touched));
            if let Some(value) = &field.value {
                map.insert("value".into(), value.clone());
            }
            if let Some(error) = &field.error {
                map.insert("error".into(), Value::String(error.clone()));
            }
            Value::Object(map)
        })
        .collect::<Vec<_>>();

    json!({
        "form_id": summary.form_id,
        "title": summary.title,
        "status": summary.status.as_str(),
        "dirty": summary.dirty,
        "submit_count": summary.submit_count,
        "fields": fields,
    })
}

pub fn render_text(summary: &FormSummary) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Form: {} ({})", summary.title, summary.form_id));
    lines.push(format!(
        "Status: {} ({} visible of {})",
        summary.status.as_str(),
        summary.visible_count(),
        summary.fields.len()
    ));

    lines.push("Visible fields:".to_string());
    for field in summary.fields.iter().filter(|field| field.visible) {
        let mut entry = format!(" - {} ({})", field.id, field.label);
        if !field.enabled {
            entry.push_str(" [disabled]");
        }
        if let Some(value) = &field.value {
            entry.push_str(&format!(" = {}", value_to_display(value)));
        }
        lines.push(entry);
        if let Some(error) = &field.error {
            lines.push(format!("     error: {}", error));
        }
    }

    let hidden: Vec<&str> = summary
        .fields
        .iter()
        .filter(|field| !field.visible)
        .map(|field| field.id.as_str())
        .collect();
    if !hidden.is_empty() {
        lines.push(format!("Hidden fields: {}", hidden.join(", ")));
    }

    lines.join("\n")
}

fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
