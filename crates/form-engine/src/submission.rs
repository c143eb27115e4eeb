use serde::{Deserialize, Serialize};

use crate::spec::schema::FormSchema;
use crate::state::{FormState, Values};
use crate::visibility::visible_field_ids;

/// Values handed to a submit callback.
///
/// Only fields visible at submit time are included, so values left behind by
/// fields that have since been hidden are never submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub form_id: String,
    pub submit_count: u32,
    pub values: Values,
}

impl Submission {
    pub(crate) fn collect(schema: &FormSchema, state: &FormState) -> Self {
        let values = visible_field_ids(schema, &state.values)
            .into_iter()
            .filter_map(|id| state.values.get(&id).cloned().map(|value| (id, value)))
            .collect();
        Self {
            form_id: schema.id.clone(),
            submit_count: state.submit_count,
            values,
        }
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        serde_cbor::to_vec(self)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, serde_cbor::Error> {
        serde_cbor::from_slice(bytes)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
