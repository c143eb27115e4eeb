#![allow(missing_docs)]

pub mod condition;
pub mod error;
pub mod introspect;
pub mod spec;
pub mod state;
pub mod store;
pub mod submission;
pub mod summary;
pub mod validate;
pub mod visibility;

pub use condition::{Condition, ConditionSet, Operator, evaluate};
pub use error::SchemaError;
pub use introspect::{
    Diagnostic, default_values, dependency_graph, dependents, field_depends_on, layout_field_ids,
    lint,
};
pub use spec::{
    CustomValidator, CustomVerdict, FieldIds, FieldKind, FieldSpec, FormSchema, LayoutNode,
    LengthRule, PatternRule, RangeRule, Required, Rules, ValueShape, field_ids,
};
pub use state::{ErrorMap, FormMeta, FormState, Values, is_empty_value};
pub use store::{FormStore, SubmitOutcome, Subscription};
pub use submission::Submission;
pub use summary::{FormSummary, SummaryField, SummaryStatus, build_summary, render_json, render_text};
pub use validate::{validate_field, validate_values};
pub use visibility::{VisibilityMap, resolve_enablement, resolve_visibility, visible_field_ids};
