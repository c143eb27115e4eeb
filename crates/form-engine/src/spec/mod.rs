pub mod field;
pub mod layout;
pub mod schema;

pub use field::{
    CustomValidator, CustomVerdict, FieldKind, FieldSpec, LengthRule, PatternRule, RangeRule,
    Required, Rules, ValueShape,
};
pub use layout::{FieldIds, LayoutNode, field_ids};
pub use schema::FormSchema;
