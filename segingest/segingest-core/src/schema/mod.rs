//! Schema intermediate representation for decoded event payloads.

mod format;
mod types;

pub use format::format_field_defs;
pub use types::{DataTypeDef, ElementDef, FieldDef, FieldDefs};
