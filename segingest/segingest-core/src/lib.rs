//! Encoding-agnostic core types and decoder contracts for `segingest`.
//!
//! Decoders turn an event payload into a [`Value`] tree that runs parallel to
//! the channel's [`FieldDefs`]. Everything downstream (field extraction, CAN
//! frame lookup, video correlation) walks those two structures together.

mod decoder;
mod encoding;
mod error;
mod schema;
mod value;

pub use decoder::{EncodingKey, MessageDecoder, TopicDecoder};
pub use encoding::{MessageEncoding, SchemaEncoding};
pub use error::{DecoderError, ValueTypeError};
pub use schema::{DataTypeDef, ElementDef, FieldDef, FieldDefs, format_field_defs};
pub use value::Value;
