//! Decoder traits and the encoding key used to look decoders up.

use crate::{
    encoding::{MessageEncoding, SchemaEncoding},
    error::DecoderError,
    schema::FieldDefs,
    value::Value,
};

/// Key identifying a (schema_encoding, message_encoding) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodingKey {
    pub schema_encoding: SchemaEncoding,
    pub message_encoding: MessageEncoding,
}

impl EncodingKey {
    pub fn new(schema_encoding: SchemaEncoding, message_encoding: MessageEncoding) -> Self {
        Self {
            schema_encoding,
            message_encoding,
        }
    }

    pub fn from_strs(schema_encoding: &str, message_encoding: &str) -> Self {
        Self::new(schema_encoding.into(), message_encoding.into())
    }
}

/// Channel-local decoder built once from the channel's schema.
pub trait TopicDecoder: Send + Sync {
    /// Decode one event payload into a [`Value`] shaped like [`Self::field_defs`].
    fn decode(&self, message_data: &[u8]) -> Result<Value, DecoderError>;

    /// Member layout of every value this decoder produces.
    fn field_defs(&self) -> &FieldDefs;
}

/// Factory that turns channel schema metadata into a [`TopicDecoder`].
pub trait MessageDecoder: Send + Sync {
    /// Encoding pair this decoder handles.
    fn encoding_key(&self) -> EncodingKey;

    /// Build a decoder for the named schema.
    ///
    /// Returns `Err` if the schema cannot be parsed or is structurally invalid.
    fn build_topic_decoder(
        &self,
        schema_name: &str,
        schema_data: &[u8],
    ) -> Result<Box<dyn TopicDecoder>, DecoderError>;
}
