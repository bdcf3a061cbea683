//! Error types for the decoder layer.

/// Error returned by [`MessageDecoder`](crate::MessageDecoder) and
/// [`TopicDecoder`](crate::TopicDecoder) implementations.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    /// Schema data (e.g., a serialized `FileDescriptorSet`) could not be parsed.
    #[error("failed to parse schema '{schema_name}': {source}")]
    SchemaParse {
        schema_name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Schema data parsed but does not describe a usable message.
    #[error("invalid schema '{schema_name}': {detail}")]
    SchemaInvalid { schema_name: String, detail: String },

    /// Payload bytes could not be decoded.
    #[error("failed to decode message for schema '{schema_name}': {source}")]
    MessageDecode {
        schema_name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// A decoded value did not have the variant a caller expected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected}, got {actual}")]
pub struct ValueTypeError {
    pub expected: String,
    pub actual: &'static str,
}

impl ValueTypeError {
    pub fn new(expected: impl Into<String>, actual: &'static str) -> Self {
        Self {
            expected: expected.into(),
            actual,
        }
    }
}
