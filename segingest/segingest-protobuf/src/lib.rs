//! Protobuf [`MessageDecoder`] for event-log channels.
//!
//! A channel's schema is a serialized `FileDescriptorSet` plus the
//! fully-qualified message name. [`ProtobufDecoder`] resolves the descriptor
//! once per channel and hands back a [`TopicDecoder`] that reuses it for every
//! payload.

mod decode;
mod policy;
mod schema;

use prost_reflect::MessageDescriptor;
use segingest_core::{
    DecoderError, EncodingKey, FieldDefs, MessageDecoder, MessageEncoding, SchemaEncoding,
    TopicDecoder, Value,
};

pub use policy::PresencePolicy;
pub use schema::{message_descriptor, protobuf_descriptor_to_schema};

/// Factory for protobuf topic decoders.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtobufDecoder {
    presence_policy: PresencePolicy,
}

impl ProtobufDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_presence_policy(presence_policy: PresencePolicy) -> Self {
        Self { presence_policy }
    }
}

impl MessageDecoder for ProtobufDecoder {
    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::new(SchemaEncoding::Protobuf, MessageEncoding::Protobuf)
    }

    fn build_topic_decoder(
        &self,
        schema_name: &str,
        schema_data: &[u8],
    ) -> Result<Box<dyn TopicDecoder>, DecoderError> {
        let descriptor = message_descriptor(schema_name, schema_data)?;
        let field_defs = schema::message_field_defs(schema_name, &descriptor, self.presence_policy)?;
        Ok(Box::new(ProtobufTopicDecoder {
            schema_name: schema_name.to_string(),
            descriptor,
            field_defs,
            presence_policy: self.presence_policy,
        }))
    }
}

struct ProtobufTopicDecoder {
    schema_name: String,
    descriptor: MessageDescriptor,
    field_defs: FieldDefs,
    presence_policy: PresencePolicy,
}

impl TopicDecoder for ProtobufTopicDecoder {
    fn decode(&self, message_data: &[u8]) -> Result<Value, DecoderError> {
        decode::decode_message(
            &self.schema_name,
            &self.descriptor,
            message_data,
            self.presence_policy,
        )
    }

    fn field_defs(&self) -> &FieldDefs {
        &self.field_defs
    }
}
