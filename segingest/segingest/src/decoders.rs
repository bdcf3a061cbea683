//! Decoder registry keyed by encoding pair.

use std::{
    collections::{HashMap, hash_map::Entry},
    sync::Arc,
};

use segingest_core::{EncodingKey, MessageDecoder, TopicDecoder};
#[cfg(feature = "protobuf")]
use segingest_protobuf::ProtobufDecoder;

use crate::{error::SchemaGapError, reader::ChannelInfo};

/// Registered [`MessageDecoder`]s, looked up by a channel's encodings.
#[derive(Clone, Default)]
pub struct DecoderRegistry {
    decoders: HashMap<EncodingKey, Arc<dyn MessageDecoder>>,
}

/// Builder for [`DecoderRegistry`].
#[derive(Default)]
pub struct DecoderRegistryBuilder {
    decoders: Vec<Arc<dyn MessageDecoder>>,
}

impl DecoderRegistry {
    pub fn builder() -> DecoderRegistryBuilder {
        DecoderRegistryBuilder::default()
    }

    /// Registry with every decoder enabled by crate features.
    pub fn with_default_decoders() -> Self {
        Self::builder().with_default_decoders().build()
    }

    pub fn register(&mut self, decoder: Arc<dyn MessageDecoder>) {
        self.decoders.insert(decoder.encoding_key(), decoder);
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Build the topic decoder for `channel`.
    pub fn topic_decoder(
        &self,
        channel: &ChannelInfo,
    ) -> Result<Box<dyn TopicDecoder>, SchemaGapError> {
        let schema_name = channel
            .schema_name
            .as_deref()
            .ok_or_else(|| SchemaGapError::NoSchema {
                topic: channel.topic.clone(),
            })?;
        let key = EncodingKey::new(
            channel.schema_encoding.clone(),
            channel.message_encoding.clone(),
        );
        let decoder = self
            .decoders
            .get(&key)
            .ok_or_else(|| SchemaGapError::NoDecoder {
                topic: channel.topic.clone(),
                schema_encoding: channel.schema_encoding.to_string(),
                message_encoding: channel.message_encoding.to_string(),
            })?;
        decoder
            .build_topic_decoder(schema_name, &channel.schema_data)
            .map_err(|source| SchemaGapError::InvalidSchema {
                topic: channel.topic.clone(),
                source,
            })
    }
}

impl DecoderRegistryBuilder {
    pub fn with_decoder(mut self, decoder: Box<dyn MessageDecoder>) -> Self {
        self.decoders.push(Arc::from(decoder));
        self
    }

    pub fn with_default_decoders(self) -> Self {
        #[cfg(feature = "protobuf")]
        let this = self.with_decoder(Box::new(ProtobufDecoder::new()));
        #[cfg(not(feature = "protobuf"))]
        let this = self;
        this
    }

    pub fn build(self) -> DecoderRegistry {
        let mut registry = DecoderRegistry::default();
        for decoder in self.decoders {
            registry.register(decoder);
        }
        registry
    }
}

/// Topic decoders built lazily, once per channel id.
///
/// Channels without a usable decoder are logged once and then ignored.
pub struct ChannelDecoders<'r> {
    registry: &'r DecoderRegistry,
    cache: HashMap<u16, Option<Box<dyn TopicDecoder>>>,
}

impl<'r> ChannelDecoders<'r> {
    pub fn new(registry: &'r DecoderRegistry) -> Self {
        Self {
            registry,
            cache: HashMap::new(),
        }
    }

    pub fn get(&mut self, channel: &ChannelInfo) -> Option<&dyn TopicDecoder> {
        let slot = match self.cache.entry(channel.id) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(match self.registry.topic_decoder(channel) {
                Ok(decoder) => Some(decoder),
                Err(err) => {
                    log::debug!("ignoring channel '{}': {err}", channel.topic);
                    None
                }
            }),
        };
        slot.as_deref()
    }
}
