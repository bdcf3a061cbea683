//! Convert a protobuf `DynamicMessage` into a [`Value`] tree.

use std::sync::Arc;

use prost_reflect::{DynamicMessage, MapKey, MessageDescriptor, ReflectMessage, Value as ProtoValue};
use segingest_core::{DecoderError, Value};

use crate::PresencePolicy;

pub(crate) fn decode_message(
    schema_name: &str,
    descriptor: &MessageDescriptor,
    message_data: &[u8],
    policy: PresencePolicy,
) -> Result<Value, DecoderError> {
    let message = DynamicMessage::decode(descriptor.clone(), message_data).map_err(|e| {
        DecoderError::MessageDecode {
            schema_name: schema_name.to_string(),
            source: Box::new(e),
        }
    })?;
    Ok(message_to_value(&message, policy))
}

fn message_to_value(msg: &DynamicMessage, policy: PresencePolicy) -> Value {
    let fields = msg
        .descriptor()
        .fields()
        .map(|field| {
            if policy == PresencePolicy::PresenceAware
                && field.supports_presence()
                && !msg.has_field(&field)
            {
                return Value::Null;
            }
            proto_value_to_value(msg.get_field(&field).as_ref(), policy)
        })
        .collect();
    Value::Struct(fields)
}

fn proto_value_to_value(value: &ProtoValue, policy: PresencePolicy) -> Value {
    match value {
        ProtoValue::Bool(v) => Value::Bool(*v),
        ProtoValue::I32(v) => Value::I32(*v),
        ProtoValue::I64(v) => Value::I64(*v),
        ProtoValue::U32(v) => Value::U32(*v),
        ProtoValue::U64(v) => Value::U64(*v),
        ProtoValue::F32(v) => Value::F32(*v),
        ProtoValue::F64(v) => Value::F64(*v),
        ProtoValue::String(s) => Value::String(Arc::from(s.as_str())),
        ProtoValue::Bytes(b) => Value::Bytes(Arc::from(b.as_ref())),
        ProtoValue::EnumNumber(n) => Value::Enum(*n),
        ProtoValue::Message(m) => message_to_value(m, policy),
        ProtoValue::List(items) => Value::List(
            items
                .iter()
                .map(|v| proto_value_to_value(v, policy))
                .collect(),
        ),
        ProtoValue::Map(map) => Value::Map(
            map.iter()
                .map(|(k, v)| (map_key_to_value(k), proto_value_to_value(v, policy)))
                .collect(),
        ),
    }
}

fn map_key_to_value(k: &MapKey) -> Value {
    match k {
        MapKey::Bool(v) => Value::Bool(*v),
        MapKey::I32(v) => Value::I32(*v),
        MapKey::I64(v) => Value::I64(*v),
        MapKey::U32(v) => Value::U32(*v),
        MapKey::U64(v) => Value::U64(*v),
        MapKey::String(s) => Value::String(Arc::from(s.as_str())),
    }
}
