//! Map protobuf descriptors onto [`FieldDefs`].

use prost_reflect::{DescriptorPool, FieldDescriptor, Kind, MessageDescriptor};
use segingest_core::{DataTypeDef, DecoderError, ElementDef, FieldDef, FieldDefs};

use crate::PresencePolicy;

/// Resolve `schema_name` inside a serialized `FileDescriptorSet`.
pub fn message_descriptor(
    schema_name: &str,
    schema_data: &[u8],
) -> Result<MessageDescriptor, DecoderError> {
    let pool = DescriptorPool::decode(schema_data).map_err(|e| DecoderError::SchemaParse {
        schema_name: schema_name.to_string(),
        source: Box::new(e),
    })?;
    pool.get_message_by_name(schema_name)
        .ok_or_else(|| DecoderError::SchemaInvalid {
            schema_name: schema_name.to_string(),
            detail: format!("message descriptor not found: '{schema_name}'"),
        })
}

/// Derive [`FieldDefs`] for the named message using presence-aware nullability.
pub fn protobuf_descriptor_to_schema(
    schema_name: &str,
    schema_data: &[u8],
) -> Result<FieldDefs, DecoderError> {
    let descriptor = message_descriptor(schema_name, schema_data)?;
    message_field_defs(schema_name, &descriptor, PresencePolicy::PresenceAware)
}

pub(crate) fn message_field_defs(
    schema_name: &str,
    desc: &MessageDescriptor,
    policy: PresencePolicy,
) -> Result<FieldDefs, DecoderError> {
    desc.fields()
        .map(|f| field_def(schema_name, &f, policy))
        .collect::<Result<Vec<_>, _>>()
        .map(Into::into)
}

fn field_def(
    schema_name: &str,
    fd: &FieldDescriptor,
    policy: PresencePolicy,
) -> Result<FieldDef, DecoderError> {
    let data_type = if fd.is_map() {
        map_type(schema_name, fd, policy)?
    } else {
        let inner = kind_type(schema_name, &fd.kind(), policy)?;
        if fd.is_list() {
            DataTypeDef::List(Box::new(ElementDef::new(inner, false)))
        } else {
            inner
        }
    };

    let nullable = match policy {
        PresencePolicy::AlwaysDefault => false,
        PresencePolicy::PresenceAware => fd.supports_presence(),
    };
    Ok(FieldDef::new(fd.name(), data_type, nullable))
}

fn map_type(
    schema_name: &str,
    fd: &FieldDescriptor,
    policy: PresencePolicy,
) -> Result<DataTypeDef, DecoderError> {
    let invalid = |detail: String| DecoderError::SchemaInvalid {
        schema_name: schema_name.to_string(),
        detail,
    };
    let Kind::Message(entry) = fd.kind() else {
        return Err(invalid(format!("map field `{}` has non-message kind", fd.name())));
    };
    let key = entry
        .get_field_by_name("key")
        .ok_or_else(|| invalid(format!("map entry `{}` missing key field", fd.name())))?;
    let value = entry
        .get_field_by_name("value")
        .ok_or_else(|| invalid(format!("map entry `{}` missing value field", fd.name())))?;
    Ok(DataTypeDef::Map {
        key: Box::new(ElementDef::new(kind_type(schema_name, &key.kind(), policy)?, false)),
        value: Box::new(ElementDef::new(kind_type(schema_name, &value.kind(), policy)?, false)),
    })
}

fn kind_type(
    schema_name: &str,
    kind: &Kind,
    policy: PresencePolicy,
) -> Result<DataTypeDef, DecoderError> {
    let dt = match kind {
        Kind::Double => DataTypeDef::F64,
        Kind::Float => DataTypeDef::F32,
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => DataTypeDef::I32,
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => DataTypeDef::I64,
        Kind::Uint32 | Kind::Fixed32 => DataTypeDef::U32,
        Kind::Uint64 | Kind::Fixed64 => DataTypeDef::U64,
        Kind::Bool => DataTypeDef::Bool,
        Kind::String => DataTypeDef::String,
        Kind::Bytes => DataTypeDef::Bytes,
        Kind::Enum(ed) => DataTypeDef::Enum(ed.full_name().to_string()),
        Kind::Message(md) => DataTypeDef::Struct(message_field_defs(schema_name, md, policy)?),
    };
    Ok(dt)
}
