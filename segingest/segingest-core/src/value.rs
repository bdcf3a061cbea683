//! Decoded payload tree produced by message decoders.

use std::sync::Arc;

use crate::{error::ValueTypeError, schema::FieldDefs};

/// Value produced by message decoders.
///
/// `Struct` members are positional and line up with the [`FieldDefs`] of the
/// channel (or of the enclosing struct type).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    /// Enumeration member, kept as its numeric code.
    Enum(i32),
    String(Arc<str>),
    Bytes(Arc<[u8]>),
    Struct(Vec<Value>),
    List(Vec<Value>),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Self::String(Arc::from(s.as_ref()))
    }

    pub fn bytes(b: impl AsRef<[u8]>) -> Self {
        Self::Bytes(Arc::from(b.as_ref()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of a scalar leaf.
    ///
    /// Booleans become `0.0`/`1.0` and enum members their code. Text, bytes,
    /// nulls and composite values have no numeric view.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::I8(v) => Some(f64::from(*v)),
            Value::I16(v) => Some(f64::from(*v)),
            Value::I32(v) => Some(f64::from(*v)),
            Value::I64(v) => Some(*v as f64),
            Value::U8(v) => Some(f64::from(*v)),
            Value::U16(v) => Some(f64::from(*v)),
            Value::U32(v) => Some(f64::from(*v)),
            Value::U64(v) => Some(*v as f64),
            Value::F32(v) => Some(f64::from(*v)),
            Value::F64(v) => Some(*v),
            Value::Enum(v) => Some(f64::from(*v)),
            _ => None,
        }
    }

    /// Integer view of an integral leaf; `Null` maps to `Ok(None)`.
    pub fn try_i64(&self) -> Result<Option<i64>, ValueTypeError> {
        match self {
            Value::I8(v) => Ok(Some(i64::from(*v))),
            Value::I16(v) => Ok(Some(i64::from(*v))),
            Value::I32(v) => Ok(Some(i64::from(*v))),
            Value::I64(v) => Ok(Some(*v)),
            Value::U8(v) => Ok(Some(i64::from(*v))),
            Value::U16(v) => Ok(Some(i64::from(*v))),
            Value::U32(v) => Ok(Some(i64::from(*v))),
            Value::U64(v) => i64::try_from(*v)
                .map(Some)
                .map_err(|_| self.type_mismatch("integer within i64 range")),
            Value::Enum(v) => Ok(Some(i64::from(*v))),
            Value::Null => Ok(None),
            _ => Err(self.type_mismatch("integer")),
        }
    }

    pub fn try_bool(&self) -> Result<Option<bool>, ValueTypeError> {
        match self {
            Value::Bool(v) => Ok(Some(*v)),
            Value::Null => Ok(None),
            _ => Err(self.type_mismatch("Bool")),
        }
    }

    pub fn try_str(&self) -> Result<Option<&str>, ValueTypeError> {
        match self {
            Value::String(v) => Ok(Some(v.as_ref())),
            Value::Null => Ok(None),
            _ => Err(self.type_mismatch("String")),
        }
    }

    pub fn try_bytes(&self) -> Result<Option<&[u8]>, ValueTypeError> {
        match self {
            Value::Bytes(v) => Ok(Some(v.as_ref())),
            Value::Null => Ok(None),
            _ => Err(self.type_mismatch("Bytes")),
        }
    }

    /// Elements of a `List` or `Array`; `Null` is treated as empty.
    pub fn try_elements(&self) -> Result<&[Value], ValueTypeError> {
        match self {
            Value::List(items) | Value::Array(items) => Ok(items),
            Value::Null => Ok(&[]),
            _ => Err(self.type_mismatch("List")),
        }
    }

    /// Looks up a struct member by name using the matching field definitions.
    ///
    /// Returns `None` when the field is not declared or the value is not a
    /// struct of the declared width.
    pub fn field<'v>(&'v self, defs: &FieldDefs, name: &str) -> Option<&'v Value> {
        let Value::Struct(members) = self else {
            return None;
        };
        if members.len() != defs.len() {
            return None;
        }
        let index = defs.position(name)?;
        members.get(index)
    }

    pub fn type_mismatch(&self, expected: impl Into<String>) -> ValueTypeError {
        ValueTypeError::new(expected, self.variant_name())
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::I8(_) => "I8",
            Value::I16(_) => "I16",
            Value::I32(_) => "I32",
            Value::I64(_) => "I64",
            Value::U8(_) => "U8",
            Value::U16(_) => "U16",
            Value::U32(_) => "U32",
            Value::U64(_) => "U64",
            Value::F32(_) => "F32",
            Value::F64(_) => "F64",
            Value::Enum(_) => "Enum",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
            Value::Struct(_) => "Struct",
            Value::List(_) => "List",
            Value::Array(_) => "Array",
            Value::Map(_) => "Map",
        }
    }
}
