use std::{
    fmt::{Display, Formatter, Result},
    ops::Deref,
};

/// Data type of a decoded field.
///
/// Variant names mirror [`Value`](crate::Value) so a value can be checked
/// against the type that describes it.
#[derive(Debug, Clone, PartialEq)]
pub enum DataTypeDef {
    Null,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    /// Enumeration; values carry the numeric code.
    Enum(String),
    String,
    Bytes,
    Struct(FieldDefs),
    List(Box<ElementDef>),
    Array(Box<ElementDef>, usize),
    Map {
        key: Box<ElementDef>,
        value: Box<ElementDef>,
    },
}

impl DataTypeDef {
    /// True for leaves that coerce to a numeric sample.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataTypeDef::Bool
                | DataTypeDef::I8
                | DataTypeDef::I16
                | DataTypeDef::I32
                | DataTypeDef::I64
                | DataTypeDef::U8
                | DataTypeDef::U16
                | DataTypeDef::U32
                | DataTypeDef::U64
                | DataTypeDef::F32
                | DataTypeDef::F64
                | DataTypeDef::Enum(_)
        )
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            DataTypeDef::Null => "null",
            DataTypeDef::Bool => "bool",
            DataTypeDef::I8 => "i8",
            DataTypeDef::I16 => "i16",
            DataTypeDef::I32 => "i32",
            DataTypeDef::I64 => "i64",
            DataTypeDef::U8 => "u8",
            DataTypeDef::U16 => "u16",
            DataTypeDef::U32 => "u32",
            DataTypeDef::U64 => "u64",
            DataTypeDef::F32 => "f32",
            DataTypeDef::F64 => "f64",
            DataTypeDef::Enum(_) => "enum",
            DataTypeDef::String => "string",
            DataTypeDef::Bytes => "bytes",
            DataTypeDef::Struct(_) => "struct",
            DataTypeDef::List(_) => "list",
            DataTypeDef::Array(_, _) => "array",
            DataTypeDef::Map { .. } => "map",
        }
    }
}

/// Ordered member definitions of a message or struct.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldDefs(pub Vec<FieldDef>);

impl FieldDefs {
    pub fn new(fields: Vec<FieldDef>) -> Self {
        Self(fields)
    }

    pub fn as_slice(&self) -> &[FieldDef] {
        &self.0
    }

    /// Index of the member called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|f| f.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.0.iter().find(|f| f.name == name)
    }
}

impl From<Vec<FieldDef>> for FieldDefs {
    fn from(value: Vec<FieldDef>) -> Self {
        Self(value)
    }
}

impl AsRef<[FieldDef]> for FieldDefs {
    fn as_ref(&self) -> &[FieldDef] {
        self.as_slice()
    }
}

impl Deref for FieldDefs {
    type Target = [FieldDef];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl Display for FieldDefs {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = super::format_field_defs(self.as_slice())?;
        f.write_str(&text)
    }
}

/// Element definition used inside lists, arrays and maps.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDef {
    pub data_type: DataTypeDef,
    pub nullable: bool,
}

impl ElementDef {
    pub fn new(data_type: DataTypeDef, nullable: bool) -> Self {
        Self {
            data_type,
            nullable,
        }
    }
}

/// Named member of a message or struct.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub element: ElementDef,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, data_type: DataTypeDef, nullable: bool) -> Self {
        Self {
            name: name.into(),
            element: ElementDef::new(data_type, nullable),
        }
    }

    pub fn data_type(&self) -> &DataTypeDef {
        &self.element.data_type
    }
}
