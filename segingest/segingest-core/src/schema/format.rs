use std::fmt::{Error, Result, Write as _};

use super::{DataTypeDef, FieldDef};

/// Render field definitions as an indented tree, one line per field.
///
/// Leaves print as `name: type`, composite members open a nested block.
/// Used by the `schema` subcommand to show what a topic carries.
pub fn format_field_defs(fields: impl AsRef<[FieldDef]>) -> std::result::Result<String, Error> {
    let mut out = String::new();
    for field in fields.as_ref() {
        write_entry(&field.name, &field.element.data_type, field.element.nullable, 0, &mut out)?;
    }
    Ok(out)
}

fn write_entry(
    label: &str,
    data_type: &DataTypeDef,
    nullable: bool,
    indent: usize,
    out: &mut String,
) -> Result {
    let pad = " ".repeat(indent);
    let optional = if nullable { "?" } else { "" };
    match data_type {
        DataTypeDef::Struct(fields) => {
            writeln!(out, "{pad}{label}{optional}: struct")?;
            for child in fields.iter() {
                write_entry(
                    &child.name,
                    &child.element.data_type,
                    child.element.nullable,
                    indent + 2,
                    out,
                )?;
            }
        }
        DataTypeDef::List(elem) => {
            writeln!(out, "{pad}{label}{optional}: list")?;
            write_entry("[]", &elem.data_type, elem.nullable, indent + 2, out)?;
        }
        DataTypeDef::Array(elem, size) => {
            writeln!(out, "{pad}{label}{optional}: array[{size}]")?;
            write_entry("[]", &elem.data_type, elem.nullable, indent + 2, out)?;
        }
        DataTypeDef::Map { key, value } => {
            writeln!(out, "{pad}{label}{optional}: map")?;
            write_entry("key", &key.data_type, key.nullable, indent + 2, out)?;
            write_entry("value", &value.data_type, value.nullable, indent + 2, out)?;
        }
        DataTypeDef::Enum(name) => writeln!(out, "{pad}{label}{optional}: enum {name}")?,
        leaf => writeln!(out, "{pad}{label}{optional}: {}", leaf.type_name())?,
    }
    Ok(())
}
