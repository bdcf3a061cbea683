//! Raw CAN frames carried inside event payloads.

use segingest_core::{DataTypeDef, FieldDefs, Value, ValueTypeError};

/// One frame as logged: address, payload bytes and source bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame<'v> {
    pub address: u32,
    pub data: &'v [u8],
    pub bus: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameFields {
    width: usize,
    address: usize,
    dat: usize,
    src: Option<usize>,
}

impl FrameFields {
    fn from_defs(defs: &FieldDefs) -> Option<Self> {
        Some(Self {
            width: defs.len(),
            address: defs.position("address")?,
            dat: defs.position("dat")?,
            src: defs.position("src"),
        })
    }

    fn read<'v>(&self, value: &'v Value) -> Result<RawFrame<'v>, ValueTypeError> {
        let members = match value {
            Value::Struct(members) if members.len() == self.width => members,
            other => return Err(other.type_mismatch("CAN frame struct")),
        };
        let address = members[self.address]
            .try_i64()?
            .and_then(|a| u32::try_from(a).ok())
            .ok_or_else(|| members[self.address].type_mismatch("u32 address"))?;
        let data = members[self.dat].try_bytes()?.unwrap_or_default();
        let bus = match self.src {
            Some(i) => members[i].try_i64()?.and_then(|b| u8::try_from(b).ok()).unwrap_or(0),
            None => 0,
        };
        Ok(RawFrame { address, data, bus })
    }
}

/// Where frames live in a CAN topic's schema: either the message itself is a
/// frame, or one of its fields is a list of frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrameLayout {
    list_field: Option<usize>,
    frame: FrameFields,
}

impl CanFrameLayout {
    /// Locate the frame fields in `defs`; `None` if the schema carries no frames.
    pub fn from_defs(defs: &FieldDefs) -> Option<Self> {
        if let Some(frame) = FrameFields::from_defs(defs) {
            return Some(Self {
                list_field: None,
                frame,
            });
        }
        defs.iter().enumerate().find_map(|(i, def)| match def.data_type() {
            DataTypeDef::List(element) | DataTypeDef::Array(element, _) => match &element.data_type {
                DataTypeDef::Struct(inner) => Some(Self {
                    list_field: Some(i),
                    frame: FrameFields::from_defs(inner)?,
                }),
                _ => None,
            },
            _ => None,
        })
    }

    /// Every frame in `value`. Malformed entries come back as errors and do
    /// not stop the rest.
    pub fn frames<'v>(&self, value: &'v Value) -> Vec<Result<RawFrame<'v>, ValueTypeError>> {
        let Some(list_field) = self.list_field else {
            return vec![self.frame.read(value)];
        };
        let items = match value {
            Value::Struct(members) => match members.get(list_field).map(Value::try_elements) {
                Some(Ok(items)) => items,
                Some(Err(e)) => return vec![Err(e)],
                None => return vec![Err(value.type_mismatch("CAN frame list"))],
            },
            other => return vec![Err(other.type_mismatch("struct"))],
        };
        items.iter().map(|item| self.frame.read(item)).collect()
    }
}

#[cfg(test)]
mod tests {
    use segingest_core::{ElementDef, FieldDef};

    use super::*;

    fn frame_defs() -> FieldDefs {
        FieldDefs::new(vec![
            FieldDef::new("address", DataTypeDef::U32, false),
            FieldDef::new("busTime", DataTypeDef::U32, false),
            FieldDef::new("dat", DataTypeDef::Bytes, false),
            FieldDef::new("src", DataTypeDef::U32, false),
        ])
    }

    fn frame(address: u32, dat: &[u8], src: u32) -> Value {
        Value::Struct(vec![
            Value::U32(address),
            Value::U32(0),
            Value::bytes(dat),
            Value::U32(src),
        ])
    }

    #[test]
    fn reads_frames_from_list_field() {
        let defs = FieldDefs::new(vec![FieldDef::new(
            "frames",
            DataTypeDef::List(Box::new(ElementDef::new(
                DataTypeDef::Struct(frame_defs()),
                false,
            ))),
            false,
        )]);
        let layout = CanFrameLayout::from_defs(&defs).unwrap();
        let value = Value::Struct(vec![Value::List(vec![
            frame(0x1a4, &[1, 2], 0),
            frame(0x400, &[9], 2),
        ])]);
        let frames: Vec<_> = layout.frames(&value).into_iter().map(Result::unwrap).collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].address, 0x1a4);
        assert_eq!(frames[0].data, &[1, 2]);
        assert_eq!(frames[1].bus, 2);
    }

    #[test]
    fn message_itself_can_be_a_frame() {
        let layout = CanFrameLayout::from_defs(&frame_defs()).unwrap();
        let value = frame(7, &[0xff], 1);
        let frames = layout.frames(&value);
        assert_eq!(frames[0].as_ref().unwrap().address, 7);
    }

    #[test]
    fn schema_without_frames() {
        let defs = FieldDefs::new(vec![FieldDef::new("vEgo", DataTypeDef::F32, false)]);
        assert!(CanFrameLayout::from_defs(&defs).is_none());
    }

    #[test]
    fn malformed_entry_is_reported() {
        let layout = CanFrameLayout::from_defs(&frame_defs()).unwrap();
        let bad = Value::Struct(vec![Value::string("x"), Value::U32(0), Value::Null, Value::U32(0)]);
        assert!(layout.frames(&bad)[0].is_err());
    }
}
