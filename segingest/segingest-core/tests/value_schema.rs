use segingest_core::{
    DataTypeDef, ElementDef, EncodingKey, FieldDef, FieldDefs, MessageEncoding, SchemaEncoding,
    Value, format_field_defs,
};

fn pose_defs() -> FieldDefs {
    FieldDefs::new(vec![
        FieldDef::new("x", DataTypeDef::F64, false),
        FieldDef::new("valid", DataTypeDef::Bool, false),
        FieldDef::new("gear", DataTypeDef::Enum("Gear".into()), false),
    ])
}

#[test]
fn numeric_view_coerces_bool_and_enum() {
    assert_eq!(Value::Bool(true).as_f64(), Some(1.0));
    assert_eq!(Value::Bool(false).as_f64(), Some(0.0));
    assert_eq!(Value::Enum(3).as_f64(), Some(3.0));
    assert_eq!(Value::U64(7).as_f64(), Some(7.0));
    assert_eq!(Value::F32(1.5).as_f64(), Some(1.5));
}

#[test]
fn numeric_view_rejects_text_and_composites() {
    assert_eq!(Value::string("abc").as_f64(), None);
    assert_eq!(Value::bytes([1u8, 2]).as_f64(), None);
    assert_eq!(Value::Null.as_f64(), None);
    assert_eq!(Value::List(vec![Value::I32(1)]).as_f64(), None);
}

#[test]
fn try_i64_widens_integers_and_reports_mismatch() {
    assert_eq!(Value::U32(9).try_i64().unwrap(), Some(9));
    assert_eq!(Value::Null.try_i64().unwrap(), None);
    let err = Value::F64(1.0).try_i64().unwrap_err();
    assert_eq!(err.actual, "F64");
    assert!(Value::U64(u64::MAX).try_i64().is_err());
}

#[test]
fn field_lookup_uses_definitions() {
    let defs = pose_defs();
    let value = Value::Struct(vec![Value::F64(2.0), Value::Bool(true), Value::Enum(1)]);
    assert_eq!(value.field(&defs, "gear"), Some(&Value::Enum(1)));
    assert_eq!(value.field(&defs, "missing"), None);

    let short = Value::Struct(vec![Value::F64(2.0)]);
    assert_eq!(short.field(&defs, "x"), None);
}

#[test]
fn try_elements_treats_null_as_empty() {
    assert!(Value::Null.try_elements().unwrap().is_empty());
    assert_eq!(Value::Array(vec![Value::I8(1)]).try_elements().unwrap().len(), 1);
    assert!(Value::I8(1).try_elements().is_err());
}

#[test]
fn numeric_types_are_classified() {
    assert!(DataTypeDef::Enum("E".into()).is_numeric());
    assert!(DataTypeDef::Bool.is_numeric());
    assert!(!DataTypeDef::String.is_numeric());
    assert!(!DataTypeDef::Struct(FieldDefs::default()).is_numeric());
}

#[test]
fn format_renders_nested_tree() {
    let defs = vec![
        FieldDef::new("speed", DataTypeDef::F32, false),
        FieldDef::new(
            "wheels",
            DataTypeDef::List(Box::new(ElementDef::new(
                DataTypeDef::Struct(pose_defs()),
                false,
            ))),
            false,
        ),
        FieldDef::new("note", DataTypeDef::String, true),
    ];
    let text = format_field_defs(&defs).unwrap();
    let expected = "\
speed: f32
wheels: list
  []: struct
    x: f64
    valid: bool
    gear: enum Gear
note?: string
";
    assert_eq!(text, expected);
    assert_eq!(format_field_defs(&FieldDefs::new(defs)).unwrap(), expected);
}

#[test]
fn encodings_parse_known_and_unknown_names() {
    assert_eq!(SchemaEncoding::from("protobuf"), SchemaEncoding::Protobuf);
    assert_eq!(SchemaEncoding::from(""), SchemaEncoding::None);
    assert_eq!(MessageEncoding::from("capnp"), MessageEncoding::Unknown("capnp".into()));
    assert_eq!(MessageEncoding::Json.to_string(), "json");

    let key = EncodingKey::from_strs("protobuf", "protobuf");
    assert_eq!(key.schema_encoding, SchemaEncoding::Protobuf);
    assert_eq!(key.message_encoding, MessageEncoding::Protobuf);
}
