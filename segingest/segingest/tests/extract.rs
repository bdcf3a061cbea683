use segingest::FieldExtractor;
use segingest_core::{DataTypeDef, ElementDef, FieldDef, FieldDefs, Value};

fn point_defs() -> FieldDefs {
    FieldDefs::new(vec![
        FieldDef::new("x", DataTypeDef::F32, false),
        FieldDef::new("valid", DataTypeDef::Bool, false),
    ])
}

fn radar_defs() -> FieldDefs {
    FieldDefs::new(vec![
        FieldDef::new("mdMonoTime", DataTypeDef::U64, false),
        FieldDef::new(
            "points",
            DataTypeDef::List(Box::new(ElementDef::new(DataTypeDef::Struct(point_defs()), false))),
            false,
        ),
        FieldDef::new(
            "calibration",
            DataTypeDef::Array(Box::new(ElementDef::new(DataTypeDef::F64, false)), 3),
            false,
        ),
        FieldDef::new(
            "tags",
            DataTypeDef::Map {
                key: Box::new(ElementDef::new(DataTypeDef::String, false)),
                value: Box::new(ElementDef::new(DataTypeDef::I32, false)),
            },
            false,
        ),
        FieldDef::new("status", DataTypeDef::Enum("Status".into()), false),
        FieldDef::new("blob", DataTypeDef::Bytes, true),
    ])
}

fn point(x: f32, valid: bool) -> Value {
    Value::Struct(vec![Value::F32(x), Value::Bool(valid)])
}

#[test]
fn walks_structs_lists_and_arrays() {
    let value = Value::Struct(vec![
        Value::U64(7),
        Value::List(vec![point(1.5, true), point(-2.0, false)]),
        Value::Array(vec![Value::F64(0.1), Value::F64(0.2), Value::F64(0.3)]),
        Value::Map(vec![(Value::string("a"), Value::I32(1))]),
        Value::Enum(3),
        Value::bytes([1, 2]),
    ]);
    let pairs = FieldExtractor::default().collect("radarState", &radar_defs(), &value);
    let names: Vec<_> = pairs.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "radarState.mdMonoTime",
            "radarState.points[0].x",
            "radarState.points[0].valid",
            "radarState.points[1].x",
            "radarState.points[1].valid",
            "radarState.calibration[0]",
            "radarState.calibration[1]",
            "radarState.calibration[2]",
            "radarState.status",
        ]
    );
    assert_eq!(pairs[2].1, 1.0);
    assert_eq!(pairs[4].1, 0.0);
    assert_eq!(pairs[8].1, 3.0);
}

#[test]
fn list_expansion_stops_at_cap() {
    let defs = FieldDefs::new(vec![FieldDef::new(
        "samples",
        DataTypeDef::List(Box::new(ElementDef::new(DataTypeDef::I16, false))),
        false,
    )]);
    let value = Value::Struct(vec![Value::List((0..1000).map(Value::I16).collect())]);

    let pairs = FieldExtractor::default().collect("mic", &defs, &value);
    assert_eq!(pairs.len(), 10);
    assert_eq!(pairs.last().unwrap().0, "mic.samples[9]");

    let pairs = FieldExtractor::new(3).collect("mic", &defs, &value);
    assert_eq!(pairs.len(), 3);
}

#[test]
fn nulls_are_skipped_silently() {
    let value = Value::Struct(vec![
        Value::Null,
        Value::Null,
        Value::Null,
        Value::Null,
        Value::Null,
        Value::Null,
    ]);
    let stats = FieldExtractor::default().extract("radarState", &radar_defs(), &value, |_, _| {
        panic!("nothing to emit")
    });
    assert_eq!(stats.emitted, 0);
    assert_eq!(stats.reflection_errors, 0);
}

#[test]
fn mismatched_fields_are_counted_and_skipped() {
    let value = Value::Struct(vec![
        Value::string("not a number"),
        Value::List(vec![point(1.0, true), Value::I32(4)]),
        Value::I32(0),
        Value::Null,
        Value::Enum(1),
        Value::Null,
    ]);
    let extractor = FieldExtractor::default();
    let mut names = Vec::new();
    let stats = extractor.extract("radarState", &radar_defs(), &value, |n, _| {
        names.push(n.to_string())
    });
    assert_eq!(stats.reflection_errors, 3);
    assert_eq!(
        names,
        vec![
            "radarState.points[0].x",
            "radarState.points[0].valid",
            "radarState.status",
        ]
    );
}

#[test]
fn root_width_mismatch_is_one_error() {
    let stats = FieldExtractor::default().extract(
        "radarState",
        &radar_defs(),
        &Value::Struct(vec![Value::U64(1)]),
        |_, _| {},
    );
    assert_eq!(stats.reflection_errors, 1);
    assert_eq!(stats.emitted, 0);
}
