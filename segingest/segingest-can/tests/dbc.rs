use segingest_can::{BusDescription, ByteOrder, CanDecoder, DbcError, Multiplex, signal_key};

const BUS: &str = r#"
VERSION ""

NS_ :
    CM_
    BA_DEF_

BS_:

BU_: EON CAM

BO_ 420 WHEEL_SPEEDS: 8 CAM
 SG_ WHEEL_SPEED_FL : 7|15@0+ (0.01,0) [0|250] "kph" EON
 SG_ WHEEL_SPEED_FR : 8|15@0+ (0.01,0) [0|250] "kph" EON

BO_ 464 STEERING: 8 CAM
 SG_ STEER_ANGLE : 0|16@1- (0.1,0) [-3276.8|3276.7] "deg" EON
 SG_ STEER_RATE : 16|12@1- (1,0) [-2048|2047] "deg/s" EON
 SG_ GEAR : 28|3@1+ (1,0) [0|7] "" EON
 SG_ BRAKE_PRESSED : 31|1@1+ (1,0) [0|1] "" EON

BO_ 2147484672 DIAG: 4 EON
 SG_ MUX M : 0|2@1+ (1,0) [0|3] "" CAM
 SG_ TEMP m0 : 8|8@1- (0.5,-40) [-40|87.5] "degC" CAM
 SG_ VOLT m1 : 8|16@1+ (0.001,0) [0|65.535] "V" CAM

CM_ SG_ 464 STEER_ANGLE "Steering wheel angle,
positive to the left";
CM_ BO_ 420 "Wheel speeds from the ABS module";
BA_DEF_ SG_ "GenSigStartValue" INT 0 10000;
VAL_ 464 GEAR 0 "P" 1 "R" 2 "N" 3 "D" ;
"#;

fn decoder() -> CanDecoder {
    CanDecoder::new(BusDescription::parse(BUS).unwrap())
}

#[test]
fn parses_messages_signals_and_metadata() {
    let bus = BusDescription::parse(BUS).unwrap();
    assert_eq!(bus.len(), 3);

    let steering = bus.message(464).unwrap();
    assert_eq!(steering.name, "STEERING");
    assert_eq!(steering.dlc, 8);
    assert_eq!(steering.transmitter.as_deref(), Some("CAM"));
    let angle = steering.signal("STEER_ANGLE").unwrap();
    assert_eq!(angle.byte_order, ByteOrder::LittleEndian);
    assert!(angle.signed);
    assert_eq!(angle.unit, "deg");
    assert_eq!(
        angle.comment.as_deref(),
        Some("Steering wheel angle,\npositive to the left")
    );
    let gear = steering.signal("GEAR").unwrap();
    assert_eq!(gear.value_names.get(&3).map(String::as_str), Some("D"));

    let wheels = bus.message(420).unwrap();
    assert_eq!(
        wheels.comment.as_deref(),
        Some("Wheel speeds from the ABS module")
    );
    assert_eq!(
        wheels.signal("WHEEL_SPEED_FL").unwrap().byte_order,
        ByteOrder::BigEndian
    );

    let diag = bus.message(0x400).unwrap();
    assert_eq!(
        diag.signal("MUX").unwrap().multiplex,
        Some(Multiplex::Multiplexor)
    );
    assert_eq!(
        diag.signal("VOLT").unwrap().multiplex,
        Some(Multiplex::Multiplexed(1))
    );
}

#[test]
fn malformed_signal_reports_line() {
    let text = "BO_ 1 A: 8 X\n SG_ BROKEN : 0|8@2+ (1,0) [0|1] \"\" X\n";
    match BusDescription::parse(text) {
        Err(DbcError::Parse { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn out_of_range_bit_layouts_are_rejected() {
    for (text, line) in [
        ("BO_ 100 M: 8 X\n SG_ S : 65535|8@1+ (1,0) [0|0] \"\" X\n", 2),
        ("BO_ 100 M: 8 X\n SG_ S : 70000|16@0+ (1,0) [0|0] \"\" X\n", 2),
        ("BO_ 100 M: 8 X\n\n SG_ S : 0|0@1+ (1,0) [0|0] \"\" X\n", 3),
        ("BO_ 100 M: 8 X\n SG_ S : 0|65@1+ (1,0) [0|0] \"\" X\n", 2),
    ] {
        match BusDescription::parse(text) {
            Err(DbcError::Parse { line: l, .. }) => assert_eq!(l, line, "{text}"),
            other => panic!("expected parse error for {text:?}, got {other:?}"),
        }
    }
}

#[test]
fn widest_frame_signals_decode() {
    let text = "BO_ 100 M: 64 X\n SG_ LAST : 504|8@1+ (1,0) [0|255] \"\" X\n";
    let decoder = CanDecoder::new(BusDescription::parse(text).unwrap());
    let mut payload = [0u8; 64];
    payload[63] = 0x2A;
    let signals = decoder.decode(100, &payload);
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].value, 42.0);
}

#[test]
fn signal_before_message_is_rejected() {
    let text = " SG_ LOST : 0|8@1+ (1,0) [0|1] \"\" X\n";
    assert!(matches!(
        BusDescription::parse(text),
        Err(DbcError::Parse { line: 1, .. })
    ));
}

#[test]
fn decode_applies_scale_offset_and_sign() {
    let decoder = decoder();
    let payload = decoder
        .encode(
            464,
            &[
                ("STEER_ANGLE", -12.5),
                ("STEER_RATE", -3.0),
                ("GEAR", 3.0),
                ("BRAKE_PRESSED", 1.0),
            ],
        )
        .unwrap();
    let values: Vec<(String, f64)> = decoder
        .decode(464, &payload)
        .iter()
        .map(|s| (s.name.to_string(), s.value))
        .collect();

    assert_eq!(values.len(), 4);
    assert_eq!(values[0].0, "CAN_0x1D0_STEER_ANGLE");
    assert!((values[0].1 - -12.5).abs() < 1e-9);
    assert_eq!(values[1], ("CAN_0x1D0_STEER_RATE".to_string(), -3.0));
    assert_eq!(values[2], ("CAN_0x1D0_GEAR".to_string(), 3.0));
    assert_eq!(values[3], ("CAN_0x1D0_BRAKE_PRESSED".to_string(), 1.0));
}

#[test]
fn motorola_signals_round_trip() {
    let decoder = decoder();
    let payload = decoder
        .encode(420, &[("WHEEL_SPEED_FL", 88.31), ("WHEEL_SPEED_FR", 12.0)])
        .unwrap();
    assert_eq!(payload.len(), 8);
    let decoded = decoder.decode(420, &payload);
    assert_eq!(decoded.len(), 2);
    assert!((decoded[0].value - 88.31).abs() < 1e-9);
    assert!((decoded[1].value - 12.0).abs() < 1e-9);
}

#[test]
fn multiplexed_signals_follow_selector() {
    let decoder = decoder();
    let payload = decoder.encode(0x400, &[("MUX", 1.0), ("VOLT", 12.345)]).unwrap();
    let names: Vec<&str> = decoder.decode(0x400, &payload).iter().map(|s| s.name).collect();
    assert_eq!(names, ["CAN_0x400_MUX", "CAN_0x400_VOLT"]);

    let payload = decoder.encode(0x400, &[("MUX", 0.0), ("TEMP", -20.0)]).unwrap();
    let decoded = decoder.decode(0x400, &payload);
    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded[1].name, "CAN_0x400_TEMP");
    assert_eq!(decoded[1].value, -20.0);
}

#[test]
fn unknown_address_decodes_to_nothing() {
    assert!(decoder().decode(0x7FF, &[0u8; 8]).is_empty());
}

#[test]
fn short_frame_skips_signals_that_do_not_fit() {
    let decoder = decoder();
    // only STEER_ANGLE fits in two bytes
    let decoded = decoder.decode(464, &[0x0A, 0x00]);
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].name, "CAN_0x1D0_STEER_ANGLE");
    assert!((decoded[0].value - 1.0).abs() < 1e-9);
}

#[test]
fn encode_rejects_unknown_names() {
    let decoder = decoder();
    assert!(matches!(
        decoder.encode(1, &[]),
        Err(DbcError::UnknownMessage(1))
    ));
    assert!(matches!(
        decoder.encode(464, &[("NOPE", 1.0)]),
        Err(DbcError::UnknownSignal { .. })
    ));
}

#[test]
fn signal_key_pads_address() {
    assert_eq!(signal_key(0x25, "X"), "CAN_0x025_X");
    assert_eq!(signal_key(0x18DAF1, "Y"), "CAN_0x18DAF1_Y");
}
