//! Synthetic segments: protobuf schemas built with `prost-types`, payloads
//! with `prost-reflect`, containers with `mcap::Writer`.

#![allow(dead_code)]

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    io::BufWriter,
    path::{Path, PathBuf},
};

use chrono::{DateTime, TimeZone, Utc};
use prost::Message;
use prost_reflect::{DescriptorPool, DynamicMessage, Value as ProtoValue};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet,
    field_descriptor_proto::{Label, Type},
};
use segingest::{DecoderRegistry, EventLogFile, catalog::seed_from_log};
use segingest_store::Store;

pub const DEVICE: &str = "a2a0ccea32023010";
pub const ROUTE: &str = "0000002f";
pub const SECOND: u64 = 1_000_000_000;

pub const BUS_DBC: &str = r#"
BO_ 420 WHEEL_SPEEDS: 8 ABS
 SG_ WHEEL_SPEED_FL : 7|16@0+ (0.01,0) [0|250] "kph" XXX
 SG_ WHEEL_SPEED_FR : 23|16@0+ (0.01,0) [0|250] "kph" XXX

BO_ 464 STEERING: 8 EPS
 SG_ STEER_ANGLE : 0|16@1- (0.1,0) [-800|800] "deg" XXX
 SG_ LKAS_ON : 16|1@1+ (1,0) [0|1] "" XXX

CM_ SG_ 464 STEER_ANGLE "Steering wheel angle";
"#;

fn field(name: &str, number: i32, typ: Type, label: Label) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        r#type: Some(typ.into()),
        label: Some(label.into()),
        ..Default::default()
    }
}

fn scalar(name: &str, number: i32, typ: Type) -> FieldDescriptorProto {
    field(name, number, typ, Label::Optional)
}

fn typed(name: &str, number: i32, typ: Type, type_name: &str, label: Label) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_string()),
        ..field(name, number, typ, label)
    }
}

fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields,
        ..Default::default()
    }
}

/// Serialized descriptor set covering every topic the fixtures write.
pub fn log_schema() -> Vec<u8> {
    let gear = EnumDescriptorProto {
        name: Some("GearShifter".to_string()),
        value: [("unknown", 0), ("park", 1), ("drive", 2)]
            .iter()
            .map(|(n, v)| EnumValueDescriptorProto {
                name: Some(n.to_string()),
                number: Some(*v),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    };
    let messages = vec![
        message(
            "WheelSpeeds",
            vec![scalar("fl", 1, Type::Float), scalar("fr", 2, Type::Float)],
        ),
        message(
            "CarState",
            vec![
                scalar("vEgo", 1, Type::Float),
                scalar("brakePressed", 2, Type::Bool),
                typed("gearShifter", 3, Type::Enum, ".GearShifter", Label::Optional),
                typed("wheelSpeeds", 4, Type::Message, ".WheelSpeeds", Label::Optional),
                scalar("carName", 5, Type::String),
            ],
        ),
        message(
            "DeviceState",
            vec![
                field("cpuTempC", 1, Type::Float, Label::Repeated),
                scalar("freeSpacePercent", 2, Type::Float),
            ],
        ),
        message(
            "LiveLocationKalman",
            vec![
                scalar("unixTimestampMillis", 1, Type::Int64),
                scalar("gpsOK", 2, Type::Bool),
            ],
        ),
        message("InitData", vec![scalar("wallTimeNanos", 1, Type::Uint64)]),
        message(
            "CanFrame",
            vec![
                scalar("address", 1, Type::Uint32),
                scalar("busTime", 2, Type::Uint32),
                scalar("dat", 3, Type::Bytes),
                scalar("src", 4, Type::Uint32),
            ],
        ),
        message(
            "CanData",
            vec![typed("frames", 1, Type::Message, ".CanFrame", Label::Repeated)],
        ),
        message(
            "EncodeIndex",
            vec![
                scalar("frameId", 1, Type::Uint32),
                scalar("timestampSof", 2, Type::Uint64),
            ],
        ),
        message("LogMessage", vec![scalar("text", 1, Type::String)]),
    ];
    FileDescriptorSet {
        file: vec![FileDescriptorProto {
            name: Some("log.proto".to_string()),
            message_type: messages,
            enum_type: vec![gear],
            syntax: Some("proto3".to_string()),
            ..Default::default()
        }],
    }
    .encode_to_vec()
}

fn schema_for(topic: &str) -> &'static str {
    match topic {
        "carState" => "CarState",
        "deviceState" => "DeviceState",
        "liveLocationKalman" => "LiveLocationKalman",
        "initData" => "InitData",
        "can" => "CanData",
        "roadEncodeIdx" | "driverEncodeIdx" => "EncodeIndex",
        "logMessage" | "errorLogMessage" => "LogMessage",
        other => panic!("no fixture schema for {other}"),
    }
}

enum Payload {
    Encoded(Vec<u8>),
    Schemaless(Vec<u8>),
}

/// Builds one segment's event log.
pub struct SegmentBuilder {
    fds: Vec<u8>,
    pool: DescriptorPool,
    events: Vec<(String, u64, Payload)>,
}

impl Default for SegmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentBuilder {
    pub fn new() -> Self {
        let fds = log_schema();
        let pool = DescriptorPool::decode(fds.as_slice()).unwrap();
        Self {
            fds,
            pool,
            events: Vec::new(),
        }
    }

    fn dynamic(&self, topic: &str) -> DynamicMessage {
        DynamicMessage::new(self.pool.get_message_by_name(schema_for(topic)).unwrap())
    }

    fn push(mut self, topic: &str, log_time: u64, msg: DynamicMessage) -> Self {
        self.events
            .push((topic.to_string(), log_time, Payload::Encoded(msg.encode_to_vec())));
        self
    }

    pub fn car_state(self, log_time: u64, v_ego: f32, brake: bool) -> Self {
        let mut wheels = DynamicMessage::new(self.pool.get_message_by_name("WheelSpeeds").unwrap());
        wheels.set_field_by_name("fl", ProtoValue::F32(v_ego));
        wheels.set_field_by_name("fr", ProtoValue::F32(v_ego + 0.5));
        let mut msg = self.dynamic("carState");
        msg.set_field_by_name("vEgo", ProtoValue::F32(v_ego));
        msg.set_field_by_name("brakePressed", ProtoValue::Bool(brake));
        msg.set_field_by_name("gearShifter", ProtoValue::EnumNumber(2));
        msg.set_field_by_name("wheelSpeeds", ProtoValue::Message(wheels));
        msg.set_field_by_name("carName", ProtoValue::String("mock".to_string()));
        self.push("carState", log_time, msg)
    }

    pub fn device_state(self, log_time: u64, temps: usize) -> Self {
        let mut msg = self.dynamic("deviceState");
        msg.set_field_by_name(
            "cpuTempC",
            ProtoValue::List((0..temps).map(|i| ProtoValue::F32(40.0 + i as f32)).collect()),
        );
        msg.set_field_by_name("freeSpacePercent", ProtoValue::F32(73.0));
        self.push("deviceState", log_time, msg)
    }

    pub fn fix(self, log_time: u64, at: DateTime<Utc>, ok: bool) -> Self {
        let mut msg = self.dynamic("liveLocationKalman");
        msg.set_field_by_name("unixTimestampMillis", ProtoValue::I64(at.timestamp_millis()));
        msg.set_field_by_name("gpsOK", ProtoValue::Bool(ok));
        self.push("liveLocationKalman", log_time, msg)
    }

    pub fn init_data(self, log_time: u64, wall_time_nanos: u64) -> Self {
        let mut msg = self.dynamic("initData");
        msg.set_field_by_name("wallTimeNanos", ProtoValue::U64(wall_time_nanos));
        self.push("initData", log_time, msg)
    }

    pub fn can(self, log_time: u64, frames: &[(u32, Vec<u8>, u32)]) -> Self {
        let frame_desc = self.pool.get_message_by_name("CanFrame").unwrap();
        let list = frames
            .iter()
            .map(|(address, dat, src)| {
                let mut frame = DynamicMessage::new(frame_desc.clone());
                frame.set_field_by_name("address", ProtoValue::U32(*address));
                frame.set_field_by_name("dat", ProtoValue::Bytes(bytes::Bytes::from(dat.clone())));
                frame.set_field_by_name("src", ProtoValue::U32(*src));
                ProtoValue::Message(frame)
            })
            .collect();
        let mut msg = self.dynamic("can");
        msg.set_field_by_name("frames", ProtoValue::List(list));
        self.push("can", log_time, msg)
    }

    pub fn encode_idx(self, topic: &str, log_time: u64, frame_id: u32, sof: u64) -> Self {
        let mut msg = self.dynamic(topic);
        msg.set_field_by_name("frameId", ProtoValue::U32(frame_id));
        msg.set_field_by_name("timestampSof", ProtoValue::U64(sof));
        self.push(topic, log_time, msg)
    }

    pub fn log_message(self, topic: &str, log_time: u64, text: &str) -> Self {
        let mut msg = self.dynamic(topic);
        msg.set_field_by_name("text", ProtoValue::String(text.to_string()));
        self.push(topic, log_time, msg)
    }

    /// Raw bytes on a schema-bearing topic (e.g. a corrupt payload).
    pub fn raw(mut self, topic: &str, log_time: u64, data: Vec<u8>) -> Self {
        self.events
            .push((topic.to_string(), log_time, Payload::Encoded(data)));
        self
    }

    /// Bytes on a channel that carries no schema.
    pub fn schemaless(mut self, topic: &str, log_time: u64, data: Vec<u8>) -> Self {
        self.events
            .push((topic.to_string(), log_time, Payload::Schemaless(data)));
        self
    }

    /// Write the event log as `<dir>/rlog`.
    pub fn write(&self, dir: &Path) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join("rlog");
        let file = BufWriter::new(fs::File::create(&path).unwrap());
        let mut writer = mcap::Writer::new(file).unwrap();
        let mut schemas: HashMap<&str, u16> = HashMap::new();
        let mut channels: HashMap<String, u16> = HashMap::new();
        let metadata = BTreeMap::new();

        for (sequence, (topic, log_time, payload)) in self.events.iter().enumerate() {
            let (data, schemaless) = match payload {
                Payload::Encoded(data) => (data, false),
                Payload::Schemaless(data) => (data, true),
            };
            let channel_id = match channels.get(topic) {
                Some(id) => *id,
                None => {
                    let schema_id = if schemaless {
                        0
                    } else {
                        let name = schema_for(topic);
                        match schemas.get(name) {
                            Some(id) => *id,
                            None => {
                                let id = writer.add_schema(name, "protobuf", &self.fds).unwrap();
                                schemas.insert(name, id);
                                id
                            }
                        }
                    };
                    let id = writer
                        .add_channel(schema_id, topic, "protobuf", &metadata)
                        .unwrap();
                    channels.insert(topic.clone(), id);
                    id
                }
            };
            writer
                .write_to_known_channel(
                    &mcap::records::MessageHeader {
                        channel_id,
                        sequence: sequence as u32,
                        log_time: *log_time,
                        publish_time: *log_time,
                    },
                    data,
                )
                .unwrap();
        }
        writer.finish().unwrap();
        path
    }
}

pub fn segment_dir(root: &Path, index: u32) -> PathBuf {
    root.join(format!("{DEVICE}--{ROUTE}--{index}"))
}

pub fn route_id() -> String {
    format!("{DEVICE}--{ROUTE}")
}

pub fn noon(minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, second).unwrap()
}

/// Seed the catalog from a fixture log's schemas.
pub fn register_types(store: &mut Store, log_path: &Path) -> usize {
    let file = EventLogFile::open(log_path).unwrap();
    let log = file.read().unwrap();
    let seed = seed_from_log(&log, &DecoderRegistry::with_default_decoders());
    store.register_all(&seed.entries).unwrap()
}

/// A log carrying every fixture topic, used only to seed catalogs.
pub fn seed_catalog(store: &mut Store, scratch: &Path) {
    let path = SegmentBuilder::new()
        .car_state(SECOND, 1.0, false)
        .device_state(SECOND, 1)
        .fix(SECOND, noon(0, 0), true)
        .write(&scratch.join("seed"));
    register_types(store, &path);
}
