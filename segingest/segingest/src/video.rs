//! Frame-index events to per-camera capture times.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    path::Path,
};

use segingest_core::{FieldDefs, Value, ValueTypeError};

pub const FRAME_FIELD: &str = "frameId";
pub const CAPTURE_TIME_FIELD: &str = "timestampSof";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Camera {
    Road,
    WideRoad,
    Driver,
    QRoad,
}

impl Camera {
    pub const ALL: [Camera; 4] = [Camera::Road, Camera::WideRoad, Camera::Driver, Camera::QRoad];

    /// Stored camera name.
    pub fn as_str(self) -> &'static str {
        match self {
            Camera::Road => "fcamera",
            Camera::WideRoad => "ecamera",
            Camera::Driver => "dcamera",
            Camera::QRoad => "qcamera",
        }
    }

    pub fn media_file(self) -> &'static str {
        match self {
            Camera::Road => "fcamera.hevc",
            Camera::WideRoad => "ecamera.hevc",
            Camera::Driver => "dcamera.hevc",
            Camera::QRoad => "qcamera.ts",
        }
    }

    /// Topic of the encode-index events for this camera.
    pub fn index_topic(self) -> &'static str {
        match self {
            Camera::Road => "roadEncodeIdx",
            Camera::WideRoad => "wideRoadEncodeIdx",
            Camera::Driver => "driverEncodeIdx",
            Camera::QRoad => "qRoadEncodeIdx",
        }
    }

    pub fn default_topics() -> Vec<(String, Camera)> {
        Camera::ALL
            .iter()
            .map(|c| (c.index_topic().to_string(), *c))
            .collect()
    }
}

impl fmt::Display for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media files present in a segment directory, keyed by camera name.
pub fn media_paths(dir: &Path) -> BTreeMap<String, String> {
    Camera::ALL
        .iter()
        .filter_map(|camera| {
            let path = dir.join(camera.media_file());
            path.is_file()
                .then(|| (camera.as_str().to_string(), path.display().to_string()))
        })
        .collect()
}

/// Collects `(frame number, capture time)` per camera. A frame seen twice
/// keeps its last capture time.
#[derive(Debug, Default)]
pub struct VideoCorrelator {
    topics: HashMap<String, Camera>,
    frames: BTreeMap<Camera, BTreeMap<i64, i64>>,
}

impl VideoCorrelator {
    pub fn new(topics: &[(String, Camera)]) -> Self {
        Self {
            topics: topics.iter().cloned().collect(),
            frames: BTreeMap::new(),
        }
    }

    pub fn camera_for(&self, topic: &str) -> Option<Camera> {
        self.topics.get(topic).copied()
    }

    /// Record the frame carried by one encode-index event. Returns `false`
    /// when the event has no frame number or capture time.
    pub fn observe(
        &mut self,
        camera: Camera,
        defs: &FieldDefs,
        value: &Value,
    ) -> Result<bool, ValueTypeError> {
        let frame = value.field(defs, FRAME_FIELD).map(Value::try_i64).transpose()?.flatten();
        let time = value
            .field(defs, CAPTURE_TIME_FIELD)
            .map(Value::try_i64)
            .transpose()?
            .flatten();
        let (Some(frame), Some(time)) = (frame, time) else {
            return Ok(false);
        };
        self.frames.entry(camera).or_default().insert(frame, time);
        Ok(true)
    }

    pub fn counts(&self) -> BTreeMap<Camera, u64> {
        self.frames
            .iter()
            .map(|(camera, frames)| (*camera, frames.len() as u64))
            .collect()
    }

    /// Frames per camera, ordered by frame number.
    pub fn frames(&self) -> impl Iterator<Item = (Camera, i64, i64)> + '_ {
        self.frames.iter().flat_map(|(camera, frames)| {
            frames.iter().map(move |(frame, time)| (*camera, *frame, *time))
        })
    }
}
