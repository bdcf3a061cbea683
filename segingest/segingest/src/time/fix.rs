use std::path::Path;

use chrono::{DateTime, Utc};
use segingest_core::Value;

use crate::{
    decoders::{ChannelDecoders, DecoderRegistry},
    error::ReaderError,
    reader::{EventLog, EventLogFile},
};

/// Where to look for positioning fixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixSource {
    pub topic: String,
    /// Integer field holding Unix time in milliseconds.
    pub timestamp_field: String,
    /// Boolean field that must be true when the schema declares it.
    pub valid_field: Option<String>,
}

impl FixSource {
    pub fn new(topic: &str, timestamp_field: &str, valid_field: Option<&str>) -> Self {
        Self {
            topic: topic.to_string(),
            timestamp_field: timestamp_field.to_string(),
            valid_field: valid_field.map(str::to_string),
        }
    }

    /// `liveLocationKalman` first, then `gpsLocationExternal`.
    pub fn defaults() -> Vec<FixSource> {
        vec![
            FixSource::new("liveLocationKalman", "unixTimestampMillis", Some("gpsOK")),
            FixSource::new("gpsLocationExternal", "unixTimestampMillis", Some("hasFix")),
        ]
    }
}

/// A valid fix and the monotonic time of the event that carried it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fix {
    pub timestamp: DateTime<Utc>,
    pub log_time: u64,
}

/// Finds the first valid fix in an event log.
#[derive(Clone)]
pub struct FixLocator {
    sources: Vec<FixSource>,
    registry: DecoderRegistry,
}

impl FixLocator {
    pub fn new(sources: Vec<FixSource>, registry: DecoderRegistry) -> Self {
        Self { sources, registry }
    }

    pub fn sources(&self) -> &[FixSource] {
        &self.sources
    }

    /// First valid fix of the highest-priority source that has one.
    pub fn find(&self, log: &EventLog<'_>) -> Option<Fix> {
        let mut decoders = ChannelDecoders::new(&self.registry);
        self.sources
            .iter()
            .find_map(|source| first_fix(source, log, &mut decoders))
    }

    /// Read the log at `path` and return its first fix with the log's first
    /// monotonic time.
    pub fn find_in_file(&self, path: &Path) -> Result<Option<(Fix, u64)>, ReaderError> {
        let file = EventLogFile::open(path)?;
        let log = file.read()?;
        let Some(first) = log.first_log_time() else {
            return Ok(None);
        };
        Ok(self.find(&log).map(|fix| (fix, first)))
    }
}

fn first_fix(
    source: &FixSource,
    log: &EventLog<'_>,
    decoders: &mut ChannelDecoders<'_>,
) -> Option<Fix> {
    for event in log.events().iter().filter(|e| e.topic() == source.topic) {
        let Some(decoder) = decoders.get(&event.channel) else {
            return None;
        };
        let value = match decoder.decode(&event.data) {
            Ok(value) => value,
            Err(e) => {
                log::debug!("undecodable {} event: {e}", source.topic);
                continue;
            }
        };
        let defs = decoder.field_defs();
        if let Some(flag) = &source.valid_field {
            if defs.get(flag).is_some() && !is_true(value.field(defs, flag)) {
                continue;
            }
        }
        let millis = value
            .field(defs, &source.timestamp_field)
            .and_then(|v| v.try_i64().ok().flatten())
            .filter(|ms| *ms > 0);
        if let Some(timestamp) = millis.and_then(DateTime::from_timestamp_millis) {
            return Some(Fix {
                timestamp,
                log_time: event.log_time,
            });
        }
    }
    None
}

fn is_true(value: Option<&Value>) -> bool {
    matches!(value.map(Value::try_bool), Some(Ok(Some(true))))
}
