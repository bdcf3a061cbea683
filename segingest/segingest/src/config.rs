//! Import configuration.

use std::path::PathBuf;

use chrono::TimeDelta;
use segingest_store::{LogKind, WriterOptions};

use crate::{
    extract::DEFAULT_ARRAY_CAP,
    time::{DEFAULT_SEGMENT_SECONDS, FixSource, WallClockProbe},
    video::Camera,
};

/// Events processed between progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 10_000;

#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub array_cap: usize,
    pub writer: WriterOptions,
    pub segment_duration: TimeDelta,
    pub fix_sources: Vec<FixSource>,
    pub wall_clock: WallClockProbe,
    pub can_topics: Vec<String>,
    pub camera_topics: Vec<(String, Camera)>,
    pub log_topics: Vec<(String, LogKind)>,
    /// File names tried, in order, for a segment's event log.
    pub event_log_names: Vec<String>,
    pub bus_description: Option<PathBuf>,
    pub progress_interval: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            array_cap: DEFAULT_ARRAY_CAP,
            writer: WriterOptions::default(),
            segment_duration: TimeDelta::seconds(DEFAULT_SEGMENT_SECONDS),
            fix_sources: FixSource::defaults(),
            wall_clock: WallClockProbe::default(),
            can_topics: vec!["can".to_string()],
            camera_topics: Camera::default_topics(),
            log_topics: vec![
                ("logMessage".to_string(), LogKind::Log),
                ("errorLogMessage".to_string(), LogKind::Error),
            ],
            event_log_names: vec!["rlog".to_string(), "rlog.mcap".to_string()],
            bus_description: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl ImportConfig {
    pub fn builder() -> ImportConfigBuilder {
        ImportConfigBuilder::default()
    }

    pub fn log_kind(&self, topic: &str) -> Option<LogKind> {
        self.log_topics
            .iter()
            .find(|(t, _)| t == topic)
            .map(|(_, kind)| *kind)
    }

    pub fn is_can_topic(&self, topic: &str) -> bool {
        self.can_topics.iter().any(|t| t == topic)
    }
}

/// Builder for [`ImportConfig`].
#[derive(Debug, Default)]
pub struct ImportConfigBuilder {
    config: ImportConfig,
}

impl ImportConfigBuilder {
    pub fn with_array_cap(mut self, array_cap: usize) -> Self {
        self.config.array_cap = array_cap;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.config.writer.batch_size = batch_size;
        self
    }

    pub fn with_log_batch_size(mut self, log_batch_size: usize) -> Self {
        self.config.writer.log_batch_size = log_batch_size;
        self
    }

    pub fn with_segment_duration(mut self, duration: TimeDelta) -> Self {
        self.config.segment_duration = duration;
        self
    }

    pub fn with_fix_sources(mut self, sources: Vec<FixSource>) -> Self {
        self.config.fix_sources = sources;
        self
    }

    pub fn with_wall_clock(mut self, probe: WallClockProbe) -> Self {
        self.config.wall_clock = probe;
        self
    }

    pub fn with_can_topics(mut self, topics: Vec<String>) -> Self {
        self.config.can_topics = topics;
        self
    }

    pub fn with_camera_topics(mut self, topics: Vec<(String, Camera)>) -> Self {
        self.config.camera_topics = topics;
        self
    }

    pub fn with_event_log_names(mut self, names: Vec<String>) -> Self {
        self.config.event_log_names = names;
        self
    }

    pub fn with_bus_description(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.bus_description = Some(path.into());
        self
    }

    pub fn with_progress_interval(mut self, events: usize) -> Self {
        self.config.progress_interval = events.max(1);
        self
    }

    pub fn build(self) -> ImportConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = ImportConfig::builder()
            .with_array_cap(4)
            .with_batch_size(100)
            .with_log_batch_size(10)
            .with_fix_sources(vec![FixSource::new("gpsLocation", "unixTimestampMillis", None)])
            .with_wall_clock(WallClockProbe {
                window: 5,
                ..WallClockProbe::default()
            })
            .with_can_topics(vec!["can".into(), "sendcan".into()])
            .with_camera_topics(vec![("roadEncodeIdx".into(), Camera::Road)])
            .with_event_log_names(vec!["rlog.mcap".into()])
            .with_progress_interval(0)
            .build();

        assert_eq!(config.array_cap, 4);
        assert_eq!(config.writer.batch_size, 100);
        assert_eq!(config.writer.log_batch_size, 10);
        assert_eq!(config.fix_sources.len(), 1);
        assert_eq!(config.wall_clock.window, 5);
        assert!(config.is_can_topic("sendcan"));
        assert_eq!(config.camera_topics.len(), 1);
        assert_eq!(config.event_log_names, ["rlog.mcap"]);
        assert_eq!(config.progress_interval, 1);
    }

    #[test]
    fn default_log_topics() {
        let config = ImportConfig::default();
        assert_eq!(config.log_kind("errorLogMessage"), Some(LogKind::Error));
        assert_eq!(config.log_kind("logMessage"), Some(LogKind::Log));
        assert_eq!(config.log_kind("carState"), None);
        assert!(!config.is_can_topic("sendcan"));
    }
}
