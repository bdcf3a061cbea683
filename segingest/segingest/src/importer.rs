//! Segment import pipeline.
//!
//! One import runs sequentially: parse the path, read the whole event log,
//! load the bus description and catalog, resolve absolute time, then write
//! everything inside a single transaction under a bulk session. A failure or
//! cancellation anywhere rolls the transaction back, so the store keeps
//! whatever complete import of the segment it had before.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use chrono::{DateTime, Utc};
use segingest_can::{BusDescription, CanDecoder};
use segingest_core::TopicDecoder;
use segingest_store::{LogKind, NewSegment, RouteStart, SegmentTransaction, Store, StoreError};

use crate::{
    can::CanFrameLayout,
    catalog::can_signal_entry,
    config::ImportConfig,
    decoders::DecoderRegistry,
    error::{ImportError, ImportErrorKind, ImportStage, SchemaGapError},
    extract::FieldExtractor,
    logmsg::{log_text, parse_log_line},
    path::SegmentPath,
    progress::{CancelFlag, ImportObserver, Progress},
    reader::{EventLog, EventLogFile},
    time::{FixLocator, SegmentClock, TimeReconciler, TimeResolution},
    video::{self, Camera, VideoCorrelator},
};

/// Summary of a finished import.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub segment_id: i64,
    pub route_id: String,
    pub segment_index: u32,
    pub events: u64,
    pub samples: u64,
    pub can_frames: u64,
    /// Decoded CAN signal values, also counted in `samples`.
    pub can_signals: u64,
    pub log_lines: u64,
    pub video_frames: BTreeMap<Camera, u64>,
    /// Catalog entries created by this import.
    pub catalog_added: usize,
    pub reflection_errors: u64,
    pub time: Option<TimeResolution>,
    pub route_start_updated: bool,
    /// Monotonic envelope of the stored rows.
    pub bounds: Option<(i64, i64)>,
    pub topics: BTreeMap<String, u64>,
}

/// Attach the failing stage and segment to a lower-level error.
trait AtStage<T> {
    fn at(self, stage: ImportStage, segment: &str) -> Result<T, ImportError>;
}

impl<T, E: Into<ImportErrorKind>> AtStage<T> for Result<T, E> {
    fn at(self, stage: ImportStage, segment: &str) -> Result<T, ImportError> {
        self.map_err(|e| ImportError::new(stage, segment, e))
    }
}

/// What to do with the events of one channel.
struct ChannelPlan {
    decoder: Box<dyn TopicDecoder>,
    walk: bool,
    can: Option<CanFrameLayout>,
    log_kind: Option<LogKind>,
    camera: Option<Camera>,
}

/// Imports segments into a [`Store`].
///
/// An importer is shared across worker threads; each import takes its own
/// store. Reading, decoding and time resolution run concurrently, while the
/// write phases of imports sharing one importer run one at a time.
pub struct Importer {
    config: ImportConfig,
    write_gate: Mutex<()>,
    registry: DecoderRegistry,
    extractor: FieldExtractor,
    fix_locator: FixLocator,
    reconciler: TimeReconciler,
}

impl Importer {
    pub fn new(config: ImportConfig) -> Self {
        Self::with_registry(config, DecoderRegistry::with_default_decoders())
    }

    pub fn with_registry(config: ImportConfig, registry: DecoderRegistry) -> Self {
        let fix_locator = FixLocator::new(config.fix_sources.clone(), registry.clone());
        let reconciler =
            TimeReconciler::standard(fix_locator.clone(), config.event_log_names.clone());
        Self {
            extractor: FieldExtractor::new(config.array_cap),
            config,
            write_gate: Mutex::new(()),
            registry,
            fix_locator,
            reconciler,
        }
    }

    /// Replace the time-resolution chain.
    pub fn with_reconciler(mut self, reconciler: TimeReconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub fn registry(&self) -> &DecoderRegistry {
        &self.registry
    }

    /// Resolve a segment directory or event-log file to its parsed path and
    /// the event log to read.
    pub fn locate(&self, path: &Path) -> Result<(SegmentPath, PathBuf), ImportError> {
        let label = path.display().to_string();
        let segment = SegmentPath::parse(path).ok_or_else(|| {
            ImportError::new(
                ImportStage::ParsePath,
                &label,
                ImportErrorKind::InvalidPath(
                    "expected a directory named <device>--<route>--<index>".to_string(),
                ),
            )
        })?;
        let log_path = if path.is_file() {
            path.to_path_buf()
        } else {
            segment
                .find_file(&self.config.event_log_names)
                .ok_or_else(|| {
                    ImportError::new(
                        ImportStage::ParsePath,
                        &label,
                        ImportErrorKind::InvalidPath(format!(
                            "no event log ({}) in segment directory",
                            self.config.event_log_names.join(", ")
                        )),
                    )
                })?
        };
        Ok((segment, log_path))
    }

    /// Import one segment.
    pub fn import_segment(
        &self,
        store: &mut Store,
        path: &Path,
        observer: &dyn ImportObserver,
        cancel: &CancelFlag,
    ) -> Result<ImportReport, ImportError> {
        let (segment, log_path) = self.locate(path)?;
        let label = segment.to_string();
        let mut progress = Progress::new(observer, label.clone());
        progress.set(0);
        progress.log(&format!("importing {}", log_path.display()));
        check_cancel(cancel, ImportStage::ParsePath, &label)?;
        progress.set(5);

        let file = EventLogFile::open(&log_path).at(ImportStage::ReadLog, &label)?;
        let log = file.read().at(ImportStage::ReadLog, &label)?;
        let topics = log.topic_counts();
        progress.log(&format!("read {} events on {} topics", log.len(), topics.len()));
        check_cancel(cancel, ImportStage::ReadLog, &label)?;
        progress.set(20);

        let (can_decoder, bus_file) = match &self.config.bus_description {
            Some(bus_path) => {
                let bus = BusDescription::from_file(bus_path)
                    .at(ImportStage::LoadBusDescription, &label)?;
                progress.log(&format!(
                    "loaded {} bus messages from {}",
                    bus.len(),
                    bus_path.display()
                ));
                let name = bus_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned());
                (Some(CanDecoder::new(bus)), name)
            }
            None => (None, None),
        };

        let message_types = store.message_types().at(ImportStage::LoadCatalog, &label)?;
        if message_types.is_empty() {
            return Err(ImportError::new(
                ImportStage::LoadCatalog,
                &label,
                SchemaGapError::EmptyCatalog,
            ));
        }
        let plans = self.plan_channels(&log, &message_types, &label)?;
        progress.log(&format!(
            "{} of {} channels carry data to import",
            plans.len(),
            topics.len()
        ));

        let time = self.resolve_time(store, &segment, &log).at(ImportStage::ResolveTime, &label)?;
        match &time.resolution {
            Some(r) => progress.log(&format!(
                "segment starts at {} ({})",
                r.segment_start.to_rfc3339(),
                r.source
            )),
            None => progress.log("no absolute start time could be resolved"),
        }
        check_cancel(cancel, ImportStage::ResolveTime, &label)?;
        progress.set(30);

        let route_id = segment.route_id();
        let mut report = ImportReport {
            route_id: route_id.clone(),
            segment_index: segment.segment_index,
            events: log.len() as u64,
            time: time.resolution,
            topics,
            ..ImportReport::default()
        };

        // SQLite allows one writer; queue here instead of timing out on the
        // database lock.
        let _writing = self.write_gate.lock().unwrap_or_else(PoisonError::into_inner);
        check_cancel(cancel, ImportStage::Write, &label)?;
        let mut bulk = store.bulk_session().at(ImportStage::Write, &label)?;
        let tx = bulk.transaction().at(ImportStage::Write, &label)?;
        tx.upsert_route(&route_id, &segment.device_id, bus_file.as_deref())
            .at(ImportStage::Write, &label)?;
        if let Some(r) = time.resolution.filter(|r| r.source.is_fix_derived()) {
            report.route_start_updated = tx
                .ratchet_route_start(
                    &route_id,
                    RouteStart {
                        timestamp_ms: r.route_start.timestamp_millis(),
                        source: r.source.as_str(),
                        confidence: r.source.confidence(),
                    },
                )
                .at(ImportStage::Write, &label)?;
        }

        let new_segment = NewSegment {
            route_id: route_id.clone(),
            segment_index: segment.segment_index,
            start_time: log.first_log_time().map(|t| t as i64),
            end_time: log.last_log_time().map(|t| t as i64),
            wall_clock_offset: time.wall_clock_offset,
            start_timestamp: time.resolution.map(|r| r.segment_start.timestamp_millis()),
            time_source: time.resolution.map(|r| r.source.as_str().to_string()),
            event_log_path: log_path.display().to_string(),
            media_paths: video::media_paths(&segment.dir),
            gps_timestamp: time.fix_timestamp.map(|t| t.timestamp_millis()),
            total_events: log.len() as u64,
        };
        report.segment_id = tx.begin_segment(&new_segment).at(ImportStage::Write, &label)?;

        self.write_events(
            &tx,
            &log,
            &plans,
            can_decoder.as_ref(),
            &mut report,
            &mut progress,
            cancel,
        )
        .at(ImportStage::Write, &label)?;
        progress.set(90);

        report.bounds = tx
            .tighten_segment_bounds(report.segment_id)
            .at(ImportStage::Finalize, &label)?;
        let inferred = tx
            .auto_register_missing(report.segment_id)
            .at(ImportStage::Finalize, &label)?;
        report.catalog_added += inferred.len();
        check_cancel(cancel, ImportStage::Finalize, &label)?;
        tx.commit().at(ImportStage::Finalize, &label)?;
        drop(bulk);

        progress.log(&format!(
            "stored {} samples, {} CAN frames, {} log lines, {} video frames; {} new catalog entries",
            report.samples,
            report.can_frames,
            report.log_lines,
            report.video_frames.values().sum::<u64>(),
            report.catalog_added
        ));
        if report.reflection_errors > 0 {
            progress.log(&format!(
                "skipped {} fields that could not be read",
                report.reflection_errors
            ));
        }
        progress.set(100);
        Ok(report)
    }

    fn plan_channels(
        &self,
        log: &EventLog<'_>,
        message_types: &BTreeSet<String>,
        label: &str,
    ) -> Result<HashMap<u16, ChannelPlan>, ImportError> {
        let mut plans = HashMap::new();
        for channel in log.channels() {
            let topic = channel.topic.as_str();
            let walk = message_types.contains(topic);
            let is_can = self.config.is_can_topic(topic);
            let log_kind = self.config.log_kind(topic);
            let camera = self
                .config
                .camera_topics
                .iter()
                .find(|(t, _)| t == topic)
                .map(|(_, c)| *c);
            if !walk && !is_can && log_kind.is_none() && camera.is_none() {
                continue;
            }

            let decoder = match self.registry.topic_decoder(channel) {
                Ok(decoder) => decoder,
                Err(e) if walk => return Err(ImportError::new(ImportStage::LoadCatalog, label, e)),
                Err(e) => {
                    log::warn!("{label}: not importing '{topic}': {e}");
                    continue;
                }
            };
            let can = if is_can {
                let layout = CanFrameLayout::from_defs(decoder.field_defs());
                if layout.is_none() {
                    log::warn!("{label}: '{topic}' has no address/dat frame fields");
                }
                layout
            } else {
                None
            };
            plans.insert(
                channel.id,
                ChannelPlan {
                    decoder,
                    walk,
                    can,
                    log_kind,
                    camera,
                },
            );
        }
        Ok(plans)
    }

    fn resolve_time(
        &self,
        store: &Store,
        segment: &SegmentPath,
        log: &EventLog<'_>,
    ) -> Result<ResolvedTime, StoreError> {
        let fix = self.fix_locator.find(log);
        let wall_clock_offset = self.config.wall_clock.offset(log, &self.registry);
        let cached_route_start = store
            .route(&segment.route_id())?
            .and_then(|r| r.start_timestamp)
            .and_then(DateTime::from_timestamp_millis);
        let clock = SegmentClock {
            path: segment,
            first_log_time: log.first_log_time(),
            fix,
            wall_clock_offset,
            cached_route_start,
            segment_duration: self.config.segment_duration,
        };
        Ok(ResolvedTime {
            resolution: self.reconciler.resolve(&clock),
            fix_timestamp: fix.map(|f| f.timestamp),
            wall_clock_offset,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn write_events(
        &self,
        tx: &SegmentTransaction<'_>,
        log: &EventLog<'_>,
        plans: &HashMap<u16, ChannelPlan>,
        can_decoder: Option<&CanDecoder>,
        report: &mut ImportReport,
        progress: &mut Progress<'_>,
        cancel: &CancelFlag,
    ) -> Result<(), StoreError> {
        let mut writer = tx.writer(report.segment_id, self.config.writer, Some(cancel.as_atomic()));
        let mut video = VideoCorrelator::new(&self.config.camera_topics);
        let mut registered_can: HashSet<String> = HashSet::new();
        let mut scratch: Vec<(String, f64)> = Vec::new();
        let interval = self.config.progress_interval.max(1);
        let total = log.len();

        for (i, event) in log.events().iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(StoreError::Cancelled);
            }
            if i % interval == 0 {
                progress.span(30, 90, i, total);
            }
            let Some(plan) = plans.get(&event.channel.id) else {
                continue;
            };
            let topic = event.topic();
            let value = match plan.decoder.decode(&event.data) {
                Ok(value) => value,
                Err(e) => {
                    log::debug!("skipping {topic} event at {}: {e}", event.log_time);
                    report.reflection_errors += 1;
                    continue;
                }
            };
            let defs = plan.decoder.field_defs();
            let time = event.log_time as i64;

            if plan.walk {
                scratch.clear();
                let stats = self.extractor.extract(topic, defs, &value, |name, v| {
                    scratch.push((name.to_string(), v))
                });
                report.reflection_errors += stats.reflection_errors;
                for (name, v) in scratch.drain(..) {
                    writer.push_sample(time, name, v)?;
                }
            }

            if let Some(layout) = &plan.can {
                for frame in layout.frames(&value) {
                    let frame = match frame {
                        Ok(frame) => frame,
                        Err(e) => {
                            log::debug!("skipping {topic} frame at {}: {e}", event.log_time);
                            report.reflection_errors += 1;
                            continue;
                        }
                    };
                    writer.push_can_frame(time, frame.address, frame.data, frame.bus)?;
                    let Some(decoder) = can_decoder else {
                        continue;
                    };
                    for signal in decoder.decode(frame.address, frame.data) {
                        writer.push_sample(time, signal.name, signal.value)?;
                        report.can_signals += 1;
                        if !registered_can.contains(signal.name) {
                            registered_can.insert(signal.name.to_string());
                            if tx.ensure_registered(&can_signal_entry(frame.address, signal.definition))? {
                                report.catalog_added += 1;
                            }
                        }
                    }
                }
            }

            if let Some(kind) = plan.log_kind {
                match log_text(defs, &value) {
                    Some(text) => writer.push_log(parse_log_line(text, time, kind))?,
                    None => report.reflection_errors += 1,
                }
            }

            if let Some(camera) = plan.camera {
                if let Err(e) = video.observe(camera, defs, &value) {
                    log::debug!("skipping {topic} frame index at {}: {e}", event.log_time);
                    report.reflection_errors += 1;
                }
            }
        }

        for (camera, frame, capture_time) in video.frames() {
            writer.push_video_frame(camera.as_str(), frame, capture_time)?;
        }
        report.video_frames = video.counts();

        let stats = writer.finish()?;
        report.samples = stats.samples;
        report.can_frames = stats.can_frames;
        report.log_lines = stats.log_lines;
        Ok(())
    }
}

struct ResolvedTime {
    resolution: Option<TimeResolution>,
    fix_timestamp: Option<DateTime<Utc>>,
    wall_clock_offset: Option<i64>,
}

fn check_cancel(cancel: &CancelFlag, stage: ImportStage, segment: &str) -> Result<(), ImportError> {
    if cancel.is_cancelled() {
        return Err(ImportError::new(stage, segment, ImportErrorKind::Cancelled));
    }
    Ok(())
}
