//! Buffered row writer for one segment.

use std::sync::atomic::{AtomicBool, Ordering};

use rusqlite::{Connection, params};

use crate::error::{Result, StoreError};

pub const DEFAULT_BATCH_SIZE: usize = 50_000;
pub const DEFAULT_LOG_BATCH_SIZE: usize = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    /// Rows buffered per table for samples, CAN frames and video timestamps.
    pub batch_size: usize,
    /// Rows buffered for log lines.
    pub log_batch_size: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            log_batch_size: DEFAULT_LOG_BATCH_SIZE,
        }
    }
}

/// Severity class of a stored log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Log,
    Error,
}

impl LogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LogKind::Log => "log",
            LogKind::Error => "error",
        }
    }
}

/// One log line, split into the fields the logging daemon emits.
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub time: i64,
    pub kind: LogKind,
    pub daemon: Option<String>,
    pub levelnum: Option<i64>,
    pub filename: Option<String>,
    pub funcname: Option<String>,
    pub lineno: Option<i64>,
    pub message: String,
}

struct SampleRow {
    time: i64,
    name: String,
    value: f64,
}

struct CanRow {
    time: i64,
    address: u32,
    payload: Vec<u8>,
    bus: u8,
}

struct VideoRow {
    camera: &'static str,
    frame_number: i64,
    capture_time: i64,
}

/// Row counts and flush count of a finished writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub samples: u64,
    pub can_frames: u64,
    pub log_lines: u64,
    pub video_frames: u64,
    pub flushes: u64,
}

/// Buffers rows for one segment and inserts them in batches through cached
/// prepared statements.
///
/// The cancellation flag is checked before every flush; a raised flag turns
/// the flush into [`StoreError::Cancelled`] and nothing further is written.
pub struct SegmentWriter<'c> {
    conn: &'c Connection,
    segment_id: i64,
    options: WriterOptions,
    cancel: Option<&'c AtomicBool>,
    samples: Vec<SampleRow>,
    can_frames: Vec<CanRow>,
    logs: Vec<LogLine>,
    video: Vec<VideoRow>,
    stats: WriterStats,
}

impl<'c> SegmentWriter<'c> {
    pub(crate) fn new(
        conn: &'c Connection,
        segment_id: i64,
        options: WriterOptions,
        cancel: Option<&'c AtomicBool>,
    ) -> Self {
        let options = WriterOptions {
            batch_size: options.batch_size.max(1),
            log_batch_size: options.log_batch_size.max(1),
        };
        Self {
            conn,
            segment_id,
            options,
            cancel,
            samples: Vec::with_capacity(options.batch_size.min(DEFAULT_BATCH_SIZE)),
            can_frames: Vec::new(),
            logs: Vec::new(),
            video: Vec::new(),
            stats: WriterStats::default(),
        }
    }

    pub fn segment_id(&self) -> i64 {
        self.segment_id
    }

    pub fn push_sample(&mut self, time: i64, name: impl Into<String>, value: f64) -> Result<()> {
        self.samples.push(SampleRow {
            time,
            name: name.into(),
            value,
        });
        if self.samples.len() >= self.options.batch_size {
            self.flush_samples()?;
        }
        Ok(())
    }

    pub fn push_can_frame(&mut self, time: i64, address: u32, payload: &[u8], bus: u8) -> Result<()> {
        self.can_frames.push(CanRow {
            time,
            address,
            payload: payload.to_vec(),
            bus,
        });
        if self.can_frames.len() >= self.options.batch_size {
            self.flush_can_frames()?;
        }
        Ok(())
    }

    pub fn push_log(&mut self, line: LogLine) -> Result<()> {
        self.logs.push(line);
        if self.logs.len() >= self.options.log_batch_size {
            self.flush_logs()?;
        }
        Ok(())
    }

    pub fn push_video_frame(
        &mut self,
        camera: &'static str,
        frame_number: i64,
        capture_time: i64,
    ) -> Result<()> {
        self.video.push(VideoRow {
            camera,
            frame_number,
            capture_time,
        });
        if self.video.len() >= self.options.batch_size {
            self.flush_video()?;
        }
        Ok(())
    }

    /// Flush every buffer and return the totals.
    pub fn finish(mut self) -> Result<WriterStats> {
        self.flush_samples()?;
        self.flush_can_frames()?;
        self.flush_logs()?;
        self.flush_video()?;
        Ok(self.stats)
    }

    fn check_cancelled(&self) -> Result<()> {
        match self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(StoreError::Cancelled),
            _ => Ok(()),
        }
    }

    fn flush_samples(&mut self) -> Result<()> {
        if self.samples.is_empty() {
            return Ok(());
        }
        self.check_cancelled()?;
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO timeseries_samples (segment_id, time, signal_name, value) \
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for row in self.samples.drain(..) {
            stmt.execute(params![self.segment_id, row.time, row.name, row.value])?;
            self.stats.samples += 1;
        }
        self.stats.flushes += 1;
        Ok(())
    }

    fn flush_can_frames(&mut self) -> Result<()> {
        if self.can_frames.is_empty() {
            return Ok(());
        }
        self.check_cancelled()?;
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO can_frames (segment_id, time, address, payload, bus) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for row in self.can_frames.drain(..) {
            stmt.execute(params![
                self.segment_id,
                row.time,
                row.address,
                row.payload,
                row.bus
            ])?;
            self.stats.can_frames += 1;
        }
        self.stats.flushes += 1;
        Ok(())
    }

    fn flush_logs(&mut self) -> Result<()> {
        if self.logs.is_empty() {
            return Ok(());
        }
        self.check_cancelled()?;
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO log_messages (segment_id, time, level_kind, daemon, levelnum, \
                 filename, funcname, lineno, message) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for line in self.logs.drain(..) {
            stmt.execute(params![
                self.segment_id,
                line.time,
                line.kind.as_str(),
                line.daemon,
                line.levelnum,
                line.filename,
                line.funcname,
                line.lineno,
                line.message,
            ])?;
            self.stats.log_lines += 1;
        }
        self.stats.flushes += 1;
        Ok(())
    }

    fn flush_video(&mut self) -> Result<()> {
        if self.video.is_empty() {
            return Ok(());
        }
        self.check_cancelled()?;
        let mut stmt = self.conn.prepare_cached(
            "INSERT OR REPLACE INTO video_frame_timestamps \
                 (segment_id, camera, frame_number, capture_time) \
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for row in self.video.drain(..) {
            stmt.execute(params![
                self.segment_id,
                row.camera,
                row.frame_number,
                row.capture_time
            ])?;
            self.stats.video_frames += 1;
        }
        self.stats.flushes += 1;
        Ok(())
    }
}
