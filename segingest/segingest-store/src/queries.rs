//! Read paths used by viewers and by the CLI `stats` command.

use rusqlite::{Connection, params};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub time: i64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrameRecord {
    pub time: i64,
    pub address: u32,
    pub payload: Vec<u8>,
    pub bus: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoFrame {
    pub frame_number: i64,
    pub capture_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub time: i64,
    pub level_kind: String,
    pub daemon: Option<String>,
    pub levelnum: Option<i64>,
    pub filename: Option<String>,
    pub funcname: Option<String>,
    pub lineno: Option<i64>,
    pub message: String,
}

/// Row counts of one segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentCounts {
    pub samples: u64,
    pub can_frames: u64,
    pub log_lines: u64,
    pub video_frames: u64,
}

/// Row counts of the whole database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatabaseStats {
    pub routes: u64,
    pub segments: u64,
    pub samples: u64,
    pub can_frames: u64,
    pub log_lines: u64,
    pub video_frames: u64,
    pub catalog_entries: u64,
}

fn count(conn: &Connection, sql: &str, segment_id: Option<i64>) -> Result<u64> {
    let n: i64 = match segment_id {
        Some(id) => conn.query_row(sql, params![id], |row| row.get(0))?,
        None => conn.query_row(sql, [], |row| row.get(0))?,
    };
    Ok(u64::try_from(n).unwrap_or_default())
}

pub(crate) fn samples(
    conn: &Connection,
    segment_id: i64,
    signal_name: &str,
    range: Option<(i64, i64)>,
) -> Result<Vec<Sample>> {
    let (from, to) = range.unwrap_or((i64::MIN, i64::MAX));
    let mut stmt = conn.prepare_cached(
        "SELECT time, value FROM timeseries_samples \
         WHERE segment_id = ?1 AND signal_name = ?2 AND time BETWEEN ?3 AND ?4 \
         ORDER BY time",
    )?;
    let rows = stmt.query_map(params![segment_id, signal_name, from, to], |row| {
        Ok(Sample {
            time: row.get(0)?,
            value: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<_, _>>()?)
}

pub(crate) fn signal_names(conn: &Connection, segment_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT signal_name FROM timeseries_samples WHERE segment_id = ?1 \
         ORDER BY signal_name",
    )?;
    let rows = stmt.query_map(params![segment_id], |row| row.get(0))?;
    Ok(rows.collect::<std::result::Result<_, _>>()?)
}

pub(crate) fn can_frames(
    conn: &Connection,
    segment_id: i64,
    range: Option<(i64, i64)>,
) -> Result<Vec<CanFrameRecord>> {
    let (from, to) = range.unwrap_or((i64::MIN, i64::MAX));
    let mut stmt = conn.prepare_cached(
        "SELECT time, address, payload, bus FROM can_frames \
         WHERE segment_id = ?1 AND time BETWEEN ?2 AND ?3 ORDER BY time, rowid",
    )?;
    let rows = stmt.query_map(params![segment_id, from, to], |row| {
        Ok(CanFrameRecord {
            time: row.get(0)?,
            address: row.get(1)?,
            payload: row.get(2)?,
            bus: row.get(3)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<_, _>>()?)
}

pub(crate) fn video_frames(conn: &Connection, segment_id: i64, camera: &str) -> Result<Vec<VideoFrame>> {
    let mut stmt = conn.prepare_cached(
        "SELECT frame_number, capture_time FROM video_frame_timestamps \
         WHERE segment_id = ?1 AND camera = ?2 ORDER BY frame_number",
    )?;
    let rows = stmt.query_map(params![segment_id, camera], |row| {
        Ok(VideoFrame {
            frame_number: row.get(0)?,
            capture_time: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<_, _>>()?)
}

pub(crate) fn log_lines(conn: &Connection, segment_id: i64) -> Result<Vec<LogRecord>> {
    let mut stmt = conn.prepare(
        "SELECT time, level_kind, daemon, levelnum, filename, funcname, lineno, message \
         FROM log_messages WHERE segment_id = ?1 ORDER BY time, rowid",
    )?;
    let rows = stmt.query_map(params![segment_id], |row| {
        Ok(LogRecord {
            time: row.get(0)?,
            level_kind: row.get(1)?,
            daemon: row.get(2)?,
            levelnum: row.get(3)?,
            filename: row.get(4)?,
            funcname: row.get(5)?,
            lineno: row.get(6)?,
            message: row.get(7)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<_, _>>()?)
}

pub(crate) fn segment_counts(conn: &Connection, segment_id: i64) -> Result<SegmentCounts> {
    let id = Some(segment_id);
    Ok(SegmentCounts {
        samples: count(conn, "SELECT COUNT(*) FROM timeseries_samples WHERE segment_id = ?1", id)?,
        can_frames: count(conn, "SELECT COUNT(*) FROM can_frames WHERE segment_id = ?1", id)?,
        log_lines: count(conn, "SELECT COUNT(*) FROM log_messages WHERE segment_id = ?1", id)?,
        video_frames: count(
            conn,
            "SELECT COUNT(*) FROM video_frame_timestamps WHERE segment_id = ?1",
            id,
        )?,
    })
}

pub(crate) fn database_stats(conn: &Connection) -> Result<DatabaseStats> {
    Ok(DatabaseStats {
        routes: count(conn, "SELECT COUNT(*) FROM routes", None)?,
        segments: count(conn, "SELECT COUNT(*) FROM segments", None)?,
        samples: count(conn, "SELECT COUNT(*) FROM timeseries_samples", None)?,
        can_frames: count(conn, "SELECT COUNT(*) FROM can_frames", None)?,
        log_lines: count(conn, "SELECT COUNT(*) FROM log_messages", None)?,
        video_frames: count(conn, "SELECT COUNT(*) FROM video_frame_timestamps", None)?,
        catalog_entries: count(conn, "SELECT COUNT(*) FROM signal_catalog", None)?,
    })
}
