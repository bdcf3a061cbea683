use std::collections::BTreeMap;

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::Result;

const CHILD_TABLES: &[&str] = &[
    "timeseries_samples",
    "can_frames",
    "log_messages",
    "video_frame_timestamps",
];

/// Segment metadata written when an import starts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewSegment {
    pub route_id: String,
    pub segment_index: u32,
    /// First and last event log time, monotonic nanoseconds.
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub wall_clock_offset: Option<i64>,
    /// Resolved absolute start, Unix milliseconds.
    pub start_timestamp: Option<i64>,
    pub time_source: Option<String>,
    pub event_log_path: String,
    pub media_paths: BTreeMap<String, String>,
    pub gps_timestamp: Option<i64>,
    pub total_events: u64,
}

/// Stored segment row.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRecord {
    pub segment_id: i64,
    pub route_id: String,
    pub segment_index: u32,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub wall_clock_offset: Option<i64>,
    pub start_timestamp: Option<i64>,
    pub time_source: Option<String>,
    pub event_log_path: String,
    pub media_paths: BTreeMap<String, String>,
    pub gps_timestamp: Option<i64>,
    pub total_events: u64,
}

const SELECT_SEGMENT: &str = "SELECT segment_id, route_id, segment_index, start_time, end_time, \
    wall_clock_offset, start_timestamp, time_source, event_log_path, media_paths, \
    gps_timestamp, total_events FROM segments";

fn segment_from_row(row: &Row<'_>) -> rusqlite::Result<SegmentRecord> {
    let media: String = row.get(9)?;
    Ok(SegmentRecord {
        segment_id: row.get(0)?,
        route_id: row.get(1)?,
        segment_index: row.get(2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        wall_clock_offset: row.get(5)?,
        start_timestamp: row.get(6)?,
        time_source: row.get(7)?,
        event_log_path: row.get(8)?,
        media_paths: serde_json::from_str(&media).unwrap_or_default(),
        gps_timestamp: row.get(10)?,
        total_events: row.get::<_, i64>(11)?.try_into().unwrap_or_default(),
    })
}

/// Insert the segment row, or reset an existing one and drop its children.
pub(crate) fn begin(conn: &Connection, segment: &NewSegment) -> Result<i64> {
    let media = serde_json::to_string(&segment.media_paths)?;
    let total_events = i64::try_from(segment.total_events).unwrap_or(i64::MAX);

    let existing: Option<i64> = conn
        .query_row(
            "SELECT segment_id FROM segments WHERE route_id = ?1 AND segment_index = ?2",
            params![segment.route_id, segment.segment_index],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(segment_id) => {
            for table in CHILD_TABLES {
                let removed = conn.execute(
                    &format!("DELETE FROM {table} WHERE segment_id = ?1"),
                    params![segment_id],
                )?;
                if removed > 0 {
                    log::debug!("segment {segment_id}: removed {removed} rows from {table}");
                }
            }
            conn.execute(
                "UPDATE segments SET start_time = ?2, end_time = ?3, wall_clock_offset = ?4, \
                     start_timestamp = ?5, time_source = ?6, event_log_path = ?7, \
                     media_paths = ?8, gps_timestamp = ?9, total_events = ?10 \
                 WHERE segment_id = ?1",
                params![
                    segment_id,
                    segment.start_time,
                    segment.end_time,
                    segment.wall_clock_offset,
                    segment.start_timestamp,
                    segment.time_source,
                    segment.event_log_path,
                    media,
                    segment.gps_timestamp,
                    total_events,
                ],
            )?;
            Ok(segment_id)
        }
        None => {
            conn.execute(
                "INSERT INTO segments (route_id, segment_index, start_time, end_time, \
                     wall_clock_offset, start_timestamp, time_source, event_log_path, \
                     media_paths, gps_timestamp, total_events) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    segment.route_id,
                    segment.segment_index,
                    segment.start_time,
                    segment.end_time,
                    segment.wall_clock_offset,
                    segment.start_timestamp,
                    segment.time_source,
                    segment.event_log_path,
                    media,
                    segment.gps_timestamp,
                    total_events,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        }
    }
}

/// Narrow `start_time`/`end_time` to the span actually covered by samples and
/// CAN frames. Leaves the row untouched when the segment has neither.
pub(crate) fn tighten_bounds(conn: &Connection, segment_id: i64) -> Result<Option<(i64, i64)>> {
    let (min, max): (Option<i64>, Option<i64>) = conn.query_row(
        "SELECT MIN(t), MAX(t) FROM ( \
             SELECT time AS t FROM timeseries_samples WHERE segment_id = ?1 \
             UNION ALL \
             SELECT time AS t FROM can_frames WHERE segment_id = ?1)",
        params![segment_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    let (Some(start), Some(end)) = (min, max) else {
        return Ok(None);
    };
    conn.execute(
        "UPDATE segments SET start_time = ?2, end_time = ?3 WHERE segment_id = ?1",
        params![segment_id, start, end],
    )?;
    Ok(Some((start, end)))
}

pub(crate) fn find(conn: &Connection, route_id: &str, segment_index: u32) -> Result<Option<SegmentRecord>> {
    let segment = conn
        .query_row(
            &format!("{SELECT_SEGMENT} WHERE route_id = ?1 AND segment_index = ?2"),
            params![route_id, segment_index],
            segment_from_row,
        )
        .optional()?;
    Ok(segment)
}

pub(crate) fn for_route(conn: &Connection, route_id: &str) -> Result<Vec<SegmentRecord>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_SEGMENT} WHERE route_id = ?1 ORDER BY segment_index"
    ))?;
    let rows = stmt.query_map(params![route_id], segment_from_row)?;
    Ok(rows.collect::<std::result::Result<_, _>>()?)
}
