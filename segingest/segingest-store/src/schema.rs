//! Table layout and connection setup.

use std::time::Duration;

use rusqlite::Connection;

use crate::error::Result;

pub(crate) const SCHEMA_VERSION: i64 = 1;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const DDL: &str = "
CREATE TABLE IF NOT EXISTS routes (
    route_id             TEXT PRIMARY KEY,
    device_id            TEXT NOT NULL,
    start_timestamp      INTEGER,
    start_source         TEXT,
    start_confidence     INTEGER,
    bus_description_file TEXT
);

CREATE TABLE IF NOT EXISTS segments (
    segment_id        INTEGER PRIMARY KEY AUTOINCREMENT,
    route_id          TEXT NOT NULL REFERENCES routes(route_id) ON DELETE CASCADE,
    segment_index     INTEGER NOT NULL,
    start_time        INTEGER,
    end_time          INTEGER,
    wall_clock_offset INTEGER,
    start_timestamp   INTEGER,
    time_source       TEXT,
    event_log_path    TEXT NOT NULL,
    media_paths       TEXT NOT NULL DEFAULT '{}',
    gps_timestamp     INTEGER,
    total_events      INTEGER NOT NULL DEFAULT 0,
    UNIQUE (route_id, segment_index)
);

CREATE TABLE IF NOT EXISTS timeseries_samples (
    segment_id  INTEGER NOT NULL REFERENCES segments(segment_id) ON DELETE CASCADE,
    time        INTEGER NOT NULL,
    signal_name TEXT NOT NULL,
    value       REAL NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_samples_segment_signal_time
    ON timeseries_samples(segment_id, signal_name, time);

CREATE TABLE IF NOT EXISTS can_frames (
    segment_id INTEGER NOT NULL REFERENCES segments(segment_id) ON DELETE CASCADE,
    time       INTEGER NOT NULL,
    address    INTEGER NOT NULL,
    payload    BLOB NOT NULL,
    bus        INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_can_frames_segment_time ON can_frames(segment_id, time);

CREATE TABLE IF NOT EXISTS log_messages (
    segment_id INTEGER NOT NULL REFERENCES segments(segment_id) ON DELETE CASCADE,
    time       INTEGER NOT NULL,
    level_kind TEXT NOT NULL,
    daemon     TEXT,
    levelnum   INTEGER,
    filename   TEXT,
    funcname   TEXT,
    lineno     INTEGER,
    message    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_log_messages_segment_time ON log_messages(segment_id, time);

CREATE TABLE IF NOT EXISTS video_frame_timestamps (
    segment_id   INTEGER NOT NULL REFERENCES segments(segment_id) ON DELETE CASCADE,
    camera       TEXT NOT NULL,
    frame_number INTEGER NOT NULL,
    capture_time INTEGER NOT NULL,
    PRIMARY KEY (segment_id, camera, frame_number)
);

CREATE TABLE IF NOT EXISTS signal_catalog (
    signal_name  TEXT PRIMARY KEY,
    message_type TEXT,
    type         TEXT NOT NULL,
    unit         TEXT NOT NULL DEFAULT '',
    human_name   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_signal_catalog_message_type ON signal_catalog(message_type);
";

/// Apply connection settings and create missing tables.
pub(crate) fn initialize(conn: &Connection) -> Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.execute_batch(DDL)?;

    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if version < SCHEMA_VERSION {
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }
    Ok(())
}
