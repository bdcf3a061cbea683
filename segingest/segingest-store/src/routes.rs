use rusqlite::{Connection, OptionalExtension, params};

use crate::error::Result;

/// Stored route row.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRecord {
    pub route_id: String,
    pub device_id: String,
    /// Absolute route start, Unix milliseconds.
    pub start_timestamp: Option<i64>,
    pub start_source: Option<String>,
    pub start_confidence: Option<i64>,
    pub bus_description_file: Option<String>,
}

/// Estimate offered to [`ratchet_start`]; it only lands when it beats the
/// stored confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteStart<'a> {
    pub timestamp_ms: i64,
    pub source: &'a str,
    pub confidence: i64,
}

pub(crate) fn upsert(
    conn: &Connection,
    route_id: &str,
    device_id: &str,
    bus_description_file: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO routes (route_id, device_id, bus_description_file) VALUES (?1, ?2, ?3) \
         ON CONFLICT(route_id) DO UPDATE SET \
             device_id = excluded.device_id, \
             bus_description_file = COALESCE(excluded.bus_description_file, routes.bus_description_file)",
        params![route_id, device_id, bus_description_file],
    )?;
    Ok(())
}

/// Monotone update of the route start. Returns `true` when the row changed.
pub(crate) fn ratchet_start(conn: &Connection, route_id: &str, start: RouteStart<'_>) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE routes SET start_timestamp = ?2, start_source = ?3, start_confidence = ?4 \
         WHERE route_id = ?1 \
           AND (start_timestamp IS NULL OR start_confidence IS NULL OR start_confidence < ?4)",
        params![route_id, start.timestamp_ms, start.source, start.confidence],
    )?;
    Ok(changed > 0)
}

pub(crate) fn get(conn: &Connection, route_id: &str) -> Result<Option<RouteRecord>> {
    let route = conn
        .query_row(
            "SELECT route_id, device_id, start_timestamp, start_source, start_confidence, \
                    bus_description_file \
             FROM routes WHERE route_id = ?1",
            params![route_id],
            |row| {
                Ok(RouteRecord {
                    route_id: row.get(0)?,
                    device_id: row.get(1)?,
                    start_timestamp: row.get(2)?,
                    start_source: row.get(3)?,
                    start_confidence: row.get(4)?,
                    bus_description_file: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(route)
}
