//! SQLite storage for ingested segments.
//!
//! [`Store`] owns one connection. Segment imports go through
//! [`Store::bulk_session`] and [`BulkSession::transaction`] so that a segment
//! becomes visible all at once; everything else (catalog seeding, viewer
//! queries, maintenance) works directly on the store.

mod bulk;
mod catalog;
mod error;
mod infer;
mod queries;
mod routes;
mod schema;
mod segments;
mod transaction;
mod writer;

use std::{collections::BTreeSet, path::Path};

use rusqlite::{Connection, params};

pub use bulk::BulkSession;
pub use catalog::{CatalogEntry, SignalType};
pub use error::{Result, StoreError};
pub use infer::{infer_type, infer_unit, leaf_name};
pub use queries::{CanFrameRecord, DatabaseStats, LogRecord, Sample, SegmentCounts, VideoFrame};
pub use routes::{RouteRecord, RouteStart};
pub use segments::{NewSegment, SegmentRecord};
pub use transaction::SegmentTransaction;
pub use writer::{
    DEFAULT_BATCH_SIZE, DEFAULT_LOG_BATCH_SIZE, LogKind, LogLine, SegmentWriter, WriterOptions,
    WriterStats,
};

/// SQLite-backed segment store.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the database at `path` and create missing tables.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Switch to bulk-write settings until the returned session is dropped.
    pub fn bulk_session(&mut self) -> Result<BulkSession<'_>> {
        BulkSession::enter(&mut self.conn)
    }

    pub fn upsert_route(
        &self,
        route_id: &str,
        device_id: &str,
        bus_description_file: Option<&str>,
    ) -> Result<()> {
        routes::upsert(&self.conn, route_id, device_id, bus_description_file)
    }

    pub fn route(&self, route_id: &str) -> Result<Option<RouteRecord>> {
        routes::get(&self.conn, route_id)
    }

    pub fn ratchet_route_start(&self, route_id: &str, start: RouteStart<'_>) -> Result<bool> {
        routes::ratchet_start(&self.conn, route_id, start)
    }

    pub fn segment(&self, route_id: &str, segment_index: u32) -> Result<Option<SegmentRecord>> {
        segments::find(&self.conn, route_id, segment_index)
    }

    pub fn route_segments(&self, route_id: &str) -> Result<Vec<SegmentRecord>> {
        segments::for_route(&self.conn, route_id)
    }

    /// Delete a segment and, through cascading keys, all of its rows.
    pub fn delete_segment(&self, segment_id: i64) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM segments WHERE segment_id = ?1", params![segment_id])?;
        Ok(n > 0)
    }

    /// Delete a route with all segments and rows.
    pub fn delete_route(&self, route_id: &str) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM routes WHERE route_id = ?1", params![route_id])?;
        Ok(n > 0)
    }

    pub fn message_types(&self) -> Result<BTreeSet<String>> {
        catalog::message_types(&self.conn)
    }

    pub fn ensure_registered(&self, entry: &CatalogEntry) -> Result<bool> {
        catalog::ensure_registered(&self.conn, entry)
    }

    /// Register many entries in one transaction. Returns how many were new.
    pub fn register_all<'e>(&mut self, entries: impl IntoIterator<Item = &'e CatalogEntry>) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut added = 0;
        for entry in entries {
            if catalog::ensure_registered(&tx, entry)? {
                added += 1;
            }
        }
        tx.commit()?;
        Ok(added)
    }

    pub fn catalog(&self) -> Result<Vec<CatalogEntry>> {
        catalog::entries(&self.conn)
    }

    pub fn samples(
        &self,
        segment_id: i64,
        signal_name: &str,
        range: Option<(i64, i64)>,
    ) -> Result<Vec<Sample>> {
        queries::samples(&self.conn, segment_id, signal_name, range)
    }

    pub fn signal_names(&self, segment_id: i64) -> Result<Vec<String>> {
        queries::signal_names(&self.conn, segment_id)
    }

    pub fn can_frames(&self, segment_id: i64, range: Option<(i64, i64)>) -> Result<Vec<CanFrameRecord>> {
        queries::can_frames(&self.conn, segment_id, range)
    }

    pub fn video_frames(&self, segment_id: i64, camera: &str) -> Result<Vec<VideoFrame>> {
        queries::video_frames(&self.conn, segment_id, camera)
    }

    pub fn log_lines(&self, segment_id: i64) -> Result<Vec<LogRecord>> {
        queries::log_lines(&self.conn, segment_id)
    }

    pub fn segment_counts(&self, segment_id: i64) -> Result<SegmentCounts> {
        queries::segment_counts(&self.conn, segment_id)
    }

    pub fn stats(&self) -> Result<DatabaseStats> {
        queries::database_stats(&self.conn)
    }
}
