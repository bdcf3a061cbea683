use std::{collections::BTreeSet, sync::atomic::AtomicBool};

use rusqlite::Transaction;

use crate::{
    catalog::{self, CatalogEntry},
    error::Result,
    routes::{self, RouteRecord, RouteStart},
    segments::{self, NewSegment},
    writer::{SegmentWriter, WriterOptions},
};

/// Everything a segment import writes, inside one immediate transaction.
///
/// Dropping without [`commit`](Self::commit) rolls the import back, which
/// leaves any earlier complete import of the same segment in place.
pub struct SegmentTransaction<'c> {
    tx: Transaction<'c>,
}

impl<'c> SegmentTransaction<'c> {
    pub(crate) fn new(tx: Transaction<'c>) -> Self {
        Self { tx }
    }

    pub fn upsert_route(
        &self,
        route_id: &str,
        device_id: &str,
        bus_description_file: Option<&str>,
    ) -> Result<()> {
        routes::upsert(&self.tx, route_id, device_id, bus_description_file)
    }

    pub fn route(&self, route_id: &str) -> Result<Option<RouteRecord>> {
        routes::get(&self.tx, route_id)
    }

    pub fn ratchet_route_start(&self, route_id: &str, start: RouteStart<'_>) -> Result<bool> {
        routes::ratchet_start(&self.tx, route_id, start)
    }

    pub fn begin_segment(&self, segment: &NewSegment) -> Result<i64> {
        segments::begin(&self.tx, segment)
    }

    pub fn writer<'t>(
        &'t self,
        segment_id: i64,
        options: WriterOptions,
        cancel: Option<&'t AtomicBool>,
    ) -> SegmentWriter<'t> {
        SegmentWriter::new(&self.tx, segment_id, options, cancel)
    }

    pub fn tighten_segment_bounds(&self, segment_id: i64) -> Result<Option<(i64, i64)>> {
        segments::tighten_bounds(&self.tx, segment_id)
    }

    pub fn message_types(&self) -> Result<BTreeSet<String>> {
        catalog::message_types(&self.tx)
    }

    pub fn ensure_registered(&self, entry: &CatalogEntry) -> Result<bool> {
        catalog::ensure_registered(&self.tx, entry)
    }

    pub fn auto_register_missing(&self, segment_id: i64) -> Result<Vec<CatalogEntry>> {
        catalog::auto_register_missing(&self.tx, segment_id)
    }

    pub fn commit(self) -> Result<()> {
        self.tx.commit()?;
        Ok(())
    }
}
