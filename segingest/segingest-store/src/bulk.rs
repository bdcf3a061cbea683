//! Scoped bulk-write durability mode.

use rusqlite::{Connection, TransactionBehavior};

use crate::{error::Result, transaction::SegmentTransaction};

const BULK_CACHE_SIZE_KIB: i64 = -128_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SavedPragmas {
    synchronous: i64,
    temp_store: i64,
    cache_size: i64,
}

/// Relaxed durability settings for the lifetime of the session.
///
/// Entering records the connection's `synchronous`, `temp_store` and
/// `cache_size`, then switches to `OFF`/`MEMORY`/128 MB. Dropping the session
/// puts the recorded values back, including when the import that opened it
/// failed or panicked.
pub struct BulkSession<'c> {
    conn: &'c mut Connection,
    saved: SavedPragmas,
}

impl<'c> BulkSession<'c> {
    pub(crate) fn enter(conn: &'c mut Connection) -> Result<Self> {
        let saved = SavedPragmas {
            synchronous: conn.pragma_query_value(None, "synchronous", |row| row.get(0))?,
            temp_store: conn.pragma_query_value(None, "temp_store", |row| row.get(0))?,
            cache_size: conn.pragma_query_value(None, "cache_size", |row| row.get(0))?,
        };
        conn.pragma_update(None, "synchronous", "OFF")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        conn.pragma_update(None, "cache_size", BULK_CACHE_SIZE_KIB)?;
        log::debug!("bulk session entered, saved {saved:?}");
        Ok(Self { conn, saved })
    }

    /// Open the single immediate transaction that carries a segment import.
    pub fn transaction(&mut self) -> Result<SegmentTransaction<'_>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(SegmentTransaction::new(tx))
    }

    pub fn connection(&self) -> &Connection {
        &*self.conn
    }

    fn restore(&self) -> rusqlite::Result<()> {
        self.conn.pragma_update(None, "synchronous", self.saved.synchronous)?;
        self.conn.pragma_update(None, "temp_store", self.saved.temp_store)?;
        self.conn.pragma_update(None, "cache_size", self.saved.cache_size)
    }
}

impl Drop for BulkSession<'_> {
    fn drop(&mut self) {
        match self.restore() {
            Ok(()) => log::debug!("bulk session restored {:?}", self.saved),
            Err(e) => log::warn!("failed to restore connection settings after bulk write: {e}"),
        }
    }
}
