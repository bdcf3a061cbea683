//! Error types for reading and importing segments.

use std::fmt;

use segingest_can::DbcError;
use segingest_core::DecoderError;
use segingest_store::StoreError;

/// The event log could not be read. Raised before any storage work.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// I/O error while opening or memory-mapping a file.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Container framing error from the `mcap` crate (bad magic, CRC mismatch, ...).
    #[error("malformed event log: {0}")]
    Format(#[from] mcap::McapError),
}

/// A catalogued topic cannot be interpreted, so the import cannot be trusted.
#[derive(Debug, thiserror::Error)]
pub enum SchemaGapError {
    #[error(
        "signal catalog has no message types; run `segimport register-types` on an event log first"
    )]
    EmptyCatalog,

    #[error("channel '{topic}' carries no schema")]
    NoSchema { topic: String },

    #[error(
        "no decoder registered for schema_encoding='{schema_encoding}', message_encoding='{message_encoding}' on topic '{topic}'"
    )]
    NoDecoder {
        topic: String,
        schema_encoding: String,
        message_encoding: String,
    },

    #[error("schema for topic '{topic}' is unusable: {source}")]
    InvalidSchema {
        topic: String,
        #[source]
        source: DecoderError,
    },
}

/// Pipeline stage an import was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    ParsePath,
    ReadLog,
    LoadBusDescription,
    LoadCatalog,
    ResolveTime,
    Write,
    Finalize,
}

impl ImportStage {
    pub fn as_str(self) -> &'static str {
        match self {
            ImportStage::ParsePath => "parse path",
            ImportStage::ReadLog => "read event log",
            ImportStage::LoadBusDescription => "load bus description",
            ImportStage::LoadCatalog => "load catalog",
            ImportStage::ResolveTime => "resolve time",
            ImportStage::Write => "write",
            ImportStage::Finalize => "finalize",
        }
    }
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImportErrorKind {
    #[error("not a segment path: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Format(#[from] ReaderError),

    #[error("invalid bus description: {0}")]
    BusDescription(#[from] DbcError),

    #[error(transparent)]
    SchemaGap(#[from] SchemaGapError),

    #[error("storage error: {0}")]
    Storage(#[source] StoreError),

    #[error("import cancelled")]
    Cancelled,
}

impl From<StoreError> for ImportErrorKind {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Cancelled => ImportErrorKind::Cancelled,
            other => ImportErrorKind::Storage(other),
        }
    }
}

/// Fatal import failure with the stage and segment it happened in.
#[derive(Debug, thiserror::Error)]
#[error("failed to import {segment} ({stage}): {kind}")]
pub struct ImportError {
    pub stage: ImportStage,
    pub segment: String,
    #[source]
    pub kind: ImportErrorKind,
}

impl ImportError {
    pub fn new(stage: ImportStage, segment: impl Into<String>, kind: impl Into<ImportErrorKind>) -> Self {
        Self {
            stage,
            segment: segment.into(),
            kind: kind.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ImportErrorKind::Cancelled)
    }
}
