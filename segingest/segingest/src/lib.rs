//! Vehicle segment ingestion.
//!
//! [`Importer`] reads a segment's event log, walks every catalogued topic into
//! named samples, decodes raw CAN frames against a bus description, resolves
//! the segment's absolute start time and writes the result to a
//! [`segingest_store::Store`] in one transaction.
//!
//! ```no_run
//! use segingest::{CancelFlag, ImportConfig, Importer, NoopObserver};
//! use segingest_store::Store;
//!
//! let mut store = Store::open("segments.db")?;
//! let importer = Importer::new(ImportConfig::default());
//! let report = importer.import_segment(
//!     &mut store,
//!     "data/a2a0ccea32023010--0000002f--0".as_ref(),
//!     &NoopObserver,
//!     &CancelFlag::new(),
//! )?;
//! println!("{} samples", report.samples);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod can;
pub mod catalog;
mod config;
mod decoders;
mod error;
mod extract;
mod importer;
mod locks;
pub mod logmsg;
mod path;
mod progress;
mod reader;
pub mod time;
pub mod video;

pub use config::{DEFAULT_PROGRESS_INTERVAL, ImportConfig, ImportConfigBuilder};
pub use decoders::{ChannelDecoders, DecoderRegistry, DecoderRegistryBuilder};
pub use error::{ImportError, ImportErrorKind, ImportStage, ReaderError, SchemaGapError};
pub use extract::{DEFAULT_ARRAY_CAP, ExtractStats, FieldExtractor};
pub use importer::{ImportReport, Importer};
pub use locks::{SegmentLockGuard, SegmentLocks};
pub use path::SegmentPath;
pub use progress::{CancelFlag, FnObserver, ImportObserver, NoopObserver};
pub use reader::{ChannelInfo, Event, EventLog, EventLogFile};
