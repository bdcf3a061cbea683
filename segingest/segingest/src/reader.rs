//! Event-log reader.
//!
//! A segment's event log is an MCAP file: one channel per event variant (the
//! channel topic is the variant tag), a schema per channel and every message
//! stamped with the monotonic `log_time` in nanoseconds. The whole file is
//! memory-mapped and validated up front, so framing errors surface before
//! anything is written.

use std::{
    borrow::Cow,
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use memmap2::Mmap;
use segingest_core::{MessageEncoding, SchemaEncoding};

use crate::error::ReaderError;

/// Schema and encoding metadata of one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    pub id: u16,
    pub topic: String,
    pub schema_name: Option<String>,
    pub schema_encoding: SchemaEncoding,
    pub message_encoding: MessageEncoding,
    pub schema_data: Arc<[u8]>,
}

/// One event of the log.
#[derive(Debug, Clone)]
pub struct Event<'a> {
    pub channel: Arc<ChannelInfo>,
    /// Monotonic clock, nanoseconds.
    pub log_time: u64,
    pub data: Cow<'a, [u8]>,
}

impl Event<'_> {
    pub fn topic(&self) -> &str {
        &self.channel.topic
    }
}

/// Fully parsed event log in file order.
#[derive(Debug, Default)]
pub struct EventLog<'a> {
    channels: BTreeMap<u16, Arc<ChannelInfo>>,
    events: Vec<Event<'a>>,
}

impl<'a> EventLog<'a> {
    /// Parse an in-memory MCAP image. Any framing error fails the whole log.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, ReaderError> {
        let mut channels: BTreeMap<u16, Arc<ChannelInfo>> = BTreeMap::new();
        let mut events = Vec::new();

        for message in mcap::MessageStream::new(bytes)? {
            let message = message?;
            let channel = channels
                .entry(message.channel.id)
                .or_insert_with(|| Arc::new(channel_info(&message.channel)));
            events.push(Event {
                channel: Arc::clone(channel),
                log_time: message.log_time,
                data: message.data,
            });
        }

        Ok(Self { channels, events })
    }

    pub fn events(&self) -> &[Event<'a>] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Channels that carried at least one event, by id.
    pub fn channels(&self) -> impl Iterator<Item = &Arc<ChannelInfo>> {
        self.channels.values()
    }

    pub fn first_log_time(&self) -> Option<u64> {
        self.events.iter().map(|e| e.log_time).min()
    }

    pub fn last_log_time(&self) -> Option<u64> {
        self.events.iter().map(|e| e.log_time).max()
    }

    /// Events per topic.
    pub fn topic_counts(&self) -> BTreeMap<String, u64> {
        let mut by_channel: HashMap<u16, u64> = HashMap::new();
        for event in &self.events {
            *by_channel.entry(event.channel.id).or_default() += 1;
        }
        let mut counts = BTreeMap::new();
        for (id, n) in by_channel {
            if let Some(channel) = self.channels.get(&id) {
                *counts.entry(channel.topic.clone()).or_default() += n;
            }
        }
        counts
    }
}

fn channel_info(channel: &mcap::Channel<'_>) -> ChannelInfo {
    let (schema_name, schema_encoding, schema_data) = match &channel.schema {
        Some(schema) => (
            Some(schema.name.clone()),
            SchemaEncoding::from(schema.encoding.as_str()),
            Arc::from(schema.data.as_ref()),
        ),
        None => (None, SchemaEncoding::None, Arc::from(&[][..])),
    };
    ChannelInfo {
        id: channel.id,
        topic: channel.topic.clone(),
        schema_name,
        schema_encoding,
        message_encoding: MessageEncoding::from(channel.message_encoding.as_str()),
        schema_data,
    }
}

/// Memory-mapped event log on disk.
pub struct EventLogFile {
    path: PathBuf,
    mmap: Mmap,
}

impl EventLogFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReaderError> {
        let path = path.as_ref();
        let file = fs::File::open(path)?;
        // The mapping is read-only and lives as long as `self`.
        let mmap = unsafe { Mmap::map(&file) }?;
        Ok(Self {
            path: path.to_path_buf(),
            mmap,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<EventLog<'_>, ReaderError> {
        EventLog::parse(&self.mmap)
    }
}
