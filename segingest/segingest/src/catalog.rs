//! Catalog seeding from channel schemas and bus descriptions.

use segingest_can::{BusDescription, SignalDef, signal_key};
use segingest_core::{DataTypeDef, FieldDefs};
use segingest_store::{CatalogEntry, SignalType, infer_unit};

use crate::{decoders::DecoderRegistry, error::SchemaGapError, reader::EventLog};

/// Topics that carry bookkeeping or raw frames rather than signals.
pub const BOOKKEEPING_TOPICS: &[&str] = &[
    "initData",
    "can",
    "sendcan",
    "logMessage",
    "errorLogMessage",
    "androidLog",
];

/// Entries for every scalar leaf reachable through structs in `defs`.
/// Lists and maps are not expanded.
pub fn schema_entries(topic: &str, defs: &FieldDefs) -> Vec<CatalogEntry> {
    let mut out = Vec::new();
    collect_leaves(topic, topic, defs, &mut out);
    out
}

fn collect_leaves(topic: &str, prefix: &str, defs: &FieldDefs, out: &mut Vec<CatalogEntry>) {
    for def in defs.iter() {
        let name = format!("{prefix}.{}", def.name);
        let signal_type = match def.data_type() {
            DataTypeDef::Struct(inner) => {
                collect_leaves(topic, &name, inner, out);
                continue;
            }
            DataTypeDef::Bool => SignalType::Bool,
            DataTypeDef::Enum(_) => SignalType::Enum,
            DataTypeDef::F32 | DataTypeDef::F64 => SignalType::Float,
            t if t.is_numeric() => SignalType::Int,
            _ => continue,
        };
        out.push(CatalogEntry {
            unit: infer_unit(&name).to_string(),
            human_name: def.name.clone(),
            signal_name: name,
            message_type: Some(topic.to_string()),
            signal_type,
        });
    }
}

/// Catalog entry for a decoded CAN signal, labelled from the bus description.
pub fn can_signal_entry(address: u32, signal: &SignalDef) -> CatalogEntry {
    let signal_type = if !signal.value_names.is_empty() {
        SignalType::Enum
    } else if signal.length == 1 {
        SignalType::Bool
    } else {
        SignalType::Float
    };
    CatalogEntry {
        signal_name: signal_key(address, &signal.name),
        message_type: None,
        signal_type,
        unit: signal.unit.clone(),
        human_name: signal
            .comment
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| signal.name.clone()),
    }
}

/// Entries for every signal of every message in `bus`.
pub fn bus_entries(bus: &BusDescription) -> Vec<CatalogEntry> {
    bus.messages()
        .flat_map(|m| m.signals.iter().map(move |s| can_signal_entry(m.id, s)))
        .collect()
}

/// Result of walking the schemas of an event log.
#[derive(Debug, Default)]
pub struct SchemaSeed {
    pub entries: Vec<CatalogEntry>,
    /// Topics whose schema could not be used.
    pub skipped: Vec<SchemaGapError>,
}

/// Entries for every signal-bearing topic in `log`, from schemas alone.
pub fn seed_from_log(log: &EventLog<'_>, registry: &DecoderRegistry) -> SchemaSeed {
    let mut seed = SchemaSeed::default();
    for channel in log.channels() {
        if BOOKKEEPING_TOPICS.contains(&channel.topic.as_str()) {
            continue;
        }
        match registry.topic_decoder(channel) {
            Ok(decoder) => seed
                .entries
                .extend(schema_entries(&channel.topic, decoder.field_defs())),
            Err(e) => {
                log::warn!("not registering '{}': {e}", channel.topic);
                seed.skipped.push(e);
            }
        }
    }
    seed
}
