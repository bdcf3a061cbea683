//! Signal catalog: the registry that decides which topics get walked and how
//! signals are labelled.

use std::{collections::BTreeSet, fmt, str::FromStr};

use rusqlite::{Connection, params};

use crate::{
    error::{Result, StoreError},
    infer,
};

/// Declared value type of a catalogued signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalType {
    Float,
    Int,
    Bool,
    Enum,
}

impl SignalType {
    pub fn as_str(self) -> &'static str {
        match self {
            SignalType::Float => "float",
            SignalType::Int => "int",
            SignalType::Bool => "bool",
            SignalType::Enum => "enum",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "float" => Ok(SignalType::Float),
            "int" => Ok(SignalType::Int),
            "bool" => Ok(SignalType::Bool),
            "enum" => Ok(SignalType::Enum),
            other => Err(StoreError::UnknownSignalType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub signal_name: String,
    /// Topic whose payloads produce this signal; `None` for decoded CAN signals.
    pub message_type: Option<String>,
    pub signal_type: SignalType,
    pub unit: String,
    pub human_name: String,
}

impl CatalogEntry {
    /// Entry built purely from name heuristics.
    pub fn inferred(signal_name: &str) -> Self {
        let message_type = if signal_name.starts_with("CAN_") {
            None
        } else {
            signal_name.split('.').next().map(str::to_string)
        };
        Self {
            signal_name: signal_name.to_string(),
            message_type,
            signal_type: infer::infer_type(signal_name),
            unit: infer::infer_unit(signal_name).to_string(),
            human_name: infer::leaf_name(signal_name).to_string(),
        }
    }
}

/// Insert `entry` unless a row with the same name exists. Returns `true` when
/// a row was added.
pub(crate) fn ensure_registered(conn: &Connection, entry: &CatalogEntry) -> Result<bool> {
    let changed = conn
        .prepare_cached(
            "INSERT OR IGNORE INTO signal_catalog (signal_name, message_type, type, unit, human_name) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?
        .execute(params![
            entry.signal_name,
            entry.message_type,
            entry.signal_type.as_str(),
            entry.unit,
            entry.human_name,
        ])?;
    Ok(changed > 0)
}

pub(crate) fn message_types(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT message_type FROM signal_catalog \
         WHERE message_type IS NOT NULL AND message_type != ''",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    rows.collect::<std::result::Result<BTreeSet<_>, _>>()
        .map_err(StoreError::from)
}

pub(crate) fn entries(conn: &Connection) -> Result<Vec<CatalogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT signal_name, message_type, type, unit, human_name \
         FROM signal_catalog ORDER BY signal_name",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (signal_name, message_type, signal_type, unit, human_name) = row?;
        out.push(CatalogEntry {
            signal_name,
            message_type,
            signal_type: signal_type.parse()?,
            unit,
            human_name,
        });
    }
    Ok(out)
}

/// Register every sample name of the segment that the catalog does not know.
pub(crate) fn auto_register_missing(conn: &Connection, segment_id: i64) -> Result<Vec<CatalogEntry>> {
    let missing: Vec<String> = {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT s.signal_name FROM timeseries_samples s \
             LEFT JOIN signal_catalog c ON c.signal_name = s.signal_name \
             WHERE s.segment_id = ?1 AND c.signal_name IS NULL \
             ORDER BY s.signal_name",
        )?;
        let rows = stmt.query_map(params![segment_id], |row| row.get::<_, String>(0))?;
        rows.collect::<std::result::Result<_, _>>()?
    };

    let mut created = Vec::with_capacity(missing.len());
    for name in missing {
        let entry = CatalogEntry::inferred(&name);
        if ensure_registered(conn, &entry)? {
            created.push(entry);
        }
    }
    if !created.is_empty() {
        log::info!("registered {} new catalog entries", created.len());
    }
    Ok(created)
}
