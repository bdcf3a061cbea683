//! Log lines recorded by on-device daemons.

use segingest_core::{DataTypeDef, FieldDefs, Value};
use segingest_store::{LogKind, LogLine};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct DaemonRecord {
    msg: Option<serde_json::Value>,
    levelnum: Option<i64>,
    filename: Option<String>,
    funcname: Option<String>,
    lineno: Option<i64>,
    ctx: Option<DaemonContext>,
}

#[derive(Debug, Deserialize)]
struct DaemonContext {
    daemon: Option<String>,
}

/// Split a structured log line into its fields. Text that is not a JSON
/// record is kept verbatim as the message.
pub fn parse_log_line(text: &str, time: i64, kind: LogKind) -> LogLine {
    let mut line = LogLine {
        time,
        kind,
        daemon: None,
        levelnum: None,
        filename: None,
        funcname: None,
        lineno: None,
        message: text.to_string(),
    };
    let Ok(record) = serde_json::from_str::<DaemonRecord>(text) else {
        return line;
    };
    line.message = match record.msg {
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => line.message,
    };
    line.daemon = record.ctx.and_then(|c| c.daemon);
    line.levelnum = record.levelnum;
    line.filename = record.filename;
    line.funcname = record.funcname;
    line.lineno = record.lineno;
    line
}

/// The text carried by a log event: its first string field.
pub fn log_text<'v>(defs: &FieldDefs, value: &'v Value) -> Option<&'v str> {
    let Value::Struct(members) = value else {
        return None;
    };
    defs.iter()
        .zip(members)
        .find(|(def, _)| matches!(def.data_type(), DataTypeDef::String))
        .and_then(|(_, v)| v.try_str().ok().flatten())
}
