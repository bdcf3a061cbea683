//! DBC bus description parser built from `nom` line combinators.
//!
//! Understood statements:
//!
//! - `BO_ <id> <name>: <dlc> <transmitter>`
//! - ` SG_ <name> [M|m<k>] : <start>|<len>@<0|1><+|-> (<scale>,<offset>) [<min>|<max>] "<unit>" <receivers>`
//! - `CM_ BO_ <id> "<text>";` and `CM_ SG_ <id> <name> "<text>";`, possibly spanning lines
//! - `VAL_ <id> <name> <n> "<label>" ... ;`
//!
//! Every other keyword is skipped.

use std::{collections::BTreeMap, fs, path::Path};

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{alpha1, alphanumeric1, char, i64 as nom_i64, one_of, space0, u32 as nom_u32},
    combinator::{map, opt, recognize, value},
    multi::many0,
    number::complete::double,
    sequence::{delimited, pair, preceded, separated_pair, tuple},
};

use crate::{bits::ByteOrder, error::DbcError};

const EXTENDED_ID_FLAG: u32 = 0x8000_0000;
/// Bit positions of a 64 byte CAN FD payload.
const MAX_BIT_POSITION: u16 = 512;

/// Role of a signal in a multiplexed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplex {
    /// The selector signal (`M`).
    Multiplexor,
    /// Present only when the selector's raw value equals the payload (`m<k>`).
    Multiplexed(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalDef {
    pub name: String,
    pub start_bit: u16,
    pub length: u16,
    pub byte_order: ByteOrder,
    pub signed: bool,
    pub scale: f64,
    pub offset: f64,
    pub min: f64,
    pub max: f64,
    pub unit: String,
    pub comment: Option<String>,
    pub value_names: BTreeMap<i64, String>,
    pub multiplex: Option<Multiplex>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageDef {
    pub id: u32,
    pub name: String,
    pub dlc: u8,
    pub transmitter: Option<String>,
    pub comment: Option<String>,
    pub signals: Vec<SignalDef>,
}

impl MessageDef {
    pub fn signal(&self, name: &str) -> Option<&SignalDef> {
        self.signals.iter().find(|s| s.name == name)
    }

    fn signal_mut(&mut self, name: &str) -> Option<&mut SignalDef> {
        self.signals.iter_mut().find(|s| s.name == name)
    }
}

/// Messages and signals of one CAN bus, keyed by frame address.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusDescription {
    messages: BTreeMap<u32, MessageDef>,
}

impl BusDescription {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DbcError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| DbcError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&String::from_utf8_lossy(&bytes))
    }

    pub fn parse(text: &str) -> Result<Self, DbcError> {
        let mut messages: BTreeMap<u32, MessageDef> = BTreeMap::new();
        let mut current: Option<u32> = None;

        for (line_no, statement) in statements(text) {
            let trimmed = statement.trim();
            let err = |detail: String| DbcError::Parse {
                line: line_no,
                detail,
            };

            if trimmed.starts_with("BO_ ") {
                let message = parse_statement(message_line, trimmed)
                    .map_err(|e| err(format!("malformed message definition: {e}")))?;
                current = Some(message.id);
                messages.insert(message.id, message);
            } else if trimmed.starts_with("SG_ ") {
                let signal = parse_statement(signal_line, trimmed)
                    .map_err(|e| err(format!("malformed signal definition: {e}")))?;
                if signal.start_bit >= MAX_BIT_POSITION {
                    return Err(err(format!(
                        "signal {} starts at bit {}, beyond a 64 byte frame",
                        signal.name, signal.start_bit
                    )));
                }
                if signal.length == 0 || signal.length > 64 {
                    return Err(err(format!(
                        "signal {} has unsupported length {}",
                        signal.name, signal.length
                    )));
                }
                let id = current.ok_or_else(|| err("signal outside of a message".to_string()))?;
                if let Some(message) = messages.get_mut(&id) {
                    message.signals.push(signal);
                }
            } else if trimmed.starts_with("CM_ ") {
                current = None;
                match comment_line(trimmed) {
                    Ok((_, Comment::Message { id, text })) => match messages.get_mut(&id) {
                        Some(message) => message.comment = Some(text),
                        None => log::debug!("line {line_no}: comment for unknown message {id}"),
                    },
                    Ok((_, Comment::Signal { id, name, text })) => {
                        match messages.get_mut(&id).and_then(|m| m.signal_mut(&name)) {
                            Some(signal) => signal.comment = Some(text),
                            None => log::debug!("line {line_no}: comment for unknown signal {name}"),
                        }
                    }
                    Err(_) => {}
                }
            } else if trimmed.starts_with("VAL_ ") {
                current = None;
                if let Ok((_, (id, name, table))) = value_line(trimmed) {
                    match messages.get_mut(&id).and_then(|m| m.signal_mut(&name)) {
                        Some(signal) => signal.value_names = table,
                        None => log::debug!("line {line_no}: value table for unknown signal {name}"),
                    }
                }
            } else if !trimmed.is_empty() {
                current = None;
            }
        }

        Ok(Self { messages })
    }

    pub fn message(&self, id: u32) -> Option<&MessageDef> {
        self.messages.get(&id)
    }

    pub fn messages(&self) -> impl Iterator<Item = &MessageDef> {
        self.messages.values()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Split DBC text into statements, joining comment lines until quotes balance.
fn statements(text: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, line) in text.lines().enumerate() {
        if let Some((start, mut buf)) = pending.take() {
            buf.push('\n');
            buf.push_str(line);
            if quotes_balanced(&buf) {
                out.push((start, buf));
            } else {
                pending = Some((start, buf));
            }
            continue;
        }
        if line.trim_start().starts_with("CM_ ") && !quotes_balanced(line) {
            pending = Some((idx + 1, line.to_string()));
        } else {
            out.push((idx + 1, line.to_string()));
        }
    }
    if let Some(rest) = pending {
        out.push(rest);
    }
    out
}

fn quotes_balanced(s: &str) -> bool {
    let mut count = 0usize;
    let mut escaped = false;
    for c in s.chars() {
        match c {
            '\\' if !escaped => {
                escaped = true;
                continue;
            }
            '"' if !escaped => count += 1,
            _ => {}
        }
        escaped = false;
    }
    count % 2 == 0
}

fn parse_statement<'a, T>(
    parser: impl Fn(&'a str) -> IResult<&'a str, T>,
    input: &'a str,
) -> Result<T, String> {
    match parser(input) {
        Ok((_, parsed)) => Ok(parsed),
        Err(e) => Err(e.to_string()),
    }
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

fn ws(input: &str) -> IResult<&str, ()> {
    value((), space0)(input)
}

fn ws1(input: &str) -> IResult<&str, ()> {
    value((), take_while1(|c: char| c.is_whitespace()))(input)
}

fn frame_id(input: &str) -> IResult<&str, u32> {
    map(nom_u32, |id| {
        if id & EXTENDED_ID_FLAG != 0 {
            id & !EXTENDED_ID_FLAG
        } else {
            id
        }
    })(input)
}

fn quoted(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('"'), take_while(|c| c != '"'), char('"')),
        String::from,
    )(input)
}

fn message_line(input: &str) -> IResult<&str, MessageDef> {
    map(
        tuple((
            tag("BO_"),
            ws1,
            frame_id,
            ws1,
            identifier,
            ws,
            char(':'),
            ws,
            nom_u32,
            ws,
            opt(identifier),
        )),
        |(_, _, id, _, name, _, _, _, dlc, _, transmitter)| MessageDef {
            id,
            name: name.to_string(),
            dlc: u8::try_from(dlc).unwrap_or(u8::MAX),
            transmitter: transmitter.map(String::from),
            comment: None,
            signals: Vec::new(),
        },
    )(input)
}

fn multiplex_marker(input: &str) -> IResult<&str, Multiplex> {
    alt((
        map(
            tuple((char('m'), nom_u32, opt(char('M')))),
            |(_, k, _)| Multiplex::Multiplexed(k),
        ),
        value(Multiplex::Multiplexor, char('M')),
    ))(input)
}

fn bit_layout(input: &str) -> IResult<&str, (u16, u16, ByteOrder, bool)> {
    map(
        tuple((
            nom_u32,
            char('|'),
            nom_u32,
            char('@'),
            one_of("01"),
            one_of("+-"),
        )),
        |(start, _, len, _, order, sign)| {
            let order = if order == '1' {
                ByteOrder::LittleEndian
            } else {
                ByteOrder::BigEndian
            };
            (
                u16::try_from(start).unwrap_or(u16::MAX),
                u16::try_from(len).unwrap_or(u16::MAX),
                order,
                sign == '-',
            )
        },
    )(input)
}

fn factor_offset(input: &str) -> IResult<&str, (f64, f64)> {
    delimited(
        char('('),
        separated_pair(double, tuple((ws, char(','), ws)), double),
        char(')'),
    )(input)
}

fn range(input: &str) -> IResult<&str, (f64, f64)> {
    delimited(
        char('['),
        separated_pair(double, tuple((ws, char('|'), ws)), double),
        char(']'),
    )(input)
}

fn signal_line(input: &str) -> IResult<&str, SignalDef> {
    let (input, (_, _, name, _, multiplex, _, _, _)) = tuple((
        tag("SG_"),
        ws1,
        identifier,
        ws,
        opt(multiplex_marker),
        ws,
        char(':'),
        ws,
    ))(input)?;
    let (input, ((start_bit, length, byte_order, signed), _, (scale, offset), _, (min, max), _, unit)) =
        tuple((bit_layout, ws, factor_offset, ws, range, ws, quoted))(input)?;
    Ok((
        input,
        SignalDef {
            name: name.to_string(),
            start_bit,
            length,
            byte_order,
            signed,
            scale,
            offset,
            min,
            max,
            unit,
            comment: None,
            value_names: BTreeMap::new(),
            multiplex,
        },
    ))
}

enum Comment {
    Message { id: u32, text: String },
    Signal { id: u32, name: String, text: String },
}

fn comment_line(input: &str) -> IResult<&str, Comment> {
    preceded(
        pair(tag("CM_"), ws1),
        alt((
            map(
                tuple((tag("BO_"), ws1, frame_id, ws1, quoted)),
                |(_, _, id, _, text)| Comment::Message { id, text },
            ),
            map(
                tuple((tag("SG_"), ws1, frame_id, ws1, identifier, ws1, quoted)),
                |(_, _, id, _, name, _, text)| Comment::Signal {
                    id,
                    name: name.to_string(),
                    text,
                },
            ),
        )),
    )(input)
}

fn value_line(input: &str) -> IResult<&str, (u32, String, BTreeMap<i64, String>)> {
    map(
        tuple((
            tag("VAL_"),
            ws1,
            frame_id,
            ws1,
            identifier,
            many0(preceded(ws1, separated_pair(nom_i64, ws1, quoted))),
        )),
        |(_, _, id, _, name, entries)| (id, name.to_string(), entries.into_iter().collect()),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_line_with_multiplexed_marker() {
        let (_, sig) =
            signal_line(r#"SG_ TEMP m2 : 8|8@1- (0.5,-40) [-40|87.5] "degC" ECU1,ECU2"#).unwrap();
        assert_eq!(sig.name, "TEMP");
        assert_eq!(sig.multiplex, Some(Multiplex::Multiplexed(2)));
        assert_eq!(sig.start_bit, 8);
        assert!(sig.signed);
        assert_eq!(sig.scale, 0.5);
        assert_eq!(sig.offset, -40.0);
        assert_eq!(sig.unit, "degC");
    }

    #[test]
    fn multiline_comment_is_joined() {
        let stmts = statements("CM_ SG_ 1 A \"first\nsecond\";\nBO_ 2 B: 8 X");
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0].0, 1);
        assert_eq!(stmts[1].0, 3);
    }

    #[test]
    fn extended_id_flag_is_stripped() {
        let (_, id) = frame_id("2147484672").unwrap();
        assert_eq!(id, 0x400);
    }
}
