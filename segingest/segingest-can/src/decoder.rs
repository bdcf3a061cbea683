use std::collections::HashMap;

use crate::{
    bits,
    dbc::{BusDescription, MessageDef, Multiplex, SignalDef},
    error::DbcError,
};

/// Storage name of a decoded CAN signal, e.g. `CAN_0x1A4_SPEED`.
pub fn signal_key(address: u32, signal: &str) -> String {
    format!("CAN_0x{address:03X}_{signal}")
}

/// One physical value decoded from a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedSignal<'a> {
    pub name: &'a str,
    pub value: f64,
    pub definition: &'a SignalDef,
}

struct CompiledSignal {
    key: String,
    layout: Vec<u16>,
    definition: SignalDef,
}

impl CompiledSignal {
    fn new(address: u32, definition: &SignalDef) -> Self {
        Self {
            key: signal_key(address, &definition.name),
            layout: bits::layout(definition.start_bit, definition.length, definition.byte_order),
            definition: definition.clone(),
        }
    }

    fn raw(&self, payload: &[u8]) -> Option<u64> {
        if self.layout.is_empty() || self.layout.len() > 64 {
            return None;
        }
        bits::read_layout(payload, &self.layout)
    }

    fn physical(&self, raw: u64) -> f64 {
        let raw = if self.definition.signed {
            bits::sign_extend(raw, self.definition.length) as f64
        } else {
            raw as f64
        };
        raw * self.definition.scale + self.definition.offset
    }
}

struct CompiledMessage {
    dlc: usize,
    multiplexor: Option<usize>,
    signals: Vec<CompiledSignal>,
}

/// Decodes frames against a [`BusDescription`] with precomputed bit layouts.
pub struct CanDecoder {
    bus: BusDescription,
    messages: HashMap<u32, CompiledMessage>,
}

impl CanDecoder {
    pub fn new(bus: BusDescription) -> Self {
        let messages = bus
            .messages()
            .map(|m| (m.id, compile(m)))
            .collect();
        Self { bus, messages }
    }

    pub fn bus(&self) -> &BusDescription {
        &self.bus
    }

    /// Decode every signal of the frame at `address`.
    ///
    /// Unknown addresses yield nothing. Signals that do not fit in `payload`
    /// and multiplexed signals whose selector does not match are skipped.
    pub fn decode(&self, address: u32, payload: &[u8]) -> Vec<DecodedSignal<'_>> {
        let Some(message) = self.messages.get(&address) else {
            return Vec::new();
        };

        let selector = message
            .multiplexor
            .and_then(|idx| message.signals[idx].raw(payload));

        let mut out = Vec::with_capacity(message.signals.len());
        for signal in &message.signals {
            if let Some(Multiplex::Multiplexed(k)) = signal.definition.multiplex {
                if selector != Some(u64::from(k)) {
                    continue;
                }
            }
            match signal.raw(payload) {
                Some(raw) => out.push(DecodedSignal {
                    name: &signal.key,
                    value: signal.physical(raw),
                    definition: &signal.definition,
                }),
                None => log::trace!(
                    "{} does not fit in {} byte payload",
                    signal.key,
                    payload.len()
                ),
            }
        }
        out
    }

    /// Build a payload of the message's DLC from physical values.
    ///
    /// Signals not listed are left at zero. Raw values are rounded and
    /// truncated to the signal width.
    pub fn encode(&self, address: u32, values: &[(&str, f64)]) -> Result<Vec<u8>, DbcError> {
        let message = self
            .messages
            .get(&address)
            .ok_or(DbcError::UnknownMessage(address))?;
        let mut payload = vec![0u8; message.dlc];

        for (name, physical) in values {
            let signal = message
                .signals
                .iter()
                .find(|s| s.definition.name == *name)
                .ok_or_else(|| DbcError::UnknownSignal {
                    address,
                    signal: name.to_string(),
                })?;
            let def = &signal.definition;
            let raw = ((physical - def.offset) / def.scale).round() as i64 as u64;
            let raw = if def.length >= 64 {
                raw
            } else {
                raw & ((1u64 << def.length) - 1)
            };
            bits::write_layout(&mut payload, &signal.layout, raw);
        }
        Ok(payload)
    }
}

fn compile(message: &MessageDef) -> CompiledMessage {
    let signals: Vec<CompiledSignal> = message
        .signals
        .iter()
        .map(|s| CompiledSignal::new(message.id, s))
        .collect();
    let multiplexor = signals
        .iter()
        .position(|s| s.definition.multiplex == Some(Multiplex::Multiplexor));
    let dlc = signals
        .iter()
        .map(|s| bits::required_len(&s.layout))
        .fold(usize::from(message.dlc), usize::max);
    CompiledMessage {
        dlc,
        multiplexor,
        signals,
    }
}
