//! Bit layout of CAN signals.
//!
//! Bit positions use the DBC numbering: position `p` is bit `p % 8` (LSB = 0)
//! of byte `p / 8`.

/// Byte order of a signal as declared by the `@0`/`@1` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// `@1`, start bit is the least significant bit.
    LittleEndian,
    /// `@0`, start bit is the most significant bit.
    BigEndian,
}

/// Payload bit positions of a signal, least significant bit first.
///
/// Empty when a position would not fit in `u16`.
pub(crate) fn layout(start_bit: u16, length: u16, order: ByteOrder) -> Vec<u16> {
    let positions = match order {
        ByteOrder::LittleEndian => (0..length).map(|i| start_bit.checked_add(i)).collect(),
        ByteOrder::BigEndian => big_endian_positions(start_bit, length),
    };
    positions.unwrap_or_default()
}

fn big_endian_positions(start_bit: u16, length: u16) -> Option<Vec<u16>> {
    let mut positions = Vec::with_capacity(usize::from(length));
    let mut pos = start_bit;
    for i in 0..length {
        positions.push(pos);
        if i + 1 == length {
            break;
        }
        pos = if pos % 8 == 0 { pos.checked_add(15)? } else { pos - 1 };
    }
    positions.reverse();
    Some(positions)
}

/// Number of payload bytes needed to hold every position in `layout`.
pub(crate) fn required_len(layout: &[u16]) -> usize {
    layout
        .iter()
        .map(|p| usize::from(*p / 8) + 1)
        .max()
        .unwrap_or(0)
}

/// Read the unsigned raw value of a signal.
///
/// Returns `None` when the payload is too short for the signal.
pub fn extract_raw(data: &[u8], start_bit: u16, length: u16, order: ByteOrder) -> Option<u64> {
    if length == 0 || length > 64 {
        return None;
    }
    let layout = layout(start_bit, length, order);
    if layout.is_empty() {
        return None;
    }
    read_layout(data, &layout)
}

pub(crate) fn read_layout(data: &[u8], layout: &[u16]) -> Option<u64> {
    if required_len(layout) > data.len() {
        return None;
    }
    let mut raw = 0u64;
    for (i, pos) in layout.iter().enumerate() {
        let byte = data[usize::from(*pos / 8)];
        if (byte >> (*pos % 8)) & 1 == 1 {
            raw |= 1 << i;
        }
    }
    Some(raw)
}

/// Write the low `length` bits of `raw` into `data`.
///
/// Returns `false` without touching `data` when it is too short.
pub fn insert_raw(data: &mut [u8], start_bit: u16, length: u16, order: ByteOrder, raw: u64) -> bool {
    if length == 0 || length > 64 {
        return false;
    }
    let layout = layout(start_bit, length, order);
    !layout.is_empty() && write_layout(data, &layout, raw)
}

pub(crate) fn write_layout(data: &mut [u8], layout: &[u16], raw: u64) -> bool {
    if required_len(layout) > data.len() {
        return false;
    }
    for (i, pos) in layout.iter().enumerate() {
        let idx = usize::from(*pos / 8);
        let mask = 1u8 << (*pos % 8);
        if (raw >> i) & 1 == 1 {
            data[idx] |= mask;
        } else {
            data[idx] &= !mask;
        }
    }
    true
}

/// Interpret the low `length` bits of `raw` as two's complement.
pub fn sign_extend(raw: u64, length: u16) -> i64 {
    if length == 0 || length >= 64 {
        return raw as i64;
    }
    let sign_bit = 1u64 << (length - 1);
    if raw & sign_bit != 0 {
        (raw | !((1u64 << length) - 1)) as i64
    } else {
        raw as i64
    }
}
