//! CAN bus description parsing and signal decoding.
//!
//! [`BusDescription`] is parsed from DBC text. [`CanDecoder`] precomputes the
//! bit layout of every signal and turns `(address, payload)` pairs into
//! physical values named `CAN_0x<ADDR>_<signal>`.

mod bits;
mod dbc;
mod decoder;
mod error;

pub use bits::{ByteOrder, extract_raw, insert_raw, sign_extend};
pub use dbc::{BusDescription, MessageDef, Multiplex, SignalDef};
pub use decoder::{CanDecoder, DecodedSignal, signal_key};
pub use error::DbcError;
