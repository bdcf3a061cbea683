use std::path::PathBuf;

/// Errors raised while loading a bus description or encoding frames.
#[derive(Debug, thiserror::Error)]
pub enum DbcError {
    #[error("failed to read bus description '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {detail}")]
    Parse { line: usize, detail: String },

    #[error("no message with address 0x{0:X}")]
    UnknownMessage(u32),

    #[error("message 0x{address:X} has no signal '{signal}'")]
    UnknownSignal { address: u32, signal: String },
}
