use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use segingest::{
    DecoderRegistry, EventLogFile,
    catalog::{bus_entries, seed_from_log},
};
use segingest_can::BusDescription;
use segingest_store::Store;

#[derive(Args)]
pub struct RegisterTypesArgs {
    /// Event log whose schemas describe the signals
    input: PathBuf,

    /// SQLite database path
    #[arg(long, default_value = "segments.db")]
    db: PathBuf,
}

impl RegisterTypesArgs {
    pub fn run(self) -> Result<()> {
        let file = EventLogFile::open(&self.input)
            .with_context(|| format!("opening {}", self.input.display()))?;
        let log = file.read()?;
        let seed = seed_from_log(&log, &DecoderRegistry::with_default_decoders());

        let mut store = Store::open(&self.db)?;
        let added = store.register_all(&seed.entries)?;
        println!(
            "registered {added} new of {} signals, {} topics skipped",
            seed.entries.len(),
            seed.skipped.len()
        );
        for gap in &seed.skipped {
            eprintln!("  {gap}");
        }
        Ok(())
    }
}

#[derive(Args)]
pub struct RegisterDbcArgs {
    /// DBC bus description
    input: PathBuf,

    /// SQLite database path
    #[arg(long, default_value = "segments.db")]
    db: PathBuf,
}

impl RegisterDbcArgs {
    pub fn run(self) -> Result<()> {
        let bus = BusDescription::from_file(&self.input)
            .with_context(|| format!("loading {}", self.input.display()))?;
        let entries = bus_entries(&bus);

        let mut store = Store::open(&self.db)?;
        let added = store.register_all(&entries)?;
        println!("registered {added} new of {} CAN signals", entries.len());
        Ok(())
    }
}
