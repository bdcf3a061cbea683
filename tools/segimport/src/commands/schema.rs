use std::{fs, path::PathBuf};

use anyhow::{Result, anyhow};
use clap::Args;
use segingest::{DecoderRegistry, EventLogFile};
use segingest_core::format_field_defs;

#[derive(Args)]
pub struct SchemaArgs {
    /// Path to the event log
    input: PathBuf,

    /// Topic to describe; lists topics and message counts when omitted
    #[arg(short, long)]
    topic: Option<String>,

    /// Output file path (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl SchemaArgs {
    pub fn run(self) -> Result<()> {
        let file = EventLogFile::open(&self.input)?;
        let log = file.read()?;

        let text = match &self.topic {
            Some(topic) => {
                let channel = log
                    .channels()
                    .find(|c| &c.topic == topic)
                    .ok_or_else(|| anyhow!("topic '{topic}' not found in {}", self.input.display()))?;
                let registry = DecoderRegistry::with_default_decoders();
                let decoder = registry.topic_decoder(channel)?;
                format_field_defs(decoder.field_defs())?
            }
            None => log
                .topic_counts()
                .iter()
                .map(|(topic, n)| format!("{topic}\t{n}"))
                .collect::<Vec<_>>()
                .join("\n"),
        };

        match self.output {
            Some(path) => fs::write(path, format!("{text}\n"))?,
            None => println!("{text}"),
        }
        Ok(())
    }
}
