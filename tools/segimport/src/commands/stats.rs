use std::path::PathBuf;

use anyhow::Result;
use chrono::DateTime;
use clap::Args;
use segingest_store::Store;

#[derive(Args)]
pub struct StatsArgs {
    /// SQLite database path
    #[arg(long, default_value = "segments.db")]
    db: PathBuf,

    /// Also list the segments of this route
    #[arg(short, long)]
    route: Option<String>,
}

impl StatsArgs {
    pub fn run(self) -> Result<()> {
        let store = Store::open(&self.db)?;
        let stats = store.stats()?;
        println!("routes          {}", stats.routes);
        println!("segments        {}", stats.segments);
        println!("samples         {}", stats.samples);
        println!("CAN frames      {}", stats.can_frames);
        println!("log lines       {}", stats.log_lines);
        println!("video frames    {}", stats.video_frames);
        println!("catalog entries {}", stats.catalog_entries);

        if let Some(route_id) = &self.route {
            match store.route(route_id)? {
                Some(route) => println!(
                    "\n{route_id}: start {} ({})",
                    route
                        .start_timestamp
                        .and_then(DateTime::from_timestamp_millis)
                        .map(|ts| ts.to_rfc3339())
                        .unwrap_or_else(|| "unknown".to_string()),
                    route.start_source.as_deref().unwrap_or("none"),
                ),
                None => println!("\n{route_id}: not found"),
            }
            for segment in store.route_segments(route_id)? {
                let counts = store.segment_counts(segment.segment_id)?;
                println!(
                    "  {:>4}  {:<20} {:>10} samples {:>8} CAN {:>6} logs",
                    segment.segment_index,
                    segment.time_source.as_deref().unwrap_or("-"),
                    counts.samples,
                    counts.can_frames,
                    counts.log_lines,
                );
            }
        }
        Ok(())
    }
}
