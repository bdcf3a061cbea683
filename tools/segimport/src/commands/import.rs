use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use segingest::{
    CancelFlag, DEFAULT_ARRAY_CAP, FnObserver, ImportConfig, ImportReport, Importer, SegmentLocks,
};
use segingest_store::{DEFAULT_BATCH_SIZE, Store};

#[derive(Args)]
pub struct ImportArgs {
    /// Segment directories or event-log files
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// SQLite database path
    #[arg(long, default_value = "segments.db")]
    db: PathBuf,

    /// DBC bus description used to decode CAN frames
    #[arg(long)]
    dbc: Option<PathBuf>,

    /// Segments imported in parallel
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// List elements expanded per field
    #[arg(long, default_value_t = DEFAULT_ARRAY_CAP)]
    array_cap: usize,

    /// Rows buffered per table before a flush
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
}

struct Shared<'a> {
    importer: &'a Importer,
    locks: &'a SegmentLocks,
    cancel: &'a CancelFlag,
    multi: &'a MultiProgress,
    style: &'a ProgressStyle,
    db: &'a Path,
}

impl ImportArgs {
    pub fn run(self) -> Result<()> {
        let mut config = ImportConfig::builder()
            .with_array_cap(self.array_cap)
            .with_batch_size(self.batch_size);
        if let Some(dbc) = &self.dbc {
            config = config.with_bus_description(dbc);
        }
        let importer = Importer::new(config.build());

        // Create the schema once before workers open their own connections.
        Store::open(&self.db).with_context(|| format!("opening {}", self.db.display()))?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs.max(1))
            .build()?;
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}",
        )?
        .progress_chars("=>-");
        let locks = SegmentLocks::new();
        let cancel = CancelFlag::new();
        let multi = MultiProgress::new();
        let ctx = Shared {
            importer: &importer,
            locks: &locks,
            cancel: &cancel,
            multi: &multi,
            style: &style,
            db: &self.db,
        };

        let results: Vec<(&PathBuf, Result<ImportReport>)> = pool.install(|| {
            self.paths
                .par_iter()
                .map(|path| (path, import_one(&ctx, path)))
                .collect()
        });

        let mut failed = 0;
        for (path, result) in &results {
            match result {
                Ok(report) => println!(
                    "{}--{}: {} events, {} samples, {} CAN frames ({} decoded), {} log lines, time {}",
                    report.route_id,
                    report.segment_index,
                    report.events,
                    report.samples,
                    report.can_frames,
                    report.can_signals,
                    report.log_lines,
                    report
                        .time
                        .map(|t| format!("{} via {}", t.segment_start.to_rfc3339(), t.source))
                        .unwrap_or_else(|| "unresolved".to_string()),
                ),
                Err(e) => {
                    failed += 1;
                    eprintln!("{}: {e:#}", path.display());
                }
            }
        }
        if failed > 0 {
            bail!("{failed} of {} segments failed to import", results.len());
        }
        Ok(())
    }
}

fn import_one(ctx: &Shared<'_>, path: &Path) -> Result<ImportReport> {
    let (segment, _) = ctx.importer.locate(path)?;
    log::debug!("importing {segment} from {}", path.display());
    let key = SegmentLocks::key(&segment.route_id(), segment.segment_index);
    let Some(_guard) = ctx.locks.try_acquire(key) else {
        bail!("{segment} is already being imported");
    };

    let mut store = Store::open(ctx.db)?;
    let bar = ctx.multi.add(ProgressBar::new(100));
    bar.set_style(ctx.style.clone());
    bar.set_message(segment.to_string());
    let label = segment.to_string();
    let observer = FnObserver::new(
        |percent| bar.set_position(u64::from(percent)),
        |line| bar.set_message(format!("{label}: {line}")),
    );

    let report = ctx
        .importer
        .import_segment(&mut store, path, &observer, ctx.cancel);
    match &report {
        Ok(_) => bar.finish_with_message(format!("{label}: done")),
        Err(e) => bar.abandon_with_message(format!("{label}: {e}")),
    }
    Ok(report?)
}
