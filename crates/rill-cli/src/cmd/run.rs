//! Run subcommand — drive a full read of a jsonl dataset into parquet
//!
//! Wires the three actors around one source reader: an assignment thread
//! feeding discovered splits (optionally trickled to mimic a live
//! enumerator), a checkpoint thread periodically persisting the pending
//! split list, and the driving loop polling the reader into the parquet
//! sink on this thread.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use signal_hook::consts::{SIGINT, SIGTERM};

use rill_core::{
    cleanup_tmp_files, ParquetRowSink, PollOutcome, ReaderConfig, RowSchema, ShutdownFlag,
    SourceReader,
};
use rill_jsonl::{discover_splits, JsonRowConverter, JsonlSource};

use crate::checkpoint::{self, Checkpoint};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Directory containing the jsonl splits
    pub input: PathBuf,

    /// Glob pattern selecting split files within the input directory
    #[arg(long, default_value = rill_jsonl::DEFAULT_PATTERN)]
    pub pattern: String,

    /// Row schema, e.g. "id:int,name:str?,score:float"
    #[arg(short, long)]
    pub schema: String,

    /// Output parquet file
    #[arg(short, long, default_value = "rows.parquet")]
    pub output: PathBuf,

    /// Zstd compression level for parquet output (1-22)
    #[arg(long, default_value_t = 3)]
    pub zstd_level: i32,

    /// Idle backoff when no split is ready, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub backoff_ms: u64,

    /// Checkpoint file; enables periodic snapshots of pending splits
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,

    /// Seconds between checkpoint snapshots
    #[arg(long, default_value_t = 10)]
    pub checkpoint_interval: u64,

    /// Start from the splits recorded in the checkpoint file instead of
    /// re-discovering the input directory
    #[arg(long, requires = "checkpoint")]
    pub resume: bool,

    /// Milliseconds between single-split assignments (0 = assign all at
    /// once); simulates a live split enumerator
    #[arg(long, default_value_t = 0)]
    pub stagger_ms: u64,
}

pub fn run(args: RunArgs, progress: Option<&MultiProgress>) -> Result<()> {
    let started = Instant::now();
    let schema = RowSchema::parse(&args.schema).context("invalid --schema")?;

    let (splits, first_checkpoint_id) = if args.resume {
        let path = args.checkpoint.as_ref().expect("clap enforces --checkpoint");
        let cp = checkpoint::load(path)
            .with_context(|| format!("load checkpoint {}", path.display()))?;
        log::info!(
            "resuming from checkpoint {} ({} splits pending)",
            cp.id,
            cp.splits.len()
        );
        (cp.splits, cp.id + 1)
    } else {
        let splits = discover_splits(&args.input, &args.pattern)
            .with_context(|| format!("discover splits in {}", args.input.display()))?;
        (splits, 1)
    };

    if splits.is_empty() {
        log::warn!("no splits to read");
        return Ok(());
    }
    let total = splits.len();
    log::info!("reading {total} splits from {}", args.input.display());

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
            cleanup_tmp_files(parent)?;
        }
    }

    let shutdown = ShutdownFlag::new();
    for sig in [SIGINT, SIGTERM] {
        signal_hook::flag::register(sig, std::sync::Arc::clone(shutdown.atomic()))?;
    }

    let reader = SourceReader::new(
        JsonlSource,
        JsonRowConverter::new(schema.clone()),
        ReaderConfig {
            backoff: Duration::from_millis(args.backoff_ms),
            shutdown: shutdown.clone(),
        },
    );
    reader.open();

    let mut sink = ParquetRowSink::create(&args.output, &schema, args.zstd_level)
        .with_context(|| format!("create sink {}", args.output.display()))?;

    let pb = overall_bar(progress, total as u64);
    let done = AtomicBool::new(false);
    let checkpoint_seq = AtomicU64::new(first_checkpoint_id);

    let drive = std::thread::scope(|scope| -> Result<(usize, bool)> {
        let reader = &reader;

        // assignment producer
        let assign_shutdown = shutdown.clone();
        let stagger_ms = args.stagger_ms;
        scope.spawn(move || {
            if stagger_ms == 0 {
                reader.add_splits(splits);
            } else {
                for split in splits {
                    if assign_shutdown.requested() {
                        break;
                    }
                    reader.add_splits(vec![split]);
                    std::thread::sleep(Duration::from_millis(stagger_ms));
                }
            }
            reader.handle_no_more_splits();
        });

        // checkpoint coordinator
        if let Some(path) = args.checkpoint.as_deref() {
            let done = &done;
            let seq = &checkpoint_seq;
            let ck_shutdown = shutdown.clone();
            let interval = Duration::from_secs(args.checkpoint_interval);
            scope.spawn(move || {
                loop {
                    let deadline = Instant::now() + interval;
                    while Instant::now() < deadline
                        && !done.load(Ordering::Relaxed)
                        && !ck_shutdown.requested()
                    {
                        std::thread::sleep(Duration::from_millis(50));
                    }
                    if done.load(Ordering::Relaxed) || ck_shutdown.requested() {
                        break;
                    }
                    let id = seq.fetch_add(1, Ordering::Relaxed);
                    let pending = reader.snapshot_state(id);
                    match checkpoint::save(path, &Checkpoint::new(id, pending)) {
                        Ok(()) => reader.notify_checkpoint_complete(id),
                        Err(e) => log::warn!("checkpoint {id} failed: {e}"),
                    }
                }
            });
        }

        // driving loop
        let mut splits_read = 0usize;
        let mut interrupted = false;
        let mut failure = None;
        loop {
            if shutdown.requested() {
                log::warn!("shutdown requested, stopping after current split");
                interrupted = true;
                break;
            }
            match reader.poll_next(&mut sink) {
                Ok(PollOutcome::Read { .. }) => {
                    splits_read += 1;
                    pb.inc(1);
                }
                Ok(PollOutcome::Waiting) => {}
                Ok(PollOutcome::Complete) => break,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        done.store(true, Ordering::Relaxed);
        match failure {
            Some(e) => Err(e).context("split read failed"),
            None => Ok((splits_read, interrupted)),
        }
    });
    pb.finish_and_clear();
    let (splits_read, interrupted) = drive?;

    // Interrupted runs leave a final checkpoint so --resume picks up the
    // splits that never started.
    if interrupted {
        if let Some(path) = args.checkpoint.as_deref() {
            let id = checkpoint_seq.fetch_add(1, Ordering::Relaxed);
            let pending = reader.snapshot_state(id);
            checkpoint::save(path, &Checkpoint::new(id, pending))
                .with_context(|| format!("final checkpoint {}", path.display()))?;
            reader.notify_checkpoint_complete(id);
        }
    }

    reader.close();
    let rows_written = sink.finish().context("finalize parquet output")?;

    let summary = RunSummary {
        total_splits: total,
        splits_read,
        rows_written,
        interrupted,
        elapsed: started.elapsed(),
    };
    summary.log();
    Ok(())
}

fn overall_bar(progress: Option<&MultiProgress>, total: u64) -> ProgressBar {
    match progress {
        Some(multi) => {
            let pb = multi.add(ProgressBar::new(total));
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} splits ({eta})",
                )
                .expect("invalid template")
                .progress_chars("=>-"),
            );
            pb
        }
        None => ProgressBar::hidden(),
    }
}

/// Totals for one run
#[derive(Debug)]
pub struct RunSummary {
    pub total_splits: usize,
    pub splits_read: usize,
    pub rows_written: usize,
    pub interrupted: bool,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn log(&self) {
        log::info!("=== Run Summary ===");
        log::info!(
            "Splits: {}/{} read{}",
            self.splits_read,
            self.total_splits,
            if self.interrupted { " (interrupted)" } else { "" }
        );
        log::info!("Rows: {}", self.rows_written);
        log::info!("Time: {:.1}s", self.elapsed.as_secs_f64());
        if self.rows_written > 0 && !self.elapsed.is_zero() {
            let rows_per_sec = self.rows_written as f64 / self.elapsed.as_secs_f64();
            log::info!("Throughput: {rows_per_sec:.0} rows/sec");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_log_does_not_panic() {
        let summary = RunSummary {
            total_splits: 4,
            splits_read: 3,
            rows_written: 1200,
            interrupted: true,
            elapsed: Duration::from_secs(2),
        };
        summary.log();
    }

    #[test]
    fn summary_log_zero_rows() {
        let summary = RunSummary {
            total_splits: 0,
            splits_read: 0,
            rows_written: 0,
            interrupted: false,
            elapsed: Duration::ZERO,
        };
        summary.log();
    }
}
