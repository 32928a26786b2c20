//! rill - poll-driven streaming reader for jsonl datasets
//!
//! Discovers file splits, drains them through the source reader into
//! parquet, and keeps a checkpoint of not-yet-started splits so an
//! interrupted run can resume where it left off.

use std::io::IsTerminal;

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::MultiProgress;

mod checkpoint;
mod cmd;

#[derive(Parser)]
#[command(name = "rill")]
#[command(about = "Poll-driven streaming reader for jsonl datasets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Read a dataset into parquet, with checkpoint/resume support
    Run(cmd::run::RunArgs),
    /// List the splits a run would read
    Plan(cmd::plan::PlanArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging:
    //   TTY:     quiet (warn) unless --debug  — the progress bar shows activity
    //   non-TTY: info unless --debug          — logs are the only progress indicator
    let multi = std::io::stderr().is_terminal().then(MultiProgress::new);
    let quiet = multi.is_some() && !cli.debug;
    rill_core::init_logging(quiet, cli.debug, multi.as_ref());

    match cli.command {
        Command::Run(args) => cmd::run::run(args, multi.as_ref()),
        Command::Plan(args) => cmd::plan::run(args),
    }
}
