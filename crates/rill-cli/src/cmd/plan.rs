//! Plan subcommand — list the splits a run would read

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use rill_jsonl::discover_splits;

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Directory containing the jsonl splits
    pub input: PathBuf,

    /// Glob pattern selecting split files within the input directory
    #[arg(long, default_value = rill_jsonl::DEFAULT_PATTERN)]
    pub pattern: String,
}

pub fn run(args: PlanArgs) -> Result<()> {
    let splits = discover_splits(&args.input, &args.pattern)
        .with_context(|| format!("discover splits in {}", args.input.display()))?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Split").fg(Color::Cyan),
            Cell::new("Bytes").fg(Color::Cyan),
            Cell::new("Compressed").fg(Color::Cyan),
        ]);

    let mut total_bytes = 0u64;
    for split in &splits {
        total_bytes += split.bytes;
        table.add_row(vec![
            split.path.display().to_string(),
            split.bytes.to_string(),
            if split.is_gzip() { "gzip" } else { "-" }.to_string(),
        ]);
    }

    eprintln!("\n{table}");
    log::info!("{} splits, {} bytes total", splits.len(), total_bytes);
    Ok(())
}
