//! Checkpoint file persistence
//!
//! The core only promises a consistent in-memory snapshot of pending
//! splits; making it durable is the coordinator's job. Here that is a JSON
//! file written with the same tmp→rename discipline the parquet sink uses,
//! so a half-written checkpoint never shadows the previous good one.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rill_jsonl::FileSplit;

/// Persisted snapshot of the splits not yet started at `created_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub splits: Vec<FileSplit>,
}

impl Checkpoint {
    pub fn new(id: u64, splits: Vec<FileSplit>) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            splits,
        }
    }
}

/// Write atomically: serialize to `<path>.tmp`, then rename into place
pub fn save(path: &Path, checkpoint: &Checkpoint) -> io::Result<()> {
    let tmp = path.with_extension("tmp");
    let body = serde_json::to_vec_pretty(checkpoint).map_err(io::Error::other)?;
    fs::write(&tmp, body)?;
    fs::rename(&tmp, path)?;
    log::debug!(
        "checkpoint {} written, {} splits pending",
        checkpoint.id,
        checkpoint.splits.len()
    );
    Ok(())
}

pub fn load(path: &Path) -> io::Result<Checkpoint> {
    let body = fs::read(path)?;
    serde_json::from_slice(&body).map_err(io::Error::other)
}
