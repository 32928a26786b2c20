//! Split discovery — glob a directory into file splits

use std::io;
use std::path::Path;

use crate::split::FileSplit;

/// Matches plain and gzip-compressed line-delimited JSON files
pub const DEFAULT_PATTERN: &str = "*.jsonl*";

/// Scan `dir` for files matching `pattern` and build one split per file.
///
/// Results are sorted by path so discovery order is deterministic across
/// runs; the split-assignment side relies on that when it re-discovers after
/// a restart.
pub fn discover_splits(dir: &Path, pattern: &str) -> io::Result<Vec<FileSplit>> {
    let full = dir.join(pattern);
    let full = full
        .to_str()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "non-utf8 path"))?;

    let mut splits = Vec::new();
    for entry in glob::glob(full).map_err(io::Error::other)? {
        let path = entry.map_err(io::Error::other)?;
        if !path.is_file() {
            continue;
        }
        let bytes = path.metadata()?.len();
        splits.push(FileSplit::new(path, bytes));
    }
    splits.sort_by(|a, b| a.path.cmp(&b.path));
    log::debug!("discovered {} splits under {}", splits.len(), dir.display());
    Ok(splits)
}
