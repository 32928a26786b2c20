//! File-backed split descriptor

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use rill_core::SourceSplit;

/// One line-delimited JSON file, plain or gzip-compressed.
///
/// Serializable so the checkpoint coordinator can persist the pending split
/// list and a later run can resume from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSplit {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes at discovery time
    pub bytes: u64,
}

impl FileSplit {
    pub fn new(path: impl Into<PathBuf>, bytes: u64) -> Self {
        Self {
            path: path.into(),
            bytes,
        }
    }

    /// True if the file looks gzip-compressed
    pub fn is_gzip(&self) -> bool {
        self.path.extension().is_some_and(|ext| ext == "gz")
    }
}

impl SourceSplit for FileSplit {
    fn split_id(&self) -> String {
        self.path.display().to_string()
    }
}
