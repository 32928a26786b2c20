//! Line-delimited JSON source connector for rill
//!
//! A split is one `.jsonl` (or `.jsonl.gz`) file. Discovery globs a
//! directory into a deterministic split list; the record stream yields one
//! parsed JSON object per line; conversion maps flat objects onto a
//! [`RowSchema`](rill_core::RowSchema).

pub mod convert;
pub mod discover;
pub mod source;
pub mod split;

pub use convert::JsonRowConverter;
pub use discover::{DEFAULT_PATTERN, discover_splits};
pub use source::{JsonlSource, JsonlStream};
pub use split::FileSplit;
