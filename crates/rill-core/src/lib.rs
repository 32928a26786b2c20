//! rill core — per-task streaming source reader
//!
//! A reader instance owns a growing queue of assigned input splits, drains
//! them one per poll cycle through a pluggable record-stream adapter into a
//! downstream collector, and exposes the not-yet-started splits as
//! recoverable checkpoint state. Split assignment, record streams, and the
//! emission sink are trait seams; this crate ships a parquet sink and an
//! in-memory collector.

pub mod collect;
pub mod error;
pub mod logging;
pub mod reader;
pub mod row;
pub mod shutdown;
pub mod sink;
pub mod source;
pub mod split;

// Re-exports for convenience
pub use collect::{Collector, VecCollector};
pub use error::ReadError;
pub use logging::init_logging;
pub use reader::{DEFAULT_BACKOFF, PollOutcome, ReaderConfig, ReaderPhase, SourceReader};
pub use row::{ConvertError, Field, FieldType, Row, RowConverter, RowSchema, SchemaError, Value};
pub use shutdown::ShutdownFlag;
pub use sink::{ParquetRowSink, cleanup_tmp_files, is_valid_parquet};
pub use source::{RecordSource, RecordStream};
pub use split::{SourceSplit, SplitQueue};
