//! Record-stream adapter contract — how a split turns into raw records

use std::io;

use crate::split::SourceSplit;

/// One open split's records, yielded in the stream's own order.
///
/// `io::Error` is the transport for adapter failures; the reader wraps it
/// with split context. `close` must be safe to call after a mid-iteration
/// failure, since the reader calls it on every exit path.
pub trait RecordStream {
    type Raw;

    /// Next raw record, or `None` once the split is exhausted
    fn next_record(&mut self) -> io::Result<Option<Self::Raw>>;

    /// Release whatever the stream holds
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Opens a record stream for one split.
///
/// Implementations own whatever handle is needed to reach the data (a
/// directory, a table, a connection pool); opening a split must not consume
/// or mutate the split descriptor itself.
pub trait RecordSource<S: SourceSplit> {
    type Stream: RecordStream;

    fn open(&self, split: &S) -> io::Result<Self::Stream>;
}
