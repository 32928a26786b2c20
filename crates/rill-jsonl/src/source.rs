//! Record-stream adapter for line-delimited JSON files

use std::fs::File;
use std::io::{self, BufRead, BufReader};

use flate2::read::GzDecoder;

use rill_core::{RecordSource, RecordStream};

use crate::split::FileSplit;

/// Opens one [`FileSplit`] as a stream of parsed JSON objects, one per
/// non-blank line, in file order.
#[derive(Debug, Default)]
pub struct JsonlSource;

impl RecordSource<FileSplit> for JsonlSource {
    type Stream = JsonlStream;

    fn open(&self, split: &FileSplit) -> io::Result<JsonlStream> {
        let file = File::open(&split.path)?;
        let reader = if split.is_gzip() {
            LineReader::Gzip(BufReader::new(GzDecoder::new(file)))
        } else {
            LineReader::Plain(BufReader::new(file))
        };
        Ok(JsonlStream {
            reader,
            line: String::with_capacity(LINE_BUF_CAPACITY),
            line_no: 0,
        })
    }
}

/// Initial capacity for the per-line read buffer
const LINE_BUF_CAPACITY: usize = 4096;

enum LineReader {
    Plain(BufReader<File>),
    Gzip(BufReader<GzDecoder<File>>),
}

impl LineReader {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        match self {
            Self::Plain(r) => r.read_line(buf),
            Self::Gzip(r) => r.read_line(buf),
        }
    }
}

/// One open file's records. Blank lines are skipped; a line that fails to
/// parse as JSON is a mid-iteration failure carrying the line number.
pub struct JsonlStream {
    reader: LineReader,
    line: String,
    line_no: usize,
}

impl RecordStream for JsonlStream {
    type Raw = serde_json::Value;

    fn next_record(&mut self) -> io::Result<Option<serde_json::Value>> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let line = self.line.trim();
            if line.is_empty() {
                continue;
            }
            let record = serde_json::from_str(line).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("line {}: {e}", self.line_no),
                )
            })?;
            return Ok(Some(record));
        }
    }
}
