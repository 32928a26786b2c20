//! Parquet collector — batches canonical rows into Arrow and writes
//! zstd-compressed parquet with atomic tmp→rename

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema};
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;

use crate::collect::Collector;
use crate::row::{FieldType, Row, RowSchema, Value};

/// Rows buffered before flushing a `RecordBatch` to the writer
pub const DEFAULT_BATCH_SIZE: usize = 8192;

/// Map a row schema onto the equivalent Arrow schema
pub fn arrow_schema(schema: &RowSchema) -> ArrowSchema {
    let fields: Vec<ArrowField> = schema
        .fields()
        .iter()
        .map(|f| {
            let ty = match f.ty {
                FieldType::Bool => DataType::Boolean,
                FieldType::Int => DataType::Int64,
                FieldType::Float => DataType::Float64,
                FieldType::Str => DataType::Utf8,
            };
            ArrowField::new(&f.name, ty, f.nullable)
        })
        .collect();
    ArrowSchema::new(fields)
}

enum ColumnBuffer {
    Bool(Vec<Option<bool>>),
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Str(Vec<Option<String>>),
}

impl ColumnBuffer {
    fn for_type(ty: FieldType) -> Self {
        match ty {
            FieldType::Bool => Self::Bool(Vec::new()),
            FieldType::Int => Self::Int(Vec::new()),
            FieldType::Float => Self::Float(Vec::new()),
            FieldType::Str => Self::Str(Vec::new()),
        }
    }

    fn push(&mut self, value: Value) -> Result<(), String> {
        match (self, value) {
            (Self::Bool(col), Value::Bool(v)) => col.push(Some(v)),
            (Self::Int(col), Value::Int(v)) => col.push(Some(v)),
            (Self::Float(col), Value::Float(v)) => col.push(Some(v)),
            // int rows are widened into float columns
            (Self::Float(col), Value::Int(v)) => col.push(Some(v as f64)),
            (Self::Str(col), Value::Str(v)) => col.push(Some(v)),
            (Self::Bool(col), Value::Null) => col.push(None),
            (Self::Int(col), Value::Null) => col.push(None),
            (Self::Float(col), Value::Null) => col.push(None),
            (Self::Str(col), Value::Null) => col.push(None),
            (_, other) => return Err(other.type_name().to_string()),
        }
        Ok(())
    }

    fn take_array(&mut self) -> ArrayRef {
        match self {
            Self::Bool(col) => Arc::new(BooleanArray::from(std::mem::take(col))),
            Self::Int(col) => Arc::new(Int64Array::from(std::mem::take(col))),
            Self::Float(col) => Arc::new(Float64Array::from(std::mem::take(col))),
            Self::Str(col) => Arc::new(StringArray::from(std::mem::take(col))),
        }
    }
}

/// Collector writing rows to one parquet file.
///
/// `Collector::collect` cannot fail, so write errors are latched on first
/// occurrence: later rows are dropped and [`finish`](ParquetRowSink::finish)
/// surfaces the error. The file is written to `<path>.tmp` and renamed into
/// place only on a clean finish, so a crashed or failed run never leaves a
/// truncated file under the final name.
pub struct ParquetRowSink {
    schema: Arc<ArrowSchema>,
    columns: Vec<ColumnBuffer>,
    buffered: usize,
    writer: Option<ArrowWriter<File>>,
    tmp_path: PathBuf,
    final_path: PathBuf,
    rows_written: usize,
    error: Option<io::Error>,
}

impl std::fmt::Debug for ParquetRowSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParquetRowSink")
            .field("final_path", &self.final_path)
            .field("rows_written", &self.rows_written)
            .finish_non_exhaustive()
    }
}

impl ParquetRowSink {
    pub fn create(path: &Path, schema: &RowSchema, zstd_level: i32) -> io::Result<Self> {
        let final_path = path.to_path_buf();
        let tmp_path = path.with_extension("parquet.tmp");

        // Clean up stale tmp file
        if tmp_path.exists() {
            fs::remove_file(&tmp_path)?;
        }

        let file = File::create(&tmp_path)?;
        let level = ZstdLevel::try_new(zstd_level)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let props = WriterProperties::builder()
            .set_compression(Compression::ZSTD(level))
            .build();

        let arrow = Arc::new(arrow_schema(schema));
        let writer =
            ArrowWriter::try_new(file, Arc::clone(&arrow), Some(props)).map_err(io::Error::other)?;

        Ok(Self {
            columns: schema
                .fields()
                .iter()
                .map(|f| ColumnBuffer::for_type(f.ty))
                .collect(),
            schema: arrow,
            buffered: 0,
            writer: Some(writer),
            tmp_path,
            final_path,
            rows_written: 0,
            error: None,
        })
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    fn push_row(&mut self, row: Row) -> io::Result<()> {
        if row.len() != self.columns.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "row has {} values, schema has {} fields",
                    row.len(),
                    self.columns.len()
                ),
            ));
        }
        for (col, value) in self.columns.iter_mut().zip(row.into_values()) {
            col.push(value).map_err(|found| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("value of type {found} does not fit column"),
                )
            })?;
        }
        self.buffered += 1;
        Ok(())
    }

    fn flush_batch(&mut self) -> io::Result<()> {
        if self.buffered == 0 {
            return Ok(());
        }
        let arrays: Vec<ArrayRef> = self.columns.iter_mut().map(|c| c.take_array()).collect();
        let batch =
            RecordBatch::try_new(Arc::clone(&self.schema), arrays).map_err(io::Error::other)?;
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::other("sink already finished"))?;
        writer.write(&batch).map_err(io::Error::other)?;
        self.rows_written += self.buffered;
        self.buffered = 0;
        Ok(())
    }

    /// Flush remaining rows, close the writer, rename tmp → final.
    /// Surfaces any error latched during `collect`.
    pub fn finish(mut self) -> io::Result<usize> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.flush_batch()?;
        let writer = self
            .writer
            .take()
            .ok_or_else(|| io::Error::other("sink already finished"))?;
        writer.close().map_err(io::Error::other)?;
        fs::rename(&self.tmp_path, &self.final_path)?;
        Ok(self.rows_written)
    }
}

impl Collector for ParquetRowSink {
    fn collect(&mut self, row: Row) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.push_row(row) {
            log::error!("parquet sink failed, dropping further rows: {e}");
            self.error = Some(e);
            return;
        }
        if self.buffered >= DEFAULT_BATCH_SIZE {
            if let Err(e) = self.flush_batch() {
                log::error!("parquet sink failed, dropping further rows: {e}");
                self.error = Some(e);
            }
        }
    }

    fn signal_end_of_stream(&mut self) {
        log::debug!("end of stream reached");
    }
}

/// Check if a completed parquet file exists and has a valid footer
pub fn is_valid_parquet(path: &Path) -> bool {
    if !path.exists() {
        return false;
    }
    let file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };
    parquet::file::reader::SerializedFileReader::new(file).is_ok()
}

/// Remove stale .tmp files in the output directory
pub fn cleanup_tmp_files(output_dir: &Path) -> io::Result<()> {
    for entry in fs::read_dir(output_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "tmp") {
            log::warn!("Removing stale tmp file: {}", path.display());
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Field;
    use parquet::file::reader::FileReader;
    use tempfile::TempDir;

    fn schema() -> RowSchema {
        RowSchema::new(vec![
            Field::new("id", FieldType::Int, false),
            Field::new("name", FieldType::Str, true),
            Field::new("score", FieldType::Float, true),
        ])
    }

    fn row(id: i64, name: Option<&str>, score: Option<f64>) -> Row {
        Row::new(vec![
            Value::Int(id),
            name.map_or(Value::Null, |n| Value::Str(n.into())),
            score.map_or(Value::Null, Value::Float),
        ])
    }

    #[test]
    fn writes_valid_parquet() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.parquet");
        let mut sink = ParquetRowSink::create(&path, &schema(), 3).unwrap();

        sink.collect(row(1, Some("a"), Some(0.5)));
        sink.collect(row(2, None, None));
        sink.signal_end_of_stream();

        assert_eq!(sink.finish().unwrap(), 2);
        assert!(is_valid_parquet(&path));
        assert!(!path.with_extension("parquet.tmp").exists());

        let reader =
            parquet::file::reader::SerializedFileReader::new(File::open(&path).unwrap()).unwrap();
        assert_eq!(reader.metadata().file_metadata().num_rows(), 2);
    }

    #[test]
    fn no_final_file_until_finish() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.parquet");
        let mut sink = ParquetRowSink::create(&path, &schema(), 3).unwrap();
        sink.collect(row(1, Some("a"), None));
        assert!(!path.exists());
        sink.finish().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn arity_mismatch_is_latched_and_surfaces_at_finish() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.parquet");
        let mut sink = ParquetRowSink::create(&path, &schema(), 3).unwrap();
        sink.collect(Row::new(vec![Value::Int(1)]));
        sink.collect(row(2, None, None)); // dropped, error already latched
        let err = sink.finish().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(!path.exists());
    }

    #[test]
    fn int_widens_into_float_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.parquet");
        let mut sink = ParquetRowSink::create(&path, &schema(), 3).unwrap();
        sink.collect(Row::new(vec![
            Value::Int(1),
            Value::Null,
            Value::Int(7),
        ]));
        assert_eq!(sink.finish().unwrap(), 1);
    }

    #[test]
    fn arrow_schema_maps_types_and_nullability() {
        let arrow = arrow_schema(&schema());
        assert_eq!(arrow.field(0).data_type(), &DataType::Int64);
        assert!(!arrow.field(0).is_nullable());
        assert_eq!(arrow.field(1).data_type(), &DataType::Utf8);
        assert!(arrow.field(1).is_nullable());
        assert_eq!(arrow.field(2).data_type(), &DataType::Float64);
    }

    #[test]
    fn stale_tmp_is_replaced_on_create() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.parquet");
        std::fs::write(path.with_extension("parquet.tmp"), b"stale").unwrap();
        let sink = ParquetRowSink::create(&path, &schema(), 3).unwrap();
        drop(sink);
    }

    #[test]
    fn cleanup_tmp_files_removes_only_tmp() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.tmp"), b"stale").unwrap();
        std::fs::write(dir.path().join("b.parquet"), b"keep").unwrap();
        cleanup_tmp_files(dir.path()).unwrap();
        assert!(!dir.path().join("a.tmp").exists());
        assert!(dir.path().join("b.parquet").exists());
    }
}
