use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::errors::SinkError;
use crate::record::{LoadRecord, OUTPUT_COLUMNS};

/// Destination for accepted records.
pub trait RowSink {
    fn save(&mut self, record: &LoadRecord) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Writes load records as CSV with the output column header.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    rows: u64,
}

impl CsvSink<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_writer(BufWriter::new(File::create(path)?))
    }
}

impl<W: Write> CsvSink<W> {
    /// The header is written up front so an empty run still yields a
    /// well-formed file.
    pub fn from_writer(inner: W) -> Result<Self, SinkError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer.write_record(OUTPUT_COLUMNS)?;
        Ok(Self { writer, rows: 0 })
    }

    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    pub fn into_inner(mut self) -> Result<W, SinkError> {
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|err| SinkError::Io(err.into_error()))
    }
}

impl<W: Write> RowSink for CsvSink<W> {
    fn save(&mut self, record: &LoadRecord) -> Result<(), SinkError> {
        self.writer.serialize(record)?;
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps accepted records in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub records: Vec<LoadRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RowSink for MemorySink {
    fn save(&mut self, record: &LoadRecord) -> Result<(), SinkError> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Saves every record to `first`, then to `second`.
pub struct TeeSink<A, B> {
    first: A,
    second: B,
}

impl<A: RowSink, B: RowSink> TeeSink<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: RowSink, B: RowSink> RowSink for TeeSink<A, B> {
    fn save(&mut self, record: &LoadRecord) -> Result<(), SinkError> {
        self.first.save(record)?;
        self.second.save(record)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.first.flush()?;
        self.second.flush()
    }
}
