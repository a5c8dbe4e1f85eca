use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::errors::GenerationError;
use crate::generators::Record;

/// Streams records to a CSV file whose header is the schema property list.
pub struct RecordCsvWriter<W: Write> {
    header: Vec<String>,
    writer: csv::Writer<CountingWriter<W>>,
    rows: u64,
}

impl RecordCsvWriter<BufWriter<File>> {
    pub fn create(path: &Path, header: Vec<String>) -> Result<Self, GenerationError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = BufWriter::new(File::create(path)?);
        Self::from_writer(file, header)
    }
}

impl<W: Write> RecordCsvWriter<W> {
    pub fn from_writer(inner: W, header: Vec<String>) -> Result<Self, GenerationError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(CountingWriter::new(inner));
        writer.write_record(&header)?;
        Ok(Self {
            header,
            writer,
            rows: 0,
        })
    }

    pub fn write(&mut self, record: &Record) -> Result<(), GenerationError> {
        self.writer.write_record(record.to_csv_row(&self.header))?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    /// Flush and return the total bytes written, header included.
    pub fn finish(mut self) -> Result<u64, GenerationError> {
        self.writer.flush()?;
        let counting = self
            .writer
            .into_inner()
            .map_err(|err| GenerationError::Io(err.into_error()))?;
        Ok(counting.bytes_written())
    }
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
