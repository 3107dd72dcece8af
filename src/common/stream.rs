use crate::errors::{HarnessError, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

/// Number of bytes occupied by one record of a port with `width` bits.
pub fn record_bytes(width: u32) -> usize {
    assert!(width >= 1 && width <= 64, "port widths up to 64 bits");
    ((width + 7) / 8) as usize
}

/// Sequential reader over a raw, headerless stream of fixed-width binary
/// records. Exhaustion is sticky: once end-of-data is reached the reader
/// keeps returning `None` and never errors.
#[derive(Debug)]
pub struct RecordReader {
    name: String,
    reader: BufReader<File>,
    record_bytes: usize,
    exhausted: bool,
    records_read: u64,
}

impl RecordReader {
    pub fn open<P: AsRef<Path>>(path: P, width: u32) -> Result<Self> {
        let name = path.as_ref().display().to_string();
        let file = File::open(&path).map_err(|e| HarnessError::ResourceOpen {
            name: name.clone(),
            source: e,
        })?;
        Ok(RecordReader {
            name: name,
            reader: BufReader::new(file),
            record_bytes: record_bytes(width),
            exhausted: false,
            records_read: 0,
        })
    }

    /// Reads the next record as a little-endian value. Returns `None` once
    /// the stream has no full record left; a trailing partial record also
    /// counts as end-of-data.
    pub fn next(self: &mut Self) -> Result<Option<u64>> {
        if self.exhausted {
            return Ok(None);
        }
        let mut buf = [0u8; 8];
        match self.reader.read_exact(&mut buf[..self.record_bytes]) {
            Ok(()) => {
                self.records_read += 1;
                Ok(Some(u64::from_le_bytes(buf)))
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                log::debug!("stream {} exhausted after {} records", self.name, self.records_read);
                self.exhausted = true;
                Ok(None)
            }
            Err(e) => Err(HarnessError::from(e)),
        }
    }

    pub fn exhausted(self: &Self) -> bool {
        self.exhausted
    }

    pub fn name(self: &Self) -> &str {
        &self.name
    }

    pub fn records_read(self: &Self) -> u64 {
        self.records_read
    }
}

/// Sequential writer producing the same raw record layout `RecordReader`
/// consumes.
#[derive(Debug)]
pub struct RecordWriter {
    name: String,
    writer: BufWriter<File>,
    record_bytes: usize,
    records_written: u64,
}

impl RecordWriter {
    pub fn create<P: AsRef<Path>>(path: P, width: u32) -> Result<Self> {
        let name = path.as_ref().display().to_string();
        let file = File::create(&path).map_err(|e| HarnessError::ResourceOpen {
            name: name.clone(),
            source: e,
        })?;
        Ok(RecordWriter {
            name: name,
            writer: BufWriter::new(file),
            record_bytes: record_bytes(width),
            records_written: 0,
        })
    }

    pub fn append(self: &mut Self, value: u64) -> Result<()> {
        let bytes = value.to_le_bytes();
        self.writer.write_all(&bytes[..self.record_bytes])?;
        self.records_written += 1;
        Ok(())
    }

    /// Flushes buffered records to the file. Called once at the end of a
    /// run, on both the normal and the fatal path.
    pub fn finish(self: &mut Self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn name(self: &Self) -> &str {
        &self.name
    }

    pub fn records_written(self: &Self) -> u64 {
        self.records_written
    }
}
