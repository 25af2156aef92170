//! File destination

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::traits::Destination;

/// A destination that appends records to a log file
///
/// Each record is flushed as soon as it is written so a crash loses at most
/// the record in flight. The handle is flushed and closed on drop.
#[derive(Debug)]
pub struct FileDestination {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileDestination {
    /// Open `path` for appending, creating it if needed
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    /// Get the path to the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Destination for FileDestination {
    fn name(&self) -> &str {
        "file"
    }

    fn write_record(&mut self, record: &str) -> io::Result<()> {
        self.writer.write_all(record.as_bytes())?;
        self.writer.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl Drop for FileDestination {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}
