//! Console destination

use std::io::{self, Write};

use super::traits::Destination;

/// Which console stream to write to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleStream {
    #[default]
    Stderr,
    Stdout,
}

/// A destination that writes to the console
#[derive(Debug, Clone, Default)]
pub struct ConsoleDestination {
    stream: ConsoleStream,
}

impl ConsoleDestination {
    /// Write to stderr
    pub fn new() -> Self {
        Self::default()
    }

    /// Write to the given stream
    pub fn with_stream(stream: ConsoleStream) -> Self {
        Self { stream }
    }

    pub fn stream(&self) -> ConsoleStream {
        self.stream
    }
}

impl Destination for ConsoleDestination {
    fn name(&self) -> &str {
        match self.stream {
            ConsoleStream::Stderr => "stderr",
            ConsoleStream::Stdout => "stdout",
        }
    }

    fn write_record(&mut self, record: &str) -> io::Result<()> {
        match self.stream {
            ConsoleStream::Stderr => io::stderr().lock().write_all(record.as_bytes()),
            ConsoleStream::Stdout => io::stdout().lock().write_all(record.as_bytes()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stream {
            ConsoleStream::Stderr => io::stderr().flush(),
            ConsoleStream::Stdout => io::stdout().flush(),
        }
    }
}
