//! Destination trait definition

use std::io;

/// Somewhere formatted records are written
///
/// Implementations:
/// - `ConsoleDestination`: stderr or stdout
/// - `FileDestination`: appends to a log file
/// - `MemoryDestination`: shared in-memory buffer for tests and embedding
pub trait Destination: Send {
    /// Short name used in diagnostics
    fn name(&self) -> &str;

    /// Write one fully formatted record, trailing newline included.
    ///
    /// A record is written with a single call so lines from one logger never
    /// interleave.
    fn write_record(&mut self, record: &str) -> io::Result<()>;

    /// Flush buffered output
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Type alias for a boxed destination
pub type BoxedDestination = Box<dyn Destination>;
