//! In-memory destination

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use super::traits::Destination;

/// A destination that keeps records in a shared buffer
///
/// Clones share the same buffer, so a test can hand one clone to a logger
/// and read records back through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryDestination {
    records: Arc<Mutex<Vec<String>>>,
}

impl MemoryDestination {
    /// Create a new empty memory destination
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every record written so far
    pub fn records(&self) -> Vec<String> {
        self.records.lock().clone()
    }

    /// All records concatenated
    pub fn contents(&self) -> String {
        self.records.lock().concat()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Clear all records
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Destination for MemoryDestination {
    fn name(&self) -> &str {
        "memory"
    }

    fn write_record(&mut self, record: &str) -> io::Result<()> {
        self.records.lock().push(record.to_string());
        Ok(())
    }
}
