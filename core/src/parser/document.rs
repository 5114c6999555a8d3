//! Normalized intermediate form of one scan report.

use serde_json::{Map, Value};

/// Run statistics plus host entries of one report.
///
/// `host_entries` is always a list, even when the report held a single host.
/// Built once by [`ScanDocumentNormalizer`](super::ScanDocumentNormalizer) and
/// read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanDocument {
    run_statistics: Value,
    host_entries: Vec<Value>,
}

impl ScanDocument {
    pub(crate) fn new(run_statistics: Value, host_entries: Vec<Value>) -> Self {
        let run_statistics = match run_statistics {
            Value::Object(_) => run_statistics,
            _ => Value::Object(Map::new()),
        };
        Self {
            run_statistics,
            host_entries,
        }
    }

    /// The `runstats` mapping; an empty mapping when the report had none.
    pub fn run_statistics(&self) -> &Value {
        &self.run_statistics
    }

    pub fn host_entries(&self) -> &[Value] {
        &self.host_entries
    }

    pub fn host(&self, index: usize) -> Option<&Value> {
        self.host_entries.get(index)
    }

    pub fn host_count(&self) -> usize {
        self.host_entries.len()
    }
}
