use serde::{Deserialize, Serialize};

/// Per-class counts emitted after the scan phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCounts {
    pub not_available: usize,
    pub already_exists: usize,
    pub ready: usize,
}

impl ClassCounts {
    pub fn processed(&self) -> usize {
        self.not_available + self.already_exists + self.ready
    }
}

/// Itemized view of a reconciliation, one display string per entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub not_available: Vec<String>,
    pub already_exists: Vec<String>,
    pub ready: Vec<String>,
}

/// Result of the submission phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub done: usize,
    pub ready: usize,
}

impl Completion {
    pub fn is_complete(&self) -> bool {
        self.done == self.ready
    }
}
