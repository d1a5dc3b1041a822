//! Report structure derived from registry and transaction state.
//!
//! A report is never cached: it is rebuilt on demand, and rebuilding from
//! identical finding/transaction state yields identical output. Export
//! surfaces (JSON/CSV) are projections of this one structure.

use super::Finding;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
/// Finding counts keyed by severity rank.
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn total(&self) -> usize {
        self.error + self.warning + self.info
    }
}

#[derive(Debug, Clone, Serialize)]
/// Aggregate conversion report plus the full findings snapshot.
pub struct Report {
    pub total_findings: usize,
    pub counts_by_severity: SeverityCounts,
    pub applied_count: usize,
    pub skipped_count: usize,
    pub distinct_files_modified: usize,
    pub findings: Vec<Finding>,
}
