//! Report builder: a deterministic snapshot of the session.
//!
//! The report is a pure function of registry and transaction-log state.
//! It carries no timestamps or host details, so the same project and the
//! same actions always produce byte-identical output.

use crate::models::{FindingStatus, Report, Severity, SeverityCounts};
use crate::registry::FindingRegistry;
use crate::txn::TransactionLog;

/// Build the report from current session state.
pub fn build(registry: &FindingRegistry, txn: &TransactionLog) -> Report {
    let mut counts = SeverityCounts::default();
    let mut applied = 0usize;
    let mut skipped = 0usize;
    for finding in registry.iter() {
        match finding.severity {
            Severity::Error => counts.error += 1,
            Severity::Warning => counts.warning += 1,
            Severity::Info => counts.info += 1,
        }
        match finding.status {
            FindingStatus::Applied => applied += 1,
            FindingStatus::Skipped => skipped += 1,
            _ => {}
        }
    }
    Report {
        total_findings: registry.len(),
        counts_by_severity: counts,
        applied_count: applied,
        skipped_count: skipped,
        distinct_files_modified: txn.modified_files().len(),
        findings: registry.iter().cloned().collect(),
    }
}

/// Render the report as CSV, one row per finding.
pub fn csv(report: &Report) -> String {
    let mut out = String::from("Type,Name,Severity,Description,File,Line,Replacement,Status\n");
    for finding in &report.findings {
        let row = [
            finding.kind.as_str().to_string(),
            finding.name.clone(),
            finding.severity.as_str().to_string(),
            finding.description.clone(),
            finding.file.clone(),
            finding.line.map_or_else(String::new, |l| l.to_string()),
            finding
                .replacement
                .as_ref()
                .map_or_else(String::new, |r| r.name.clone()),
            format!("{:?}", finding.status).to_lowercase(),
        ];
        let rendered: Vec<String> = row.iter().map(|field| csv_field(field)).collect();
        out.push_str(&rendered.join(","));
        out.push('\n');
    }
    out
}

/// Quote a field when it contains a delimiter, quote, or newline.
fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
