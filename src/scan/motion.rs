//! Scanner for ACP10 motion configuration (.ax, .apt, .ncm, .ncc).
//!
//! Every motion artifact produces one informational finding, since mapp
//! Motion restructures all of them. A shared pass flags deprecated value
//! sentinels (`ncOLD_`, `ncDEPRECATED`) in any of the four dialects.

use std::path::Path;

use super::{line_of, AxisRecord, ScanOutcome};
use crate::models::{Finding, FindingType, Severity};
use crate::rules::{RuleSet, DEPRECATED_MOTION_SENTINELS};
use crate::store::{Artifact, Dialect};

fn stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

pub fn scan(_rules: &RuleSet, artifact: &Artifact) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();
    let name = stem(&artifact.path);

    let (title, description) = match artifact.dialect {
        Dialect::AxisInit => {
            outcome.axes.push(AxisRecord {
                name: name.clone(),
                file: artifact.path.clone(),
            });
            (
                format!("Axis Init: {name}"),
                "ACP10 axis init parameters - migrate to mapp Motion axis configuration",
            )
        }
        Dialect::AxisParameters => {
            outcome.axes.push(AxisRecord {
                name: name.clone(),
                file: artifact.path.clone(),
            });
            (
                format!("Axis Parameters: {name}"),
                "ACP10 axis parameter table - parameter groups are reorganized in mapp Motion",
            )
        }
        Dialect::NcMapping => (
            format!("NC Mapping: {name}"),
            "NC mapping table - axis-to-hardware mapping moves into the configuration view",
        ),
        Dialect::NcConfig => (
            format!("NC Configuration: {name}"),
            "NC configuration - deployment model changes under mapp Motion",
        ),
        _ => return outcome,
    };

    let mut finding = Finding::draft(
        FindingType::Motion,
        &title,
        Severity::Info,
        description.to_string(),
        &artifact.path,
    );
    finding.notes = Some("Review with the mapp Motion migration guide.".to_string());
    outcome.findings.push(finding);

    for sentinel in DEPRECATED_MOTION_SENTINELS {
        if let Some(offset) = artifact.content.find(sentinel) {
            let mut finding = Finding::draft(
                FindingType::Motion,
                &format!("Deprecated Motion Values: {}", file_name(&artifact.path)),
                Severity::Warning,
                format!("Contains deprecated value marker {sentinel}"),
                &artifact.path,
            );
            finding.line = Some(line_of(&artifact.content, offset));
            finding.original = sentinel.to_string();
            finding.notes = Some("Replace deprecated values before migrating.".to_string());
            outcome.findings.push(finding);
            break;
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(path: &str, content: &str) -> Artifact {
        Artifact {
            path: path.to_string(),
            content: content.to_string(),
            dialect: Dialect::classify(path),
        }
    }

    #[test]
    fn test_axis_init_produces_info_and_side_record() {
        let rules = RuleSet::builtin();
        let outcome = scan(&rules, &artifact("Physical/Axis1.ax", "limit := 100"));
        assert_eq!(outcome.findings.len(), 1);
        assert_eq!(outcome.findings[0].name, "Axis Init: Axis1");
        assert_eq!(outcome.findings[0].severity, Severity::Info);
        assert_eq!(outcome.axes.len(), 1);
        assert_eq!(outcome.axes[0].name, "Axis1");
    }

    #[test]
    fn test_sentinel_raises_warning_in_any_motion_dialect() {
        let rules = RuleSet::builtin();
        for path in ["a.ax", "a.apt", "a.ncm", "a.ncc"] {
            let outcome = scan(&rules, &artifact(path, "mode := ncOLD_mode\n"));
            let warn = outcome
                .findings
                .iter()
                .find(|f| f.severity == Severity::Warning)
                .unwrap();
            assert!(warn.name.starts_with("Deprecated Motion Values:"));
            assert_eq!(warn.line, Some(1));
        }
    }

    #[test]
    fn test_only_first_sentinel_reported() {
        let rules = RuleSet::builtin();
        let outcome = scan(
            &rules,
            &artifact("a.ncc", "x := ncOLD_a\ny := ncDEPRECATED_b\n"),
        );
        let warnings = outcome
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .count();
        assert_eq!(warnings, 1);
    }

    #[test]
    fn test_nc_mapping_has_no_axis_record() {
        let rules = RuleSet::builtin();
        let outcome = scan(&rules, &artifact("map.ncm", "table"));
        assert!(outcome.axes.is_empty());
        assert_eq!(outcome.findings[0].name, "NC Mapping: map");
    }
}
