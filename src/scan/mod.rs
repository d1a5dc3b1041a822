//! Dialect scanners.
//!
//! Each submodule handles one artifact dialect and emits finding drafts
//! plus side-table records. Scanners are pure: rule set plus artifact in,
//! outcome out. The engine merges outcomes into the registry in path
//! order, so ids stay deterministic even when artifacts are scanned in
//! parallel.

pub mod code;
pub mod localization;
pub mod motion;
pub mod package;
pub mod project;
pub mod swconfig;
pub mod xml;

use crate::models::Finding;
use crate::rules::RuleSet;
use crate::store::{Artifact, Dialect};

/// A task entry extracted from a software configuration.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TaskDefinition {
    pub task_class: String,
    pub name: String,
    pub source: String,
    pub file: String,
}

/// An NC data object referenced by a software configuration.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NcObject {
    pub name: String,
    pub file: String,
}

/// An axis configuration artifact observed during scanning.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AxisRecord {
    pub name: String,
    pub file: String,
}

/// An object listed in a package manifest.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PackageReference {
    pub name: String,
    pub object_type: String,
    pub file: String,
}

/// Translation-unit statistics for one TMX file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TmxStats {
    pub file: String,
    pub units: usize,
    pub languages: Vec<String>,
}

/// Everything one scanner pass over one artifact produced.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub findings: Vec<Finding>,
    pub tasks: Vec<TaskDefinition>,
    pub nc_objects: Vec<NcObject>,
    pub axes: Vec<AxisRecord>,
    pub package_refs: Vec<PackageReference>,
    pub tmx: Vec<TmxStats>,
}

/// Scan one artifact with the scanner matching its dialect.
pub fn scan_artifact(rules: &RuleSet, artifact: &Artifact) -> ScanOutcome {
    match artifact.dialect {
        Dialect::Code => code::scan(rules, artifact),
        Dialect::Xml => xml::scan(rules, artifact),
        Dialect::ProjectManifest => project::scan(rules, artifact),
        Dialect::PackageManifest => package::scan(rules, artifact),
        Dialect::SoftwareConfig => swconfig::scan(rules, artifact),
        Dialect::AxisInit | Dialect::AxisParameters | Dialect::NcMapping | Dialect::NcConfig => {
            motion::scan(rules, artifact)
        }
        Dialect::Localization => localization::scan(artifact),
        Dialect::Unknown => ScanOutcome::default(),
    }
}

/// 1-based line number of a byte offset.
pub(crate) fn line_of(content: &str, offset: usize) -> usize {
    content[..offset.min(content.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

/// The full line containing `offset`, as an exact slice of `content`
/// together with its byte offset. Conversions generated for the slice
/// can be spliced back at that span.
pub(crate) fn line_window(content: &str, offset: usize) -> (String, usize) {
    let offset = offset.min(content.len());
    let start = content[..offset].rfind('\n').map_or(0, |i| i + 1);
    let end = content[offset..]
        .find('\n')
        .map_or(content.len(), |i| offset + i);
    (content[start..end].to_string(), start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_of() {
        let text = "first\nsecond\nthird";
        assert_eq!(line_of(text, 0), 1);
        assert_eq!(line_of(text, 6), 2);
        assert_eq!(line_of(text, text.len()), 3);
    }

    #[test]
    fn test_line_window_is_exact_slice() {
        let text = "first\nsecond line\nthird";
        let (window, start) = line_window(text, 8);
        assert_eq!(window, "second line");
        assert_eq!(&text[start..start + window.len()], window);
    }

    #[test]
    fn test_line_window_at_boundaries() {
        let text = "only line";
        let (window, start) = line_window(text, 3);
        assert_eq!(window, "only line");
        assert_eq!(start, 0);
    }
}
