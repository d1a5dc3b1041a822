//! Shared data models for findings, conversions, and reports.

pub mod report;

pub use report::{Report, SeverityCounts};

use serde::Serialize;

/// Severity rank of a finding. Ordinal: `Error < Warning < Info`,
/// used directly for the stable post-scan sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn rank(self) -> u8 {
        match self {
            Severity::Error => 0,
            Severity::Warning => 1,
            Severity::Info => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }

    /// Parse a severity token as seen on the CLI or in config files.
    pub fn parse(s: &str) -> Option<Severity> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Some(Severity::Error),
            "warning" | "warn" => Some(Severity::Warning),
            "info" => Some(Severity::Info),
            _ => None,
        }
    }
}

/// The construct family a finding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingType {
    Library,
    Function,
    Hardware,
    Project,
    Compiler,
    Runtime,
    TechnologyPackage,
    Package,
    TaskConfig,
    Motion,
    Localization,
}

impl FindingType {
    pub fn as_str(self) -> &'static str {
        match self {
            FindingType::Library => "library",
            FindingType::Function => "function",
            FindingType::Hardware => "hardware",
            FindingType::Project => "project",
            FindingType::Compiler => "compiler",
            FindingType::Runtime => "runtime",
            FindingType::TechnologyPackage => "technology_package",
            FindingType::Package => "package",
            FindingType::TaskConfig => "task_config",
            FindingType::Motion => "motion",
            FindingType::Localization => "localization",
        }
    }

    pub fn parse(s: &str) -> Option<FindingType> {
        match s.trim().to_ascii_lowercase().as_str() {
            "library" => Some(FindingType::Library),
            "function" => Some(FindingType::Function),
            "hardware" => Some(FindingType::Hardware),
            "project" => Some(FindingType::Project),
            "compiler" => Some(FindingType::Compiler),
            "runtime" => Some(FindingType::Runtime),
            "technology_package" => Some(FindingType::TechnologyPackage),
            "package" => Some(FindingType::Package),
            "task_config" => Some(FindingType::TaskConfig),
            "motion" => Some(FindingType::Motion),
            "localization" => Some(FindingType::Localization),
            _ => None,
        }
    }

    /// True for finding types produced by catalog rule hits; these are
    /// subject to `(name, file)` duplicate suppression at append time.
    pub fn is_rule_hit(self) -> bool {
        matches!(
            self,
            FindingType::Library | FindingType::Function | FindingType::Hardware
        )
    }

    /// Display bucket for grouped views. Project-level concerns
    /// (compiler, runtime, package descriptors) fall back to the
    /// project bucket.
    pub fn group(self) -> FindingGroup {
        match self {
            FindingType::Library => FindingGroup::Library,
            FindingType::Function => FindingGroup::Function,
            FindingType::Hardware => FindingGroup::Hardware,
            FindingType::TechnologyPackage => FindingGroup::TechnologyPackage,
            FindingType::TaskConfig => FindingGroup::TaskConfig,
            FindingType::Motion => FindingGroup::Motion,
            FindingType::Localization => FindingGroup::Localization,
            FindingType::Project
            | FindingType::Compiler
            | FindingType::Runtime
            | FindingType::Package => FindingGroup::Project,
        }
    }
}

/// Fixed ordering of display buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingGroup {
    Project,
    Library,
    Function,
    Hardware,
    TechnologyPackage,
    TaskConfig,
    Motion,
    Localization,
}

impl FindingGroup {
    pub const ORDER: [FindingGroup; 8] = [
        FindingGroup::Project,
        FindingGroup::Library,
        FindingGroup::Function,
        FindingGroup::Hardware,
        FindingGroup::TechnologyPackage,
        FindingGroup::TaskConfig,
        FindingGroup::Motion,
        FindingGroup::Localization,
    ];

    pub fn title(self) -> &'static str {
        match self {
            FindingGroup::Project => "Project",
            FindingGroup::Library => "Libraries",
            FindingGroup::Function => "Functions",
            FindingGroup::Hardware => "Hardware",
            FindingGroup::TechnologyPackage => "Technology Packages",
            FindingGroup::TaskConfig => "Task Configuration",
            FindingGroup::Motion => "Motion",
            FindingGroup::Localization => "Localization",
        }
    }
}

/// Lifecycle status of a finding. Transitions are driven exclusively by
/// the registry (select/deselect) and the transaction log (apply/undo/skip).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingStatus {
    Pending,
    Selected,
    Applied,
    Skipped,
}

/// Suggested replacement attached to a finding or catalog rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replacement {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Replacement {
    pub fn new(name: &str, description: &str) -> Replacement {
        Replacement {
            name: name.to_string(),
            description: Some(description.to_string()),
        }
    }

    pub fn named(name: &str) -> Replacement {
        Replacement {
            name: name.to_string(),
            description: None,
        }
    }
}

/// Old-name/new-name pair for libraries whose functions were renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionMapping {
    pub old: String,
    pub new: String,
}

/// Byte range of a rule match inside the artifact content at scan time.
/// Apply splices at this span when the bytes there are still intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

/// A from/to version transition carried by compiler and runtime findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionChange {
    pub from: String,
    pub to: String,
}

/// One detected deprecated construct plus its proposed conversion
/// and lifecycle status.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: FindingType,
    pub name: String,
    pub severity: Severity,
    pub description: String,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub original: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement: Option<Replacement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_mappings: Option<Vec<FunctionMapping>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_change: Option<VersionChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub blocking: bool,
    pub status: FindingStatus,
}

/// Name of the project-manifest anchor finding. Applying it triggers the
/// full manifest rewrite and cascades status to dependent findings in the
/// same file.
pub const ANCHOR_NAME: &str = "AS4 Project File";

impl Finding {
    /// Start a finding draft. The registry assigns the real id at append.
    pub fn draft(
        kind: FindingType,
        name: &str,
        severity: Severity,
        description: String,
        file: &str,
    ) -> Finding {
        Finding {
            id: 0,
            kind,
            name: name.to_string(),
            severity,
            description,
            file: file.to_string(),
            line: None,
            context: None,
            original: String::new(),
            replacement: None,
            notes: None,
            eol: None,
            function_mappings: None,
            version_change: None,
            span: None,
            blocking: false,
            status: FindingStatus::Pending,
        }
    }

    /// True for the manifest finding that anchors the full AS6 rewrite.
    pub fn is_anchor(&self) -> bool {
        self.kind == FindingType::Project && self.name == ANCHOR_NAME
    }
}

/// Generated before/after text pair plus rationale for one finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversion {
    pub before: String,
    pub after: String,
    pub rationale: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering_is_total() {
        let mut sevs = vec![Severity::Info, Severity::Error, Severity::Warning];
        sevs.sort_by_key(|s| s.rank());
        assert_eq!(sevs, vec![Severity::Error, Severity::Warning, Severity::Info]);
    }

    #[test]
    fn test_type_group_fallback_to_project() {
        assert_eq!(FindingType::Compiler.group(), FindingGroup::Project);
        assert_eq!(FindingType::Runtime.group(), FindingGroup::Project);
        assert_eq!(FindingType::Package.group(), FindingGroup::Project);
        assert_eq!(FindingType::Motion.group(), FindingGroup::Motion);
    }

    #[test]
    fn test_anchor_detection() {
        let f = Finding::draft(
            FindingType::Project,
            ANCHOR_NAME,
            Severity::Warning,
            "anchor".into(),
            "Proj.apj",
        );
        assert!(f.is_anchor());
        let g = Finding::draft(
            FindingType::Project,
            "IEC Settings Format",
            Severity::Info,
            "iec".into(),
            "Proj.apj",
        );
        assert!(!g.is_anchor());
    }
}
