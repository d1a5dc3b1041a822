//! Scanner for package manifests (.pkg).
//!
//! Package files carry the real build settings the project manifest only
//! implies: the GCC version, the Automation Runtime version (checked
//! against the migration minimum), the package file version, and the
//! object list. Library objects are checked against the catalog; .tmx
//! references produce localization findings.

use regex::Regex;
use std::sync::OnceLock;

use super::{line_of, xml, PackageReference, ScanOutcome};
use crate::models::{Finding, FindingType, Severity, Span, VersionChange};
use crate::rules::{RuleSet, AS6_AR_VERSION, AS6_GCC_VERSION};
use crate::store::Artifact;

fn gcc_attr() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"GccVersion="([^"]+)""#).unwrap())
}

fn ar_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"AutomationRuntime\s+Version="([^"]+)""#).unwrap())
}

fn file_version() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"FileVersion="(4[^"]*)""#).unwrap())
}

fn object_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<Object\s+([^>]*?)>([^<]+)</Object>").unwrap())
}

fn type_attr() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"Type="([^"]+)""#).unwrap())
}

pub fn scan(rules: &RuleSet, artifact: &Artifact) -> ScanOutcome {
    let mut outcome = xml::scan(rules, artifact);
    let content = &artifact.content;

    if let Some(caps) = gcc_attr().captures(content) {
        let version = &caps[1];
        if version != AS6_GCC_VERSION {
            let m = caps.get(0).unwrap();
            let mut finding = Finding::draft(
                FindingType::Compiler,
                "GCC Compiler Version",
                Severity::Warning,
                format!("GCC {version} configured - AS6 builds with GCC {AS6_GCC_VERSION}"),
                &artifact.path,
            );
            finding.line = Some(line_of(content, m.start()));
            finding.span = Some(Span {
                offset: m.start(),
                len: m.len(),
            });
            finding.original = m.as_str().to_string();
            finding.version_change = Some(VersionChange {
                from: version.to_string(),
                to: AS6_GCC_VERSION.to_string(),
            });
            finding.notes = Some("Recompile all C code against the new toolchain.".to_string());
            outcome.findings.push(finding);
        }
    }

    if let Some(caps) = ar_tag().captures(content) {
        let version = &caps[1];
        let m = caps.get(0).unwrap();
        let validation = rules.validate_ar_version(version);
        if validation.valid {
            let mut finding = Finding::draft(
                FindingType::Runtime,
                "Automation Runtime Version",
                Severity::Warning,
                format!("AR {version} configured - AS6 targets AR {AS6_AR_VERSION}"),
                &artifact.path,
            );
            finding.line = Some(line_of(content, m.start()));
            finding.span = Some(Span {
                offset: m.start(),
                len: m.len(),
            });
            finding.original = m.as_str().to_string();
            finding.version_change = Some(VersionChange {
                from: version.to_string(),
                to: AS6_AR_VERSION.to_string(),
            });
            finding.notes = Some(validation.message);
            outcome.findings.push(finding);
        } else {
            let mut finding = Finding::draft(
                FindingType::Runtime,
                "Automation Runtime Version",
                Severity::Error,
                validation.message,
                &artifact.path,
            );
            finding.line = Some(line_of(content, m.start()));
            finding.original = m.as_str().to_string();
            finding.blocking = true;
            outcome.findings.push(finding);
        }
    }

    if let Some(caps) = file_version().captures(content) {
        let m = caps.get(0).unwrap();
        let mut finding = Finding::draft(
            FindingType::Package,
            "Package File Version",
            Severity::Info,
            format!("Package file version {} - regenerated by AS6 on first save", &caps[1]),
            &artifact.path,
        );
        finding.line = Some(line_of(content, m.start()));
        finding.original = m.as_str().to_string();
        outcome.findings.push(finding);
    }

    for caps in object_tag().captures_iter(content) {
        let attrs = &caps[1];
        let name = caps[2].trim().to_string();
        let object_type = type_attr()
            .captures(attrs)
            .map_or_else(String::new, |c| c[1].to_string());
        outcome.package_refs.push(PackageReference {
            name: name.clone(),
            object_type: object_type.clone(),
            file: artifact.path.clone(),
        });

        let offset = caps.get(2).unwrap().start();
        if object_type.eq_ignore_ascii_case("Library") {
            if let Some(rule) = rules.find_library(&name) {
                let mut finding = Finding::draft(
                    FindingType::Library,
                    &rule.name,
                    rule.severity,
                    rule.description.clone(),
                    &artifact.path,
                );
                finding.line = Some(line_of(content, offset));
                finding.original = name.clone();
                finding.replacement = rule.replacement.clone();
                finding.notes = Some(rule.notes.clone());
                finding.function_mappings = rule.function_mappings.clone();
                outcome.findings.push(finding);
            }
        } else if name.to_ascii_lowercase().ends_with(".tmx") {
            let mut finding = Finding::draft(
                FindingType::Localization,
                &format!("TMX Reference: {name}"),
                Severity::Info,
                "Translation memory file - verify language codes after migration".to_string(),
                &artifact.path,
            );
            finding.line = Some(line_of(content, offset));
            finding.original = name;
            outcome.findings.push(finding);
        }
    }

    outcome
}
