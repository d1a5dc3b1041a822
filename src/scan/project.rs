//! Scanner for the AS4 project manifest (.apj).
//!
//! A format-major of 4 produces the anchor finding that drives the full
//! AS6 manifest rewrite, one finding per technology package, structural
//! findings for the IEC settings block and the missing AS6 namespace, and
//! the fixed compiler and runtime version transitions. A format-major of 6
//! produces a single informational finding.

use regex::Regex;
use std::sync::OnceLock;

use super::{xml, ScanOutcome};
use crate::models::{
    Finding, FindingType, Replacement, Severity, Span, VersionChange, ANCHOR_NAME,
};
use crate::rules::{
    RuleSet, AS4_GCC_VERSION, AS6_AR_VERSION, AS6_GCC_VERSION, AS6_PROJECT_NAMESPACE,
};
use crate::store::Artifact;

fn tech_section() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<TechnologyPackages>(.*?)</TechnologyPackages>").unwrap())
}

fn package_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<(\w+)\s+Version="([^"]+)"\s*/>"#).unwrap())
}

pub fn scan(rules: &RuleSet, artifact: &Artifact) -> ScanOutcome {
    let mut outcome = xml::scan(rules, artifact);
    let content = &artifact.content;

    let version = match rules.detect_format_version(content) {
        Some(v) => v,
        None => return outcome,
    };

    if version.major == 6 {
        let mut finding = Finding::draft(
            FindingType::Project,
            "AS6 Project",
            Severity::Info,
            format!("Project is already in AS6 format (version {})", version.full),
            &artifact.path,
        );
        finding.line = Some(1);
        outcome.findings.push(finding);
        return outcome;
    }
    if version.major != 4 {
        return outcome;
    }

    outcome.findings.push(anchor_finding(artifact, &version.full));
    package_findings(rules, artifact, &mut outcome);
    structure_findings(artifact, &mut outcome);
    version_findings(artifact, &mut outcome);
    outcome
}

fn anchor_finding(artifact: &Artifact, full_version: &str) -> Finding {
    let head: String = artifact.content.chars().take(200).collect();
    let mut finding = Finding::draft(
        FindingType::Project,
        ANCHOR_NAME,
        Severity::Warning,
        format!(
            "AS4 format project file (version {full_version}) - requires conversion to AS6 format"
        ),
        &artifact.path,
    );
    finding.line = Some(1);
    finding.context = Some(head.clone());
    finding.original = head;
    finding.notes = Some(
        "Applying this conversion rewrites the whole manifest: AS6 header, required \
         elements, and the recomputed technology-package list."
            .to_string(),
    );
    finding
}

fn package_findings(rules: &RuleSet, artifact: &Artifact, outcome: &mut ScanOutcome) {
    let content = &artifact.content;
    let mut seen = Vec::new();

    if let Some(section) = tech_section().captures(content) {
        let body = section.get(1).unwrap();
        for caps in package_tag().captures_iter(body.as_str()) {
            let tag = caps.get(0).unwrap();
            let name = &caps[1];
            let version = &caps[2];
            seen.push(name.to_string());
            let offset = body.start() + tag.start();
            let (severity, description, replacement, notes) = match rules
                .resolve_tech_package(name)
            {
                Some(rule) if rule.replaced_by.is_some() => {
                    let target = rule.replaced_by.clone().unwrap_or_default();
                    (
                        Severity::Warning,
                        format!("{name} is replaced by {target} in AS6"),
                        Some(Replacement::named(&target)),
                        format!("Package tag is rewritten to {target} during conversion."),
                    )
                }
                Some(rule) => match rule.as6_version.as_deref() {
                    Some(as6) => (
                        Severity::Info,
                        format!("{name} {version} upgrades to {as6} in AS6"),
                        None,
                        "Version attribute is updated during conversion.".to_string(),
                    ),
                    None => (
                        Severity::Warning,
                        format!("{name} has no known AS6 version"),
                        None,
                        "Manual review required.".to_string(),
                    ),
                },
                None => (
                    Severity::Warning,
                    format!("Unknown technology package {name} {version}"),
                    None,
                    "Package is preserved verbatim - manual review required.".to_string(),
                ),
            };
            let mut finding = Finding::draft(
                FindingType::TechnologyPackage,
                name,
                severity,
                description,
                &artifact.path,
            );
            finding.line = Some(super::line_of(content, offset));
            finding.span = Some(Span {
                offset,
                len: tag.len(),
            });
            finding.context = Some(tag.as_str().to_string());
            finding.original = tag.as_str().to_string();
            finding.replacement = replacement;
            finding.notes = Some(notes);
            outcome.findings.push(finding);
        }
    }

    for rule in &rules.tech_packages {
        if rule.new_in_as6 && rule.required && !seen.iter().any(|s| s.eq_ignore_ascii_case(&rule.name))
        {
            let mut finding = Finding::draft(
                FindingType::TechnologyPackage,
                &rule.name,
                Severity::Info,
                format!("{} is added by the AS6 conversion", rule.name),
                &artifact.path,
            );
            finding.original = "N/A - New package".to_string();
            finding.notes = Some("Added to the technology-package list during conversion.".to_string());
            outcome.findings.push(finding);
        }
    }
}

fn structure_findings(artifact: &Artifact, outcome: &mut ScanOutcome) {
    let content = &artifact.content;
    if content.contains("<IECExtendedSettings>") || content.contains("<Pointers>") {
        let mut finding = Finding::draft(
            FindingType::Project,
            "IEC Settings Format",
            Severity::Info,
            "IEC settings move from nested elements to attributes in AS6".to_string(),
            &artifact.path,
        );
        finding.notes = Some("Handled by the project file conversion.".to_string());
        outcome.findings.push(finding);
    }
    if !content.contains(AS6_PROJECT_NAMESPACE) {
        let mut finding = Finding::draft(
            FindingType::Project,
            "Missing XML Namespace",
            Severity::Info,
            format!("AS6 project files declare the {AS6_PROJECT_NAMESPACE} namespace"),
            &artifact.path,
        );
        finding.notes = Some("Handled by the project file conversion.".to_string());
        outcome.findings.push(finding);
    }
}

fn version_findings(artifact: &Artifact, outcome: &mut ScanOutcome) {
    let mut compiler = Finding::draft(
        FindingType::Compiler,
        "GCC Compiler Version",
        Severity::Warning,
        format!("AS6 builds with GCC {AS6_GCC_VERSION} instead of GCC {AS4_GCC_VERSION}"),
        &artifact.path,
    );
    compiler.original = format!(r#"GccVersion="{AS4_GCC_VERSION}""#);
    compiler.version_change = Some(VersionChange {
        from: AS4_GCC_VERSION.to_string(),
        to: AS6_GCC_VERSION.to_string(),
    });
    compiler.notes = Some(
        "Recompile all C code. Stricter warnings and newer language defaults may \
         surface latent issues."
            .to_string(),
    );
    outcome.findings.push(compiler);

    let mut runtime = Finding::draft(
        FindingType::Runtime,
        "Automation Runtime Version",
        Severity::Warning,
        format!("AS6 projects target Automation Runtime {AS6_AR_VERSION}"),
        &artifact.path,
    );
    runtime.original = r#"AutomationRuntime Version="AR4""#.to_string();
    runtime.version_change = Some(VersionChange {
        from: "AR4".to_string(),
        to: AS6_AR_VERSION.to_string(),
    });
    runtime.notes = Some("Update runtime on all targets before deploying.".to_string());
    outcome.findings.push(runtime);
}
