//! Scanner for hardware and mapping XML (.hw, .hwl, .xml, .iom, .vvm).
//!
//! Looks at `<Module Name="...">` declarations and generic `Type="..."`
//! attributes. The Type pass uses the substring check first so revision
//! suffixes like `X20CP0201 rev B` still resolve to their base rule.

use regex::Regex;
use std::sync::OnceLock;

use super::{line_of, line_window, ScanOutcome};
use crate::models::{Finding, FindingType, Span};
use crate::rules::RuleSet;
use crate::store::Artifact;

fn module_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)<Module\s+Name="([^"]+)""#).unwrap())
}

fn type_attr() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)Type="([^"]+)""#).unwrap())
}

pub fn scan(rules: &RuleSet, artifact: &Artifact) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();
    let content = &artifact.content;

    for caps in module_name().captures_iter(content) {
        let m = caps.get(1).unwrap();
        if let Some(rule) = rules.find_hardware(m.as_str()) {
            outcome
                .findings
                .push(hardware_finding(artifact, rule, m.start()));
        }
    }

    for caps in type_attr().captures_iter(content) {
        let m = caps.get(1).unwrap();
        if rules.is_deprecated_hardware(m.as_str()) {
            if let Some(rule) = matched_rule(rules, m.as_str()) {
                outcome
                    .findings
                    .push(hardware_finding(artifact, rule, m.start()));
            }
        }
    }

    outcome
}

/// Resolve a Type attribute to its base hardware rule: exact match first,
/// then the substring rule that triggered the deprecation check.
fn matched_rule<'a>(rules: &'a RuleSet, value: &str) -> Option<&'a crate::rules::HardwareRule> {
    if let Some(rule) = rules.find_hardware(value) {
        return Some(rule);
    }
    let lower = value.to_ascii_lowercase();
    rules
        .hardware
        .iter()
        .find(|h| lower.contains(&h.name.to_ascii_lowercase()))
}

fn hardware_finding(
    artifact: &Artifact,
    rule: &crate::rules::HardwareRule,
    offset: usize,
) -> Finding {
    let (window, start) = line_window(&artifact.content, offset);
    let mut finding = Finding::draft(
        FindingType::Hardware,
        &rule.name,
        rule.severity,
        rule.description.clone(),
        &artifact.path,
    );
    finding.line = Some(line_of(&artifact.content, offset));
    finding.span = Some(Span {
        offset: start,
        len: window.len(),
    });
    finding.context = Some(window.clone());
    finding.original = window;
    finding.replacement = rule.replacement.clone();
    finding.notes = Some(rule.notes.clone());
    finding.eol = rule.eol.clone();
    finding
}
