//! Scanner for IEC and ANSI C sources (.st, .fun, .prg).
//!
//! Two passes: library references in `{LIBRARY Name}` pragmas or
//! `LIBRARY Name` declarations, then every deprecated function pattern
//! from the catalog.

use regex::Regex;
use std::sync::OnceLock;

use super::{line_of, line_window, ScanOutcome};
use crate::models::{Finding, FindingType, Span};
use crate::rules::RuleSet;
use crate::store::Artifact;

fn library_ref() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\{?\s*LIBRARY\s+(\w+)\s*\}?").unwrap())
}

pub fn scan(rules: &RuleSet, artifact: &Artifact) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();
    let content = &artifact.content;

    for caps in library_ref().captures_iter(content) {
        let name_match = caps.get(1).unwrap();
        if let Some(rule) = rules.find_library(name_match.as_str()) {
            let (window, start) = line_window(content, name_match.start());
            let mut finding = Finding::draft(
                FindingType::Library,
                &rule.name,
                rule.severity,
                rule.description.clone(),
                &artifact.path,
            );
            finding.line = Some(line_of(content, name_match.start()));
            finding.span = Some(Span {
                offset: start,
                len: window.len(),
            });
            finding.context = Some(window.clone());
            finding.original = window;
            finding.replacement = rule.replacement.clone();
            finding.notes = Some(rule.notes.clone());
            finding.function_mappings = rule.function_mappings.clone();
            outcome.findings.push(finding);
        }
    }

    for rule in &rules.functions {
        for m in rule.pattern.find_iter(content) {
            let (window, _) = line_window(content, m.start());
            let mut finding = Finding::draft(
                FindingType::Function,
                &rule.name,
                rule.severity,
                rule.description.clone(),
                &artifact.path,
            );
            finding.line = Some(line_of(content, m.start()));
            finding.span = Some(Span {
                offset: m.start(),
                len: m.len(),
            });
            finding.context = Some(window);
            finding.original = m.as_str().to_string();
            finding.replacement = rule.replacement.clone();
            finding.notes = Some(rule.notes.clone());
            outcome.findings.push(finding);
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use crate::store::Dialect;

    fn artifact(path: &str, content: &str) -> Artifact {
        Artifact {
            path: path.to_string(),
            content: content.to_string(),
            dialect: Dialect::classify(path),
        }
    }

    #[test]
    fn test_detects_library_pragma() {
        let rules = RuleSet::builtin();
        let art = artifact("Logical/Main.st", "{LIBRARY AsARCNET}\nPROGRAM _INIT\n");
        let outcome = scan(&rules, &art);
        assert_eq!(outcome.findings.len(), 1);
        let f = &outcome.findings[0];
        assert_eq!(f.name, "AsARCNET");
        assert_eq!(f.severity, Severity::Error);
        assert_eq!(f.line, Some(1));
        assert!(f.replacement.is_none());
    }

    #[test]
    fn test_detects_function_call_with_match_span() {
        let rules = RuleSet::builtin();
        let content = "PROGRAM _CYCLIC\n    memcpy(ADR(dst), ADR(src), 4);\nEND_PROGRAM\n";
        let outcome = scan(&rules, &artifact("Logical/Main.st", content));
        let f = outcome
            .findings
            .iter()
            .find(|f| f.name == "memcpy")
            .unwrap();
        assert_eq!(f.line, Some(2));
        let span = f.span.unwrap();
        assert_eq!(&content[span.offset..span.offset + span.len], f.original);
        assert_eq!(f.replacement.as_ref().unwrap().name, "brsmemcpy");
    }

    #[test]
    fn test_mc_br_pattern_is_case_sensitive() {
        let rules = RuleSet::builtin();
        let hit = scan(&rules, &artifact("a.st", "move : MC_BR_MoveAbsolute;"));
        assert_eq!(hit.findings.len(), 1);
        let miss = scan(&rules, &artifact("a.st", "move : mc_br_moveabsolute;"));
        assert!(miss.findings.is_empty());
    }

    #[test]
    fn test_library_carries_function_mappings() {
        let rules = RuleSet::builtin();
        let outcome = scan(&rules, &artifact("a.st", "{LIBRARY IO_lib}"));
        let mappings = outcome.findings[0].function_mappings.as_ref().unwrap();
        assert_eq!(mappings[0].old, "IO_Read");
        assert_eq!(mappings[0].new, "AsIO_Read");
    }

    #[test]
    fn test_clean_source_produces_nothing() {
        let rules = RuleSet::builtin();
        let outcome = scan(&rules, &artifact("a.st", "{LIBRARY AsBrStr}\nbrsmemcpy(a, b, 4);"));
        assert!(outcome.findings.is_empty());
    }
}
