//! Scanner for TMX translation memories (.tmx).

use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;

use super::{ScanOutcome, TmxStats};
use crate::models::{Finding, FindingType, Severity};
use crate::store::Artifact;

fn translation_unit() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<tu[\s>]").unwrap())
}

fn language_attr() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"xml:lang="([^"]+)""#).unwrap())
}

pub fn scan(artifact: &Artifact) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();
    let content = &artifact.content;

    let units = translation_unit().find_iter(content).count();
    let languages: BTreeSet<String> = language_attr()
        .captures_iter(content)
        .map(|c| c[1].to_string())
        .collect();
    let languages: Vec<String> = languages.into_iter().collect();

    let file_name = Path::new(&artifact.path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(&artifact.path);

    let mut finding = Finding::draft(
        FindingType::Localization,
        &format!("TMX: {file_name}"),
        Severity::Info,
        format!(
            "{units} translation units in {} languages - verify language codes after migration",
            languages.len()
        ),
        &artifact.path,
    );
    finding.notes = Some("AS6 text systems validate BCP 47 language codes strictly.".to_string());
    outcome.findings.push(finding);

    outcome.tmx.push(TmxStats {
        file: artifact.path.clone(),
        units,
        languages,
    });
    outcome
}
