//! Conversion generator: pure before/after text pairs for findings.
//!
//! Generation never mutates anything; the transaction log is what applies
//! a conversion to the store. An identifier that no longer occurs in the
//! finding's original text yields an identity conversion rather than an
//! error.

use regex::Regex;

use crate::models::{Conversion, Finding, FindingType};
use crate::rules::RuleSet;
use crate::store::ArtifactStore;

/// Maximum preview length for whole-file rewrites.
pub const PREVIEW_LIMIT: usize = 500;

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let head: String = text.chars().take(limit).collect();
    format!("{head}...")
}

fn identity(finding: &Finding, rationale: &str) -> Conversion {
    Conversion {
        before: finding.original.clone(),
        after: finding.original.clone(),
        rationale: rationale.to_string(),
    }
}

/// Generate the conversion for one finding against the current store
/// state.
pub fn generate(rules: &RuleSet, store: &ArtifactStore, finding: &Finding) -> Conversion {
    if finding.is_anchor() {
        let current = store
            .get(&finding.file)
            .map(|a| a.content.clone())
            .unwrap_or_else(|| finding.original.clone());
        return Conversion {
            before: truncate(&current, PREVIEW_LIMIT),
            after: truncate(&rules.convert_manifest(&current), PREVIEW_LIMIT),
            rationale: "Full project file rewrite to the AS6 format.".to_string(),
        };
    }

    if finding.blocking {
        return identity(
            finding,
            finding
                .notes
                .as_deref()
                .unwrap_or("Blocking issue - resolve before migrating."),
        );
    }

    if let Some(change) = &finding.version_change {
        if finding.original.contains(&change.from) {
            return Conversion {
                before: finding.original.clone(),
                after: finding.original.replace(&change.from, &change.to),
                rationale: format!("Version change {} to {}.", change.from, change.to),
            };
        }
        return identity(finding, "Version attribute not present in this form.");
    }

    match finding.kind {
        FindingType::TechnologyPackage => match &finding.replacement {
            Some(replacement) => {
                let target = rules
                    .resolve_tech_package(&replacement.name)
                    .or_else(|| rules.resolve_tech_package(&finding.name));
                let version = target
                    .and_then(|t| t.as6_version.clone())
                    .unwrap_or_else(|| "unknown".to_string());
                let sub_versions = target.map(|t| t.sub_versions.clone()).unwrap_or_default();
                let after = if sub_versions.is_empty() {
                    format!("<{} Version=\"{version}\" />", replacement.name)
                } else {
                    let attrs = sub_versions
                        .iter()
                        .map(|(k, v)| format!("{k}=\"{v}\""))
                        .collect::<Vec<_>>()
                        .join(" ");
                    format!("<{} {attrs} Version=\"{version}\" />", replacement.name)
                };
                Conversion {
                    before: finding.original.clone(),
                    after,
                    rationale: format!(
                        "Package replaced: {} to {}.",
                        finding.name, replacement.name
                    ),
                }
            }
            None => identity(finding, "Included in project file conversion."),
        },
        FindingType::Library | FindingType::Function => match &finding.replacement {
            Some(replacement) => {
                let pattern = format!("(?i){}", regex::escape(&finding.name));
                match Regex::new(&pattern) {
                    Ok(re) if re.is_match(&finding.original) => Conversion {
                        before: finding.original.clone(),
                        after: re
                            .replace_all(&finding.original, replacement.name.as_str())
                            .into_owned(),
                        rationale: format!(
                            "Identifier replaced: {} to {}.",
                            finding.name, replacement.name
                        ),
                    },
                    _ => identity(finding, "Identifier not present - no change generated."),
                }
            }
            None => identity(
                finding,
                "Manual conversion required. No automatic replacement available.",
            ),
        },
        FindingType::Hardware => match &finding.replacement {
            Some(replacement) if finding.original.contains(&finding.name) => Conversion {
                before: finding.original.clone(),
                after: finding.original.replace(&finding.name, &replacement.name),
                rationale: format!(
                    "Hardware replacement: {} to {}. Manual verification required.",
                    finding.name, replacement.name
                ),
            },
            Some(_) => identity(finding, "Module name not present - no change generated."),
            None => identity(
                finding,
                "Manual conversion required. No automatic replacement available.",
            ),
        },
        FindingType::Project => identity(finding, "Included in project file conversion."),
        _ => identity(
            finding,
            "Informational finding - no automatic conversion.",
        ),
    }
}
