//! Transaction log: apply, undo, and skip.
//!
//! Each successful apply records the finding's full prior artifact
//! content, its prior status, and the prior state of every finding the
//! apply cascaded over, so undo is an exact inverse. Applying a finding
//! that already has a live entry is a no-op, which makes apply
//! idempotent.

use std::collections::BTreeSet;

use tracing::debug;

use crate::models::{FindingStatus, FindingType};
use crate::registry::FindingRegistry;
use crate::rules::RuleSet;
use crate::store::ArtifactStore;

/// Names of manifest findings folded into the anchor rewrite besides the
/// technology packages.
const CASCADE_NAMES: [&str; 2] = ["IEC Settings Format", "Missing XML Namespace"];

const CASCADE_NOTE: &str = "Included in project file conversion";

/// Prior state of one finding swept up by an anchor cascade.
#[derive(Debug, Clone)]
struct CascadeRecord {
    id: u32,
    prior_status: FindingStatus,
    prior_notes: Option<String>,
}

/// One applied conversion and everything needed to reverse it.
#[derive(Debug, Clone)]
pub struct TransactionEntry {
    pub finding_id: u32,
    pub file: String,
    original_content: String,
    converted_content: String,
    prior_status: FindingStatus,
    cascaded: Vec<CascadeRecord>,
}

impl TransactionEntry {
    pub fn changed(&self) -> bool {
        self.original_content != self.converted_content
    }
}

/// Log of applied conversions, in application order.
#[derive(Debug, Default)]
pub struct TransactionLog {
    entries: Vec<TransactionEntry>,
}

impl TransactionLog {
    pub fn new() -> TransactionLog {
        TransactionLog::default()
    }

    pub fn has_entry(&self, id: u32) -> bool {
        self.entries.iter().any(|e| e.finding_id == id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &TransactionEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Files whose content differs from the ingested state.
    pub fn modified_files(&self) -> BTreeSet<&str> {
        self.entries
            .iter()
            .filter(|e| e.changed())
            .map(|e| e.file.as_str())
            .collect()
    }

    /// Apply one finding's conversion to the store. Returns false without
    /// touching anything when the finding is unknown, skipped, already
    /// applied, or its artifact is missing.
    pub fn apply(
        &mut self,
        rules: &RuleSet,
        registry: &mut FindingRegistry,
        store: &mut ArtifactStore,
        id: u32,
    ) -> bool {
        if self.has_entry(id) {
            debug!(id, "apply skipped: already applied");
            return false;
        }
        let (file, prior_status, is_anchor) = match registry.get(id) {
            Some(f) if matches!(f.status, FindingStatus::Pending | FindingStatus::Selected) => {
                (f.file.clone(), f.status, f.is_anchor())
            }
            _ => return false,
        };
        let current = match store.get(&file) {
            Some(artifact) => artifact.content.clone(),
            None => {
                debug!(id, file, "apply skipped: artifact not in store");
                return false;
            }
        };

        let converted = if is_anchor {
            rules.convert_manifest(&current)
        } else {
            let rewritten = registry.get(id).and_then(|finding| {
                let conversion = crate::convert::generate(rules, store, finding);
                apply_text(&current, finding.span, &conversion.before, &conversion.after)
            });
            rewritten.unwrap_or_else(|| current.clone())
        };

        let mut entry = TransactionEntry {
            finding_id: id,
            file: file.clone(),
            original_content: current,
            converted_content: converted.clone(),
            prior_status,
            cascaded: Vec::new(),
        };

        if is_anchor {
            for dependent in registry.iter_mut() {
                if dependent.id == id || dependent.file != file {
                    continue;
                }
                let folded = dependent.kind == FindingType::TechnologyPackage
                    || CASCADE_NAMES.contains(&dependent.name.as_str());
                let live = matches!(
                    dependent.status,
                    FindingStatus::Pending | FindingStatus::Selected
                );
                if folded && live {
                    entry.cascaded.push(CascadeRecord {
                        id: dependent.id,
                        prior_status: dependent.status,
                        prior_notes: dependent.notes.clone(),
                    });
                    dependent.status = FindingStatus::Applied;
                    dependent.notes = Some(match &dependent.notes {
                        Some(notes) => format!("{notes} ({CASCADE_NOTE})"),
                        None => CASCADE_NOTE.to_string(),
                    });
                }
            }
            for record in &entry.cascaded {
                registry.drop_from_selection(record.id);
            }
        }

        store.set_content(&file, converted);
        if let Some(finding) = registry.get_mut(id) {
            finding.status = FindingStatus::Applied;
        }
        registry.drop_from_selection(id);
        debug!(id, file, cascaded = entry.cascaded.len(), "conversion applied");
        self.entries.push(entry);
        true
    }

    /// Reverse one applied conversion: restore the artifact content, the
    /// finding's prior status, and every cascaded finding's prior state.
    pub fn undo(
        &mut self,
        registry: &mut FindingRegistry,
        store: &mut ArtifactStore,
        id: u32,
    ) -> bool {
        let position = match self.entries.iter().position(|e| e.finding_id == id) {
            Some(p) => p,
            None => return false,
        };
        let entry = self.entries.remove(position);

        store.set_content(&entry.file, entry.original_content.clone());
        if let Some(finding) = registry.get_mut(id) {
            finding.status = entry.prior_status;
        }
        if entry.prior_status == FindingStatus::Selected {
            registry.restore_selection(id);
        }
        for record in &entry.cascaded {
            if let Some(finding) = registry.get_mut(record.id) {
                finding.status = record.prior_status;
                finding.notes = record.prior_notes.clone();
            }
            if record.prior_status == FindingStatus::Selected {
                registry.restore_selection(record.id);
            }
        }
        debug!(id, file = entry.file, "conversion undone");
        true
    }

    /// Mark a live finding as skipped. Applied findings must be undone
    /// first.
    pub fn skip(&mut self, registry: &mut FindingRegistry, id: u32) -> bool {
        match registry.get_mut(id) {
            Some(f) if matches!(f.status, FindingStatus::Pending | FindingStatus::Selected) => {
                f.status = FindingStatus::Skipped;
                registry.drop_from_selection(id);
                true
            }
            _ => false,
        }
    }

    /// Apply a batch in ascending id order; returns the number applied.
    pub fn apply_all(
        &mut self,
        rules: &RuleSet,
        registry: &mut FindingRegistry,
        store: &mut ArtifactStore,
        ids: &[u32],
    ) -> usize {
        let mut sorted: Vec<u32> = ids.to_vec();
        sorted.sort_unstable();
        sorted
            .into_iter()
            .filter(|&id| self.apply(rules, registry, store, id))
            .count()
    }

    /// Undo every applied conversion in reverse application order.
    pub fn undo_all(&mut self, registry: &mut FindingRegistry, store: &mut ArtifactStore) -> usize {
        let ids: Vec<u32> = self.entries.iter().rev().map(|e| e.finding_id).collect();
        ids.into_iter()
            .filter(|&id| self.undo(registry, store, id))
            .count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Span-exact splice with substring fallback: splice at the recorded
/// span when the bytes there still match, otherwise replace the first
/// occurrence of the before-text. Returns `None` when there is nothing
/// to change.
pub(crate) fn apply_text(
    current: &str,
    span: Option<crate::models::Span>,
    before: &str,
    after: &str,
) -> Option<String> {
    if before.is_empty() || before == after {
        return None;
    }
    if let Some(span) = span {
        let end = span.offset + span.len;
        // get() rejects out-of-range and mid-character offsets, so a span
        // shifted by an earlier apply degrades to the substring path.
        if current.get(span.offset..end) == Some(before) {
            let mut out = String::with_capacity(current.len() - before.len() + after.len());
            out.push_str(&current[..span.offset]);
            out.push_str(after);
            out.push_str(&current[end..]);
            return Some(out);
        }
    }
    if current.contains(before) {
        return Some(current.replacen(before, after, 1));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Finding, Replacement, Severity, Span};

    fn fixture() -> (RuleSet, FindingRegistry, ArtifactStore) {
        (RuleSet::builtin(), FindingRegistry::new(), ArtifactStore::new())
    }

    fn hardware_finding(registry: &mut FindingRegistry, file: &str, span: Option<Span>) -> u32 {
        let mut f = Finding::draft(
            crate::models::FindingType::Hardware,
            "X20CP0201",
            Severity::Error,
            "cpu".to_string(),
            file,
        );
        f.original = r#"<Module Name="X20CP0201" />"#.to_string();
        f.replacement = Some(Replacement::named("X20CP1381"));
        f.span = span;
        registry.append(f).unwrap()
    }

    #[test]
    fn test_apply_text_prefers_recorded_span() {
        // Two occurrences; the span points at the second.
        let text = "aaa X bbb X ccc";
        let out = apply_text(text, Some(Span { offset: 10, len: 1 }), "X", "Y").unwrap();
        assert_eq!(out, "aaa X bbb Y ccc");
    }

    #[test]
    fn test_apply_text_falls_back_when_span_stale() {
        let text = "moved X here";
        let out = apply_text(text, Some(Span { offset: 0, len: 1 }), "X", "Y").unwrap();
        assert_eq!(out, "moved Y here");
    }

    #[test]
    fn test_apply_text_falls_back_when_span_splits_a_character() {
        // Byte 2 is inside the two-byte 'ü'.
        let text = "(*ü*)memset(b);";
        let out = apply_text(text, Some(Span { offset: 2, len: 7 }), "memset(", "brsmemset(");
        assert_eq!(out.as_deref(), Some("(*ü*)brsmemset(b);"));
    }

    #[test]
    fn test_apply_text_refuses_empty_or_absent_before() {
        assert!(apply_text("abc", None, "", "x").is_none());
        assert!(apply_text("abc", None, "zzz", "x").is_none());
        assert!(apply_text("abc", None, "b", "b").is_none());
    }

    #[test]
    fn test_apply_is_idempotent() {
        let (rules, mut registry, mut store) = fixture();
        store.put("hw.hw", r#"<Module Name="X20CP0201" />"#.to_string());
        let id = hardware_finding(&mut registry, "hw.hw", Some(Span { offset: 0, len: 27 }));

        let mut log = TransactionLog::new();
        assert!(log.apply(&rules, &mut registry, &mut store, id));
        let after_first = store.get("hw.hw").unwrap().content.clone();
        assert!(after_first.contains("X20CP1381"));
        // Second apply is a no-op.
        assert!(!log.apply(&rules, &mut registry, &mut store, id));
        assert_eq!(store.get("hw.hw").unwrap().content, after_first);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_undo_restores_content_and_status() {
        let (rules, mut registry, mut store) = fixture();
        let original = r#"<Module Name="X20CP0201" />"#.to_string();
        store.put("hw.hw", original.clone());
        let id = hardware_finding(&mut registry, "hw.hw", None);
        registry.select(id);

        let mut log = TransactionLog::new();
        assert!(log.apply(&rules, &mut registry, &mut store, id));
        assert_eq!(registry.get(id).unwrap().status, FindingStatus::Applied);
        assert!(log.undo(&mut registry, &mut store, id));
        assert_eq!(store.get("hw.hw").unwrap().content, original);
        assert_eq!(registry.get(id).unwrap().status, FindingStatus::Selected);
        assert_eq!(registry.selection(), vec![id]);
        assert!(log.is_empty());
    }

    #[test]
    fn test_skipped_finding_is_not_applied() {
        let (rules, mut registry, mut store) = fixture();
        store.put("hw.hw", r#"<Module Name="X20CP0201" />"#.to_string());
        let id = hardware_finding(&mut registry, "hw.hw", None);

        let mut log = TransactionLog::new();
        assert!(log.skip(&mut registry, id));
        assert!(!log.apply(&rules, &mut registry, &mut store, id));
        assert_eq!(registry.get(id).unwrap().status, FindingStatus::Skipped);
        assert!(log.is_empty());
    }

    #[test]
    fn test_chained_applies_to_one_file_compose() {
        let (rules, mut registry, mut store) = fixture();
        let content = "memcpy(a, b, 4);\nmemset(c, 0, 4);\n";
        store.put("main.st", content.to_string());

        let mut memcpy = Finding::draft(
            crate::models::FindingType::Function,
            "memcpy",
            Severity::Warning,
            "memcpy".to_string(),
            "main.st",
        );
        memcpy.original = "memcpy(".to_string();
        memcpy.replacement = Some(Replacement::named("brsmemcpy"));
        memcpy.span = Some(Span { offset: 0, len: 7 });
        let a = registry.append(memcpy).unwrap();

        let mut memset = Finding::draft(
            crate::models::FindingType::Function,
            "memset",
            Severity::Warning,
            "memset".to_string(),
            "main.st",
        );
        memset.original = "memset(".to_string();
        memset.replacement = Some(Replacement::named("brsmemset"));
        memset.span = Some(Span { offset: 17, len: 7 });
        let b = registry.append(memset).unwrap();

        let mut log = TransactionLog::new();
        assert_eq!(log.apply_all(&rules, &mut registry, &mut store, &[b, a]), 2);
        // The second span is stale after the first apply; the substring
        // fallback still lands on the right call.
        assert_eq!(
            store.get("main.st").unwrap().content,
            "brsmemcpy(a, b, 4);\nbrsmemset(c, 0, 4);\n"
        );
        assert_eq!(log.undo_all(&mut registry, &mut store), 2);
        assert_eq!(store.get("main.st").unwrap().content, content);
    }

    #[test]
    fn test_anchor_apply_cascades_and_undo_restores_exactly() {
        let (rules, mut registry, mut store) = fixture();
        let manifest = r#"<?AutomationStudio Version="4.9.3.20"?>
<Project Edition="Standard">
  <TechnologyPackages>
    <mapp Version="5.24.2" />
  </TechnologyPackages>
</Project>"#;
        store.put("Demo.apj", manifest.to_string());
        let outcome = crate::scan::scan_artifact(&rules, store.get("Demo.apj").unwrap());
        for finding in outcome.findings {
            registry.append(finding);
        }
        let anchor_id = registry
            .iter()
            .find(|f| f.is_anchor())
            .map(|f| f.id)
            .unwrap();
        let mapp_id = registry.iter().find(|f| f.name == "mapp").map(|f| f.id).unwrap();
        let mapp_notes = registry.get(mapp_id).unwrap().notes.clone();

        let mut log = TransactionLog::new();
        assert!(log.apply(&rules, &mut registry, &mut store, anchor_id));
        let converted = store.get("Demo.apj").unwrap().content.clone();
        assert!(converted.contains(r#"<mappServices Version="6.2.0" />"#));
        assert_eq!(registry.get(mapp_id).unwrap().status, FindingStatus::Applied);
        assert!(registry
            .get(mapp_id)
            .unwrap()
            .notes
            .as_deref()
            .unwrap()
            .contains(CASCADE_NOTE));
        // Namespace finding cascades too.
        let ns = registry
            .iter()
            .find(|f| f.name == "Missing XML Namespace")
            .unwrap();
        assert_eq!(ns.status, FindingStatus::Applied);

        assert!(log.undo(&mut registry, &mut store, anchor_id));
        assert_eq!(store.get("Demo.apj").unwrap().content, manifest);
        assert_eq!(registry.get(mapp_id).unwrap().status, FindingStatus::Pending);
        assert_eq!(registry.get(mapp_id).unwrap().notes, mapp_notes);
        assert_eq!(
            registry.get(anchor_id).unwrap().status,
            FindingStatus::Pending
        );
    }
}
