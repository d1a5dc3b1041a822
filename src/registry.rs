//! Finding registry: id assignment, duplicate suppression, ordering,
//! filtering, and the selection set.
//!
//! Ids are assigned monotonically at append time and never reassigned;
//! the severity sort reorders the list but leaves ids untouched, so a
//! finding keeps its id across the whole session.

use std::collections::BTreeSet;

use crate::models::{Finding, FindingGroup, FindingStatus, FindingType, Severity};

/// Filter over the registry. All present fields must match.
#[derive(Debug, Default, Clone)]
pub struct FindingFilter {
    /// Case-insensitive substring over name and description.
    pub search: Option<String>,
    pub severity: Option<Severity>,
    pub kind: Option<FindingType>,
}

impl FindingFilter {
    pub fn matches(&self, finding: &Finding) -> bool {
        if let Some(severity) = self.severity {
            if finding.severity != severity {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if finding.kind != kind {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_ascii_lowercase();
            let hit = finding.name.to_ascii_lowercase().contains(&needle)
                || finding.description.to_ascii_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }
        true
    }
}

/// Session-scoped collection of findings.
#[derive(Debug, Default)]
pub struct FindingRegistry {
    findings: Vec<Finding>,
    selection: BTreeSet<u32>,
    next_id: u32,
}

impl FindingRegistry {
    pub fn new() -> FindingRegistry {
        FindingRegistry::default()
    }

    /// Append a draft, assigning the next id. Rule-hit findings that
    /// duplicate an existing `(name, file)` pair are dropped; returns the
    /// assigned id, or `None` for a suppressed duplicate.
    pub fn append(&mut self, mut finding: Finding) -> Option<u32> {
        if finding.kind.is_rule_hit() && self.has_finding(&finding.name, &finding.file) {
            return None;
        }
        self.next_id += 1;
        finding.id = self.next_id;
        let id = finding.id;
        self.findings.push(finding);
        Some(id)
    }

    /// True when a finding with this name already exists for this file.
    pub fn has_finding(&self, name: &str, file: &str) -> bool {
        self.findings
            .iter()
            .any(|f| f.name == name && f.file == file)
    }

    /// Stable sort by severity rank; discovery order is preserved within
    /// each rank.
    pub fn sort_by_severity(&mut self) {
        self.findings.sort_by_key(|f| f.severity.rank());
    }

    pub fn get(&self, id: u32) -> Option<&Finding> {
        self.findings.iter().find(|f| f.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: u32) -> Option<&mut Finding> {
        self.findings.iter_mut().find(|f| f.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Finding> {
        self.findings.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn clear(&mut self) {
        self.findings.clear();
        self.selection.clear();
        self.next_id = 0;
    }

    /// Findings matching a filter, in current list order. The filter is
    /// cloned so the returned view borrows only the registry.
    pub fn filtered(&self, filter: &FindingFilter) -> impl Iterator<Item = &Finding> + '_ {
        let filter = filter.clone();
        self.findings.iter().filter(move |f| filter.matches(f))
    }

    /// Findings bucketed by display group, buckets in fixed order.
    pub fn grouped(&self) -> Vec<(FindingGroup, Vec<&Finding>)> {
        FindingGroup::ORDER
            .iter()
            .map(|&group| {
                let members: Vec<&Finding> = self
                    .findings
                    .iter()
                    .filter(|f| f.kind.group() == group)
                    .collect();
                (group, members)
            })
            .filter(|(_, members)| !members.is_empty())
            .collect()
    }

    /// Mark a pending finding as selected. Applied and skipped findings
    /// are left alone.
    pub fn select(&mut self, id: u32) -> bool {
        match self.get_mut(id) {
            Some(f) if f.status == FindingStatus::Pending => {
                f.status = FindingStatus::Selected;
                self.selection.insert(id);
                true
            }
            _ => false,
        }
    }

    pub fn deselect(&mut self, id: u32) -> bool {
        match self.get_mut(id) {
            Some(f) if f.status == FindingStatus::Selected => {
                f.status = FindingStatus::Pending;
                self.selection.remove(&id);
                true
            }
            _ => false,
        }
    }

    /// Select every pending finding matching the filter.
    pub fn select_all(&mut self, filter: &FindingFilter) -> usize {
        let ids: Vec<u32> = self
            .findings
            .iter()
            .filter(|f| f.status == FindingStatus::Pending && filter.matches(f))
            .map(|f| f.id)
            .collect();
        ids.iter().filter(|&&id| self.select(id)).count()
    }

    /// Deselect every selected finding matching the filter.
    pub fn deselect_all(&mut self, filter: &FindingFilter) -> usize {
        let ids: Vec<u32> = self
            .findings
            .iter()
            .filter(|f| f.status == FindingStatus::Selected && filter.matches(f))
            .map(|f| f.id)
            .collect();
        ids.iter().filter(|&&id| self.deselect(id)).count()
    }

    /// Current selection, ascending by id.
    pub fn selection(&self) -> Vec<u32> {
        self.selection.iter().copied().collect()
    }

    pub(crate) fn drop_from_selection(&mut self, id: u32) {
        self.selection.remove(&id);
    }

    /// Re-insert an id whose finding was restored to `Selected` by an
    /// undo.
    pub(crate) fn restore_selection(&mut self, id: u32) {
        self.selection.insert(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(kind: FindingType, name: &str, severity: Severity, file: &str) -> Finding {
        Finding::draft(kind, name, severity, format!("{name} finding"), file)
    }

    #[test]
    fn test_ids_are_monotonic_and_stable_across_sort() {
        let mut reg = FindingRegistry::new();
        reg.append(draft(FindingType::Motion, "a", Severity::Info, "f1"));
        reg.append(draft(FindingType::Library, "b", Severity::Error, "f1"));
        reg.append(draft(FindingType::Hardware, "c", Severity::Warning, "f1"));
        reg.sort_by_severity();
        let order: Vec<(u32, Severity)> = reg.iter().map(|f| (f.id, f.severity)).collect();
        assert_eq!(
            order,
            vec![
                (2, Severity::Error),
                (3, Severity::Warning),
                (1, Severity::Info)
            ]
        );
    }

    #[test]
    fn test_sort_preserves_discovery_order_within_rank() {
        let mut reg = FindingRegistry::new();
        reg.append(draft(FindingType::Library, "first", Severity::Error, "f1"));
        reg.append(draft(FindingType::Library, "second", Severity::Error, "f2"));
        reg.append(draft(FindingType::Library, "third", Severity::Error, "f3"));
        reg.sort_by_severity();
        let names: Vec<&str> = reg.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_rule_hit_duplicates_suppressed_per_file() {
        let mut reg = FindingRegistry::new();
        assert!(reg
            .append(draft(FindingType::Hardware, "X20CP0201", Severity::Error, "hw.hw"))
            .is_some());
        assert!(reg
            .append(draft(FindingType::Hardware, "X20CP0201", Severity::Error, "hw.hw"))
            .is_none());
        // Same name in a different file is a distinct finding.
        assert!(reg
            .append(draft(FindingType::Hardware, "X20CP0201", Severity::Error, "other.hw"))
            .is_some());
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_non_rule_hit_duplicates_kept() {
        let mut reg = FindingRegistry::new();
        reg.append(draft(FindingType::Motion, "NC Data Objects", Severity::Info, "a.sw"));
        reg.append(draft(FindingType::Motion, "NC Data Objects", Severity::Info, "a.sw"));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_filter_matches_search_severity_kind() {
        let mut reg = FindingRegistry::new();
        reg.append(draft(FindingType::Library, "AsARCNET", Severity::Error, "f"));
        reg.append(draft(FindingType::Hardware, "X20CP0201", Severity::Error, "f"));
        reg.append(draft(FindingType::Function, "memcpy", Severity::Warning, "f"));

        let by_search = FindingFilter {
            search: Some("arcnet".to_string()),
            ..Default::default()
        };
        assert_eq!(reg.filtered(&by_search).count(), 1);

        let by_both = FindingFilter {
            severity: Some(Severity::Error),
            kind: Some(FindingType::Hardware),
            ..Default::default()
        };
        let hits: Vec<&str> = reg.filtered(&by_both).map(|f| f.name.as_str()).collect();
        assert_eq!(hits, vec!["X20CP0201"]);
    }

    #[test]
    fn test_select_all_respects_filter_and_status() {
        let mut reg = FindingRegistry::new();
        let a = reg
            .append(draft(FindingType::Library, "AsARCNET", Severity::Error, "f"))
            .unwrap();
        reg.append(draft(FindingType::Function, "memcpy", Severity::Warning, "f"));

        let errors_only = FindingFilter {
            severity: Some(Severity::Error),
            ..Default::default()
        };
        assert_eq!(reg.select_all(&errors_only), 1);
        assert_eq!(reg.selection(), vec![a]);
        assert_eq!(reg.get(a).unwrap().status, FindingStatus::Selected);
        // Already selected, so nothing changes.
        assert_eq!(reg.select_all(&errors_only), 0);
        assert_eq!(reg.deselect_all(&FindingFilter::default()), 1);
        assert_eq!(reg.get(a).unwrap().status, FindingStatus::Pending);
    }

    #[test]
    fn test_grouped_buckets_in_fixed_order() {
        let mut reg = FindingRegistry::new();
        reg.append(draft(FindingType::Motion, "m", Severity::Info, "f"));
        reg.append(draft(FindingType::Project, "p", Severity::Warning, "f"));
        reg.append(draft(FindingType::Compiler, "c", Severity::Warning, "f"));
        let groups: Vec<FindingGroup> = reg.grouped().iter().map(|(g, _)| *g).collect();
        assert_eq!(groups, vec![FindingGroup::Project, FindingGroup::Motion]);
        // Compiler folds into the Project bucket.
        assert_eq!(reg.grouped()[0].1.len(), 2);
    }
}
