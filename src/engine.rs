//! Engine facade tying the store, rule set, registry, and transaction
//! log together.
//!
//! Scanning fans out over artifacts with rayon and merges outcomes
//! sequentially in path order, so finding ids are identical run to run.
//! All mutation goes through `&mut self`, which keeps apply/undo
//! single-writer.

use rayon::prelude::*;
use tracing::info;

use crate::convert;
use crate::models::{Conversion, Finding, Report};
use crate::registry::{FindingFilter, FindingRegistry};
use crate::report;
use crate::rules::RuleSet;
use crate::scan::{self, AxisRecord, NcObject, PackageReference, ScanOutcome, TaskDefinition, TmxStats};
use crate::store::ArtifactStore;
use crate::txn::TransactionLog;

/// Non-finding records accumulated during scanning, for the report.
#[derive(Debug, Default)]
pub struct SideTables {
    pub tasks: Vec<TaskDefinition>,
    pub nc_objects: Vec<NcObject>,
    pub axes: Vec<AxisRecord>,
    pub package_refs: Vec<PackageReference>,
    pub tmx: Vec<TmxStats>,
}

pub struct Engine {
    rules: RuleSet,
    store: ArtifactStore,
    registry: FindingRegistry,
    txn: TransactionLog,
    tables: SideTables,
}

impl Engine {
    pub fn new(rules: RuleSet) -> Engine {
        Engine {
            rules,
            store: ArtifactStore::new(),
            registry: FindingRegistry::new(),
            txn: TransactionLog::new(),
            tables: SideTables::default(),
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ArtifactStore {
        &mut self.store
    }

    pub fn registry(&self) -> &FindingRegistry {
        &self.registry
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn tables(&self) -> &SideTables {
        &self.tables
    }

    pub fn txn(&self) -> &TransactionLog {
        &self.txn
    }

    /// Scan every artifact in the store. Clears previous findings, side
    /// tables, and the transaction log, then sorts the registry by
    /// severity.
    pub fn scan_all(&mut self) -> usize {
        self.registry.clear();
        self.txn.clear();
        self.tables = SideTables::default();

        let artifacts: Vec<_> = self.store.iter().collect();
        let rules = &self.rules;
        let mut outcomes: Vec<(String, ScanOutcome)> = artifacts
            .par_iter()
            .map(|artifact| (artifact.path.clone(), scan::scan_artifact(rules, artifact)))
            .collect();
        // Parallel collection preserves input order, but sort anyway so
        // id assignment never depends on the scheduler.
        outcomes.sort_by(|a, b| a.0.cmp(&b.0));

        for (_, outcome) in outcomes {
            for finding in outcome.findings {
                self.registry.append(finding);
            }
            self.tables.tasks.extend(outcome.tasks);
            self.tables.nc_objects.extend(outcome.nc_objects);
            self.tables.axes.extend(outcome.axes);
            self.tables.package_refs.extend(outcome.package_refs);
            self.tables.tmx.extend(outcome.tmx);
        }
        self.registry.sort_by_severity();
        info!(
            artifacts = self.store.len(),
            findings = self.registry.len(),
            "scan complete"
        );
        self.registry.len()
    }

    /// Preview the conversion for one finding against the current store.
    pub fn preview(&self, id: u32) -> Option<Conversion> {
        self.registry
            .get(id)
            .map(|f| convert::generate(&self.rules, &self.store, f))
    }

    pub fn select(&mut self, id: u32) -> bool {
        self.registry.select(id)
    }

    pub fn deselect(&mut self, id: u32) -> bool {
        self.registry.deselect(id)
    }

    pub fn select_all(&mut self, filter: &FindingFilter) -> usize {
        self.registry.select_all(filter)
    }

    pub fn apply(&mut self, id: u32) -> bool {
        self.txn
            .apply(&self.rules, &mut self.registry, &mut self.store, id)
    }

    /// Apply the current selection; returns the number applied.
    pub fn apply_selected(&mut self) -> usize {
        let selection = self.registry.selection();
        self.txn
            .apply_all(&self.rules, &mut self.registry, &mut self.store, &selection)
    }

    pub fn undo(&mut self, id: u32) -> bool {
        self.txn.undo(&mut self.registry, &mut self.store, id)
    }

    pub fn undo_all(&mut self) -> usize {
        self.txn.undo_all(&mut self.registry, &mut self.store)
    }

    pub fn skip(&mut self, id: u32) -> bool {
        self.txn.skip(&mut self.registry, id)
    }

    pub fn filtered(&self, filter: &FindingFilter) -> Vec<&Finding> {
        self.registry.filtered(filter).collect()
    }

    pub fn report(&self) -> Report {
        report::build(&self.registry, &self.txn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FindingStatus, Severity};

    fn engine_with_project() -> Engine {
        let mut engine = Engine::new(RuleSet::builtin());
        engine.store_mut().put(
            "Demo.apj",
            r#"<?AutomationStudio Version="4.9.3.20"?>
<Project Edition="Standard">
  <TechnologyPackages>
    <mapp Version="5.24.2" />
  </TechnologyPackages>
</Project>"#
                .to_string(),
        );
        engine.store_mut().put(
            "Logical/Main.st",
            "{LIBRARY AsARCNET}\nmemcpy(a, b, 4);\n".to_string(),
        );
        engine.store_mut().put(
            "Physical/Hardware.hw",
            r#"<Module Name="X20CP0201" Type="X20CP0201" />"#.to_string(),
        );
        engine
    }

    #[test]
    fn test_scan_all_is_deterministic() {
        let mut a = engine_with_project();
        let mut b = engine_with_project();
        a.scan_all();
        b.scan_all();
        let left: Vec<(u32, String)> = a.registry().iter().map(|f| (f.id, f.name.clone())).collect();
        let right: Vec<(u32, String)> = b.registry().iter().map(|f| (f.id, f.name.clone())).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn test_scan_orders_errors_first() {
        let mut engine = engine_with_project();
        engine.scan_all();
        let severities: Vec<Severity> = engine.registry().iter().map(|f| f.severity).collect();
        let first_info = severities.iter().position(|s| *s == Severity::Info);
        let last_error = severities.iter().rposition(|s| *s == Severity::Error);
        if let (Some(info), Some(error)) = (first_info, last_error) {
            assert!(error < info);
        }
    }

    #[test]
    fn test_hardware_deduplicated_across_name_and_type() {
        let mut engine = engine_with_project();
        engine.scan_all();
        let hits = engine
            .registry()
            .iter()
            .filter(|f| f.name == "X20CP0201")
            .count();
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_filtered_view_outlives_local_filter() {
        let mut engine = engine_with_project();
        engine.scan_all();
        let view = {
            let filter = FindingFilter {
                severity: Some(Severity::Error),
                ..FindingFilter::default()
            };
            engine.filtered(&filter)
        };
        assert!(!view.is_empty());
        assert!(view.iter().all(|f| f.severity == Severity::Error));
    }

    #[test]
    fn test_chained_apply_over_multibyte_content() {
        let mut engine = Engine::new(RuleSet::builtin());
        engine
            .store_mut()
            .put("Logical/Copy.st", "memcpy(a);\n(*ü*)memset(b);\n".to_string());
        engine.scan_all();
        let ids: Vec<u32> = engine.registry().iter().map(|f| f.id).collect();
        assert_eq!(ids.len(), 2);
        for id in ids {
            assert!(engine.apply(id));
        }
        let content = &engine.store().get("Logical/Copy.st").unwrap().content;
        assert_eq!(content, "brsmemcpy(a);\n(*ü*)brsmemset(b);\n");
    }

    #[test]
    fn test_rescan_resets_state() {
        let mut engine = engine_with_project();
        engine.scan_all();
        let id = engine.registry().iter().next().map(|f| f.id).unwrap();
        engine.select(id);
        let total = engine.registry().len();
        engine.scan_all();
        assert_eq!(engine.registry().len(), total);
        assert!(engine.registry().selection().is_empty());
        assert!(engine.txn().is_empty());
    }

    #[test]
    fn test_apply_selected_round_trip() {
        let mut engine = engine_with_project();
        engine.scan_all();
        let original = engine.store().get("Physical/Hardware.hw").unwrap().content.clone();
        let hw_id = engine
            .registry()
            .iter()
            .find(|f| f.name == "X20CP0201")
            .map(|f| f.id)
            .unwrap();
        engine.select(hw_id);
        assert_eq!(engine.apply_selected(), 1);
        assert!(engine
            .store()
            .get("Physical/Hardware.hw")
            .unwrap()
            .content
            .contains("X20CP1381"));
        assert_eq!(engine.undo_all(), 1);
        assert_eq!(
            engine.store().get("Physical/Hardware.hw").unwrap().content,
            original
        );
        assert_eq!(
            engine.registry().get(hw_id).unwrap().status,
            FindingStatus::Selected
        );
    }

    #[test]
    fn test_report_round_trips_through_anchor_apply_and_undo() {
        let mut engine = engine_with_project();
        engine.scan_all();
        let before = serde_json::to_string(&engine.report()).unwrap();
        let anchor_id = engine
            .registry()
            .iter()
            .find(|f| f.is_anchor())
            .map(|f| f.id)
            .unwrap();
        assert!(engine.apply(anchor_id));
        let during = serde_json::to_string(&engine.report()).unwrap();
        assert_ne!(before, during);
        assert!(engine.undo(anchor_id));
        let after = serde_json::to_string(&engine.report()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_preview_does_not_mutate() {
        let mut engine = engine_with_project();
        engine.scan_all();
        let before: Vec<String> = engine.store().iter().map(|a| a.content.clone()).collect();
        for id in engine.registry().iter().map(|f| f.id).collect::<Vec<_>>() {
            let _ = engine.preview(id);
        }
        let after: Vec<String> = engine.store().iter().map(|a| a.content.clone()).collect();
        assert_eq!(before, after);
    }
}
