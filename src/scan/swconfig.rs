//! Scanner for software configurations (.sw).
//!
//! Emits one aggregate task-configuration finding per file, one motion
//! finding when NC data objects are deployed, and library findings for
//! deployed library objects. Task and NC entries also land in the side
//! tables for the report.

use regex::Regex;
use std::sync::OnceLock;

use super::{line_of, NcObject, ScanOutcome, TaskDefinition};
use crate::models::{Finding, FindingType, Severity};
use crate::rules::RuleSet;
use crate::store::Artifact;

fn task_class() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<TaskClass\s+Name="([^"]+)"[^>]*>(.*?)</TaskClass>"#).unwrap()
    })
}

fn task_entry() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<Task\s+Name="([^"]+)"\s+Source="([^"]+)""#).unwrap())
}

fn nc_data_object() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<NcDataObject\s+Name="([^"]+)""#).unwrap())
}

fn library_object() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<LibraryObject\s+Name="([^"]+)""#).unwrap())
}

pub fn scan(rules: &RuleSet, artifact: &Artifact) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();
    let content = &artifact.content;

    let mut class_count = 0usize;
    for caps in task_class().captures_iter(content) {
        class_count += 1;
        let class_name = caps[1].to_string();
        for task in task_entry().captures_iter(&caps[2]) {
            outcome.tasks.push(TaskDefinition {
                task_class: class_name.clone(),
                name: task[1].to_string(),
                source: task[2].to_string(),
                file: artifact.path.clone(),
            });
        }
    }
    if class_count > 0 {
        let mut finding = Finding::draft(
            FindingType::TaskConfig,
            "Task Configuration",
            Severity::Info,
            format!(
                "Found {} tasks in {} task classes - verify cycle times after migration",
                outcome.tasks.len(),
                class_count
            ),
            &artifact.path,
        );
        finding.notes = Some(
            "AS6 keeps the task model but scheduling defaults may differ.".to_string(),
        );
        outcome.findings.push(finding);
    }

    let nc_names: Vec<&str> = nc_data_object()
        .captures_iter(content)
        .map(|c| c.get(1).unwrap().as_str())
        .collect();
    if !nc_names.is_empty() {
        for name in &nc_names {
            outcome.nc_objects.push(NcObject {
                name: (*name).to_string(),
                file: artifact.path.clone(),
            });
        }
        let mut finding = Finding::draft(
            FindingType::Motion,
            "NC Data Objects",
            Severity::Info,
            format!(
                "Found {} NC data objects - review against the mapp Motion configuration model",
                nc_names.len()
            ),
            &artifact.path,
        );
        finding.notes = Some("ACP10 NC data objects are restructured in AS6.".to_string());
        outcome.findings.push(finding);
    }

    for caps in library_object().captures_iter(content) {
        let m = caps.get(1).unwrap();
        if let Some(rule) = rules.find_library(m.as_str()) {
            let mut finding = Finding::draft(
                FindingType::Library,
                &rule.name,
                rule.severity,
                rule.description.clone(),
                &artifact.path,
            );
            finding.line = Some(line_of(content, m.start()));
            finding.original = m.as_str().to_string();
            finding.replacement = rule.replacement.clone();
            finding.notes = Some(rule.notes.clone());
            finding.function_mappings = rule.function_mappings.clone();
            outcome.findings.push(finding);
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Dialect;

    const SW: &str = r#"<SwConfiguration>
  <TaskClass Name="Cyclic#1">
    <Task Name="Main" Source="Program.Main.prg" />
    <Task Name="Aux" Source="Program.Aux.prg" />
  </TaskClass>
  <TaskClass Name="Cyclic#4">
    <Task Name="Slow" Source="Program.Slow.prg" />
  </TaskClass>
  <NcDataObject Name="gAxis01obj" />
  <LibraryObject Name="CANIO" />
  <LibraryObject Name="AsBrStr" />
</SwConfiguration>"#;

    fn artifact() -> Artifact {
        Artifact {
            path: "Physical/Config1/Cpu.sw".to_string(),
            content: SW.to_string(),
            dialect: Dialect::SoftwareConfig,
        }
    }

    #[test]
    fn test_aggregate_task_finding_and_side_table() {
        let rules = RuleSet::builtin();
        let outcome = scan(&rules, &artifact());
        let tasks = outcome
            .findings
            .iter()
            .find(|f| f.kind == FindingType::TaskConfig)
            .unwrap();
        assert!(tasks.description.contains("3 tasks in 2 task classes"));
        assert_eq!(outcome.tasks.len(), 3);
        assert_eq!(outcome.tasks[0].task_class, "Cyclic#1");
        assert_eq!(outcome.tasks[2].name, "Slow");
    }

    #[test]
    fn test_nc_data_objects_produce_motion_finding() {
        let rules = RuleSet::builtin();
        let outcome = scan(&rules, &artifact());
        let motion = outcome
            .findings
            .iter()
            .find(|f| f.kind == FindingType::Motion)
            .unwrap();
        assert_eq!(motion.name, "NC Data Objects");
        assert_eq!(outcome.nc_objects.len(), 1);
        assert_eq!(outcome.nc_objects[0].name, "gAxis01obj");
    }

    #[test]
    fn test_deployed_libraries_checked() {
        let rules = RuleSet::builtin();
        let outcome = scan(&rules, &artifact());
        let libs: Vec<&Finding> = outcome
            .findings
            .iter()
            .filter(|f| f.kind == FindingType::Library)
            .collect();
        assert_eq!(libs.len(), 1);
        assert_eq!(libs[0].name, "CANIO");
        assert_eq!(libs[0].replacement.as_ref().unwrap().name, "ArCanOpen");
    }

    #[test]
    fn test_empty_config() {
        let rules = RuleSet::builtin();
        let empty = Artifact {
            path: "Cpu.sw".to_string(),
            content: "<SwConfiguration />".to_string(),
            dialect: Dialect::SoftwareConfig,
        };
        assert!(scan(&rules, &empty).findings.is_empty());
    }
}
