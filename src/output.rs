//! Output rendering for scan, convert, and report commands.
//!
//! Supports `human` (default) and `json` outputs. The JSON form includes
//! per-finding fields and a top-level summary.

use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

use crate::models::{Conversion, Report, Severity};
use crate::registry::{FindingFilter, FindingRegistry};

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

fn severity_badge(severity: Severity, color: bool) -> String {
    match severity {
        Severity::Error => {
            if color {
                "⟦error⟧".red().bold().to_string()
            } else {
                "⟦error⟧".to_string()
            }
        }
        Severity::Warning => {
            if color {
                "⟦warn⟧".yellow().bold().to_string()
            } else {
                "⟦warn⟧".to_string()
            }
        }
        Severity::Info => {
            if color {
                "⟦info⟧".blue().bold().to_string()
            } else {
                "⟦info⟧".to_string()
            }
        }
    }
}

fn severity_icon(severity: Severity, color: bool) -> String {
    match severity {
        Severity::Error => {
            if color {
                "✖".red().to_string()
            } else {
                "✖".to_string()
            }
        }
        Severity::Warning => {
            if color {
                "▲".yellow().to_string()
            } else {
                "▲".to_string()
            }
        }
        Severity::Info => {
            if color {
                "◆".blue().to_string()
            } else {
                "◆".to_string()
            }
        }
    }
}

/// Print scan findings grouped by display bucket, restricted to the
/// filter.
pub fn print_findings(registry: &FindingRegistry, filter: &FindingFilter, output: &str) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_findings_json(registry, filter)).unwrap()
        ),
        _ => {
            let color = use_colors(output);
            for (group, members) in registry.grouped() {
                let members: Vec<_> = members.into_iter().filter(|f| filter.matches(f)).collect();
                if members.is_empty() {
                    continue;
                }
                let title = format!("— {} —", group.title());
                if color {
                    println!("{}", title.bold());
                } else {
                    println!("{}", title);
                }
                for f in members {
                    let icon = severity_icon(f.severity, color);
                    let badge = severity_badge(f.severity, color);
                    let file = if color {
                        f.file.clone().bold().to_string()
                    } else {
                        f.file.clone()
                    };
                    let location = match f.line {
                        Some(line) => format!("{file}:{line}"),
                        None => file,
                    };
                    println!(
                        "{} {} #{} {} ❲{}❳ — {}",
                        icon, badge, f.id, location, f.name, f.description
                    );
                }
            }
            let shown: Vec<_> = registry.filtered(filter).collect();
            let (errors, warnings, infos) = severity_tally(shown.iter().copied());
            let summary = format!(
                "— Summary — errors={} warnings={} infos={} findings={}",
                errors,
                warnings,
                infos,
                shown.len()
            );
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
        }
    }
}

/// Print a conversion preview for one finding.
pub fn print_conversion(id: u32, conversion: &Conversion, output: &str) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_conversion_json(id, conversion)).unwrap()
        ),
        _ => {
            let color = use_colors(output);
            if color {
                println!("{} #{} — {}", "conversion:".cyan().bold(), id, conversion.rationale);
                println!("{}\n{}", "--- before".red(), conversion.before);
                println!("{}\n{}", "+++ after".green(), conversion.after);
            } else {
                println!("conversion: #{id} — {}", conversion.rationale);
                println!("--- before\n{}", conversion.before);
                println!("+++ after\n{}", conversion.after);
            }
        }
    }
}

/// Print the session report.
pub fn print_report(report: &Report, output: &str) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_report_json(report)).unwrap()
        ),
        _ => {
            let color = use_colors(output);
            let summary = format!(
                "— Report — findings={} errors={} warnings={} infos={} applied={} skipped={} files_modified={}",
                report.total_findings,
                report.counts_by_severity.error,
                report.counts_by_severity.warning,
                report.counts_by_severity.info,
                report.applied_count,
                report.skipped_count,
                report.distinct_files_modified
            );
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
        }
    }
}

fn severity_tally<'a>(findings: impl Iterator<Item = &'a crate::models::Finding>) -> (usize, usize, usize) {
    let mut errors = 0;
    let mut warnings = 0;
    let mut infos = 0;
    for f in findings {
        match f.severity {
            Severity::Error => errors += 1,
            Severity::Warning => warnings += 1,
            Severity::Info => infos += 1,
        }
    }
    (errors, warnings, infos)
}

/// Compose findings JSON object (pure) for testing/snapshot purposes.
pub fn compose_findings_json(registry: &FindingRegistry, filter: &FindingFilter) -> JsonVal {
    let shown: Vec<_> = registry.filtered(filter).collect();
    let findings: Vec<JsonVal> = shown
        .iter()
        .map(|f| serde_json::to_value(f).unwrap())
        .collect();
    let (errors, warnings, infos) = severity_tally(shown.iter().copied());
    json!({
        "findings": findings,
        "summary": {
            "errors": errors,
            "warnings": warnings,
            "infos": infos,
            "total": shown.len(),
        }
    })
}

/// Compose conversion-preview JSON object (pure) for testing/snapshot purposes.
pub fn compose_conversion_json(id: u32, conversion: &Conversion) -> JsonVal {
    json!({
        "id": id,
        "before": conversion.before,
        "after": conversion.after,
        "rationale": conversion.rationale,
    })
}

/// Compose report JSON object (pure) for testing/snapshot purposes.
pub fn compose_report_json(report: &Report) -> JsonVal {
    // Directly serialize Report as JSON, keeping stable shape
    serde_json::to_value(report).unwrap()
}
