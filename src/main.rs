//! Asmig CLI binary entry point.
//! Delegates to the engine for scanning/converting and prints results.

use std::fs;
use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use asmig::cli::{Cli, Commands};
use asmig::config;
use asmig::engine::Engine;
use asmig::error::ExportError;
use asmig::ingest;
use asmig::models::{FindingType, Severity};
use asmig::output;
use asmig::registry::FindingFilter;
use asmig::report;
use asmig::rules::RuleSet;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Scan {
            project_root,
            output,
            severity,
            kind,
            search,
        } => {
            let eff = config::resolve_effective(
                project_root.as_deref(),
                output.as_deref(),
                None,
                None,
                None,
                None,
            );
            let mut engine = load_project(&eff)?;
            engine.scan_all();
            let filter = build_filter(severity.as_deref(), kind.as_deref(), search.as_deref());
            output::print_findings(engine.registry(), &filter, &eff.output);
            let errors = engine
                .registry()
                .iter()
                .filter(|f| f.severity == Severity::Error)
                .count();
            if errors > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Convert {
            project_root,
            write,
            out_dir,
            output,
            severity,
        } => {
            let eff = config::resolve_effective(
                project_root.as_deref(),
                output.as_deref(),
                Some(write),
                out_dir.as_deref(),
                None,
                None,
            );
            let mut engine = load_project(&eff)?;
            engine.scan_all();
            let filter = build_filter(severity.as_deref(), None, None);
            engine.select_all(&filter);
            for id in engine.registry().selection() {
                if let Some(conversion) = engine.preview(id) {
                    output::print_conversion(id, &conversion, &eff.output);
                }
            }
            let applied = engine.apply_selected();
            info!(applied, "conversions applied");
            output::print_report(&engine.report(), &eff.output);
            if eff.write {
                write_converted(&engine, &eff)?;
            }
            Ok(())
        }
        Commands::Report {
            project_root,
            format,
            out,
        } => {
            let eff = config::resolve_effective(
                project_root.as_deref(),
                None,
                None,
                None,
                format.as_deref(),
                out.as_deref(),
            );
            let mut engine = load_project(&eff)?;
            engine.scan_all();
            let built = engine.report();
            let rendered = match eff.report_format.as_str() {
                "csv" => report::csv(&built),
                _ => serde_json::to_string_pretty(&built).map_err(ExportError::from)?,
            };
            match &eff.report_out {
                Some(path) => {
                    fs::write(path, rendered).map_err(|source| ExportError::Write {
                        path: path.clone(),
                        source,
                    })?;
                    info!(path = %path.display(), "report written");
                }
                None => println!("{rendered}"),
            }
            Ok(())
        }
    }
}

fn load_project(eff: &config::Effective) -> anyhow::Result<Engine> {
    let mut engine = Engine::new(RuleSet::builtin());
    let loaded = ingest::ingest(engine.store_mut(), &eff.project_root, &eff.includes)
        .context("loading project files")?;
    info!(loaded, root = %eff.project_root.display(), "project loaded");
    Ok(engine)
}

fn build_filter(
    severity: Option<&str>,
    kind: Option<&str>,
    search: Option<&str>,
) -> FindingFilter {
    FindingFilter {
        search: search.map(|s| s.to_string()),
        severity: severity.and_then(Severity::parse),
        kind: kind.and_then(FindingType::parse),
    }
}

/// Write every modified artifact to disk, under `out_dir` when set,
/// otherwise in place under the project root.
fn write_converted(engine: &Engine, eff: &config::Effective) -> Result<(), ExportError> {
    let base: &Path = eff.out_dir.as_deref().unwrap_or(&eff.project_root);
    for file in engine.txn().modified_files() {
        let artifact = match engine.store().get(file) {
            Some(a) => a,
            None => continue,
        };
        let dest = base.join(file);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|source| ExportError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&dest, &artifact.content).map_err(|source| ExportError::Write {
            path: dest.clone(),
            source,
        })?;
        info!(path = %dest.display(), "converted file written");
    }
    Ok(())
}
