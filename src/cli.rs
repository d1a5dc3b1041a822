//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "asmig",
    version,
    about = "AS4 to AS6 migration assistant",
    long_about = "Asmig — scan B&R Automation Studio 4 projects for deprecated libraries, functions, and hardware, and apply AS6 conversions.\n\nConfiguration precedence: CLI > asmig.toml > defaults.",
    after_help = "Examples:\n  asmig scan --project-root ./MyProject\n  asmig scan --severity error --output json\n  asmig convert --project-root ./MyProject --write --out-dir converted\n  asmig report --project-root ./MyProject --format csv --out report.csv",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands for scanning, converting, and reporting.
pub enum Commands {
    /// Show version
    #[command(
        about = "Show version",
        long_about = "Print the current asmig version."
    )]
    Version,
    /// Scan a project for deprecated constructs
    #[command(
        about = "Scan for deprecated constructs",
        long_about = "Load the project into memory and run every dialect scanner. Errors contribute to CI exits.",
        after_help = "Examples:\n  asmig scan --project-root ./MyProject\n  asmig scan --severity warning --type hardware --output json"
    )]
    Scan {
        #[arg(long, help = "Project root (default: current dir)")]
        project_root: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, help = "Only findings of this severity: error|warning|info")]
        severity: Option<String>,
        #[arg(long = "type", help = "Only findings of this type (e.g. library, hardware)")]
        kind: Option<String>,
        #[arg(long, help = "Substring filter over name and description")]
        search: Option<String>,
    },
    /// Apply conversions for scanned findings
    #[command(
        about = "Apply conversions",
        long_about = "Scan, apply every automatic conversion, and print the result. Without --write nothing touches disk.",
        after_help = "Examples:\n  asmig convert --project-root ./MyProject\n  asmig convert --project-root ./MyProject --write --out-dir converted"
    )]
    Convert {
        #[arg(long, help = "Project root (default: current dir)")]
        project_root: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Write converted files to disk")]
        write: bool,
        #[arg(long, help = "Directory for converted files (default: in place)")]
        out_dir: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, help = "Only findings of this severity: error|warning|info")]
        severity: Option<String>,
    },
    /// Produce a migration report
    #[command(
        about = "Produce a migration report",
        long_about = "Scan and emit the full report in JSON or CSV. The report is deterministic for a given project state.",
        after_help = "Examples:\n  asmig report --project-root ./MyProject\n  asmig report --format csv --out report.csv"
    )]
    Report {
        #[arg(long, help = "Project root (default: current dir)")]
        project_root: Option<String>,
        #[arg(long, help = "Report format: json|csv (default: json)")]
        format: Option<String>,
        #[arg(long, help = "Write the report to this file instead of stdout")]
        out: Option<String>,
    },
}
