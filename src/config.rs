//! Configuration discovery and effective settings resolution.
//!
//! Asmig reads `asmig.toml|yaml|yml` from the project root (or closest
//! ancestor) and merges it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `output`: `human`
//! - `scan.include`: the builtin dialect patterns
//! - `convert.write`: false
//! - `convert.outDir`: in-place (none)
//! - `report.format`: `json`
//!
//! Overrides precedence: CLI > config file > defaults.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::{DEFAULT_INCLUDES, EXTRA_INCLUDES};

#[derive(Debug, Default, Deserialize, Clone)]
/// Scanning-related configuration section under `[scan]`.
pub struct ScanCfg {
    pub include: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Conversion-related configuration section under `[convert]`.
pub struct ConvertCfg {
    pub write: Option<bool>,
    #[serde(rename = "outDir")]
    pub out_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Report-related configuration section under `[report]`.
pub struct ReportCfg {
    pub format: Option<String>,
    pub out: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `asmig.toml|yaml`.
pub struct AsmigConfig {
    pub output: Option<String>,
    #[serde(default)]
    pub scan: Option<ScanCfg>,
    #[serde(default)]
    pub convert: Option<ConvertCfg>,
    #[serde(default)]
    pub report: Option<ReportCfg>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub project_root: PathBuf,
    pub output: String,
    pub includes: Vec<String>,
    pub write: bool,
    pub out_dir: Option<PathBuf>,
    pub report_format: String,
    pub report_out: Option<PathBuf>,
}

/// Walk upward from `start` to detect the project root.
///
/// Stops when an `asmig.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_project_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if cur.join("asmig.toml").exists()
            || cur.join("asmig.yaml").exists()
            || cur.join("asmig.yml").exists()
        {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `AsmigConfig` from `asmig.toml` or `asmig.yaml|yml` if present.
pub fn load_config(root: &Path) -> Option<AsmigConfig> {
    let toml_path = root.join("asmig.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).ok()?;
        let cfg: AsmigConfig = toml::from_str(&s).ok()?;
        return Some(cfg);
    }
    for yml in ["asmig.yaml", "asmig.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).ok()?;
            let cfg: AsmigConfig = serde_yaml::from_str(&s).ok()?;
            return Some(cfg);
        }
    }
    None
}

fn default_includes() -> Vec<String> {
    DEFAULT_INCLUDES
        .iter()
        .chain(EXTRA_INCLUDES.iter())
        .map(|s| s.to_string())
        .collect()
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_project_root: Option<&str>,
    cli_output: Option<&str>,
    cli_write: Option<bool>,
    cli_out_dir: Option<&str>,
    cli_report_format: Option<&str>,
    cli_report_out: Option<&str>,
) -> Effective {
    let start = PathBuf::from(cli_project_root.unwrap_or("."));
    let project_root = detect_project_root(&start);
    let cfg = load_config(&project_root).unwrap_or_default();

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let includes = cfg
        .scan
        .as_ref()
        .and_then(|s| s.include.clone())
        .unwrap_or_else(default_includes);

    let write = cli_write
        .or_else(|| cfg.convert.as_ref().and_then(|c| c.write))
        .unwrap_or(false);

    let out_dir = cli_out_dir
        .map(|s| s.to_string())
        .or_else(|| cfg.convert.as_ref().and_then(|c| c.out_dir.clone()))
        .map(PathBuf::from);

    let report_format = cli_report_format
        .map(|s| s.to_string())
        .or_else(|| cfg.report.as_ref().and_then(|r| r.format.clone()))
        .unwrap_or_else(|| "json".to_string());

    let report_out = cli_report_out
        .map(|s| s.to_string())
        .or_else(|| cfg.report.as_ref().and_then(|r| r.out.clone()))
        .map(PathBuf::from);

    Effective {
        project_root,
        output,
        includes,
        write,
        out_dir,
        report_format,
        report_out,
    }
}
