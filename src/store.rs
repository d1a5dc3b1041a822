//! In-memory artifact store.
//!
//! Scanning and conversion never touch the filesystem; ingest loads file
//! contents into the store and the CLI writes converted artifacts back out.
//! Artifacts are keyed by their project-relative path in a `BTreeMap` so
//! iteration order (and therefore finding discovery order) is stable.

use std::collections::BTreeMap;
use std::path::Path;

/// Source dialect, classified from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// IEC / ANSI C sources: .st, .fun, .prg
    Code,
    /// Generic hardware and mapping XML: .hw, .hwl, .xml, .iom, .vvm
    Xml,
    /// The AS4 project manifest: .apj
    ProjectManifest,
    /// Package manifests: .pkg
    PackageManifest,
    /// Software (task) configuration: .sw
    SoftwareConfig,
    /// Axis init tables: .ax
    AxisInit,
    /// Axis parameter tables: .apt
    AxisParameters,
    /// NC mapping tables: .ncm
    NcMapping,
    /// NC configuration: .ncc
    NcConfig,
    /// Translation memory files: .tmx
    Localization,
    Unknown,
}

impl Dialect {
    /// Classify a path by extension, case-insensitively.
    pub fn classify(path: &str) -> Dialect {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "st" | "fun" | "prg" => Dialect::Code,
            "hw" | "hwl" | "xml" | "iom" | "vvm" => Dialect::Xml,
            "apj" => Dialect::ProjectManifest,
            "pkg" => Dialect::PackageManifest,
            "sw" => Dialect::SoftwareConfig,
            "ax" => Dialect::AxisInit,
            "apt" => Dialect::AxisParameters,
            "ncm" => Dialect::NcMapping,
            "ncc" => Dialect::NcConfig,
            "tmx" => Dialect::Localization,
            _ => Dialect::Unknown,
        }
    }
}

/// One ingested file: relative path, current content, and dialect.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: String,
    pub content: String,
    pub dialect: Dialect,
}

/// Deterministic map of project-relative path to artifact.
#[derive(Debug, Default)]
pub struct ArtifactStore {
    artifacts: BTreeMap<String, Artifact>,
}

impl ArtifactStore {
    pub fn new() -> ArtifactStore {
        ArtifactStore::default()
    }

    /// Insert or overwrite an artifact under its relative path.
    pub fn put(&mut self, path: &str, content: String) {
        self.artifacts.insert(
            path.to_string(),
            Artifact {
                path: path.to_string(),
                content,
                dialect: Dialect::classify(path),
            },
        );
    }

    pub fn get(&self, path: &str) -> Option<&Artifact> {
        self.artifacts.get(path)
    }

    /// Replace the content of an existing artifact. Only the transaction
    /// log mutates content, so this stays crate-private.
    pub(crate) fn set_content(&mut self, path: &str, content: String) -> bool {
        match self.artifacts.get_mut(path) {
            Some(artifact) => {
                artifact.content = content;
                true
            }
            None => false,
        }
    }

    /// Artifacts in ascending path order.
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.values()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn clear(&mut self) {
        self.artifacts.clear();
    }
}
