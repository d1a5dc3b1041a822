//! Filesystem ingest: load project files into the artifact store.
//!
//! This is the only place that reads project files from disk. Paths are
//! stored relative to the project root with forward slashes, so finding
//! files and reports are identical across platforms. Unreadable files are
//! logged and skipped rather than failing the whole scan.

use std::fs;
use std::path::Path;

use glob::glob;
use tracing::{debug, warn};

use crate::error::IngestError;
use crate::store::{ArtifactStore, Dialect};

/// Default include patterns covering every dialect the scanners handle.
pub const DEFAULT_INCLUDES: [&str; 15] = [
    "**/*.apj", "**/*.pkg", "**/*.st", "**/*.fun", "**/*.prg", "**/*.hw", "**/*.hwl",
    "**/*.xml", "**/*.iom", "**/*.vvm", "**/*.sw", "**/*.ax", "**/*.apt", "**/*.ncm",
    "**/*.ncc",
];

/// Patterns beyond the defaults that only feed side tables.
pub const EXTRA_INCLUDES: [&str; 1] = ["**/*.tmx"];

/// Load everything matching `includes` under `root` into the store.
/// Returns the number of artifacts loaded.
pub fn ingest(
    store: &mut ArtifactStore,
    root: &Path,
    includes: &[String],
) -> Result<usize, IngestError> {
    if !root.exists() {
        return Err(IngestError::MissingRoot {
            root: root.to_path_buf(),
        });
    }
    let mut loaded = 0usize;
    for include in includes {
        let pattern = root.join(include);
        let pattern = pattern.to_string_lossy();
        let paths = glob(&pattern).map_err(|source| IngestError::BadPattern {
            pattern: include.clone(),
            source,
        })?;
        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable path");
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            let relative = relative_key(root, &path);
            if Dialect::classify(&relative) == Dialect::Unknown {
                continue;
            }
            match fs::read_to_string(&path) {
                Ok(content) => {
                    debug!(path = relative, "ingested");
                    store.put(&relative, content);
                    loaded += 1;
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping file");
                }
            }
        }
    }
    Ok(loaded)
}

/// Ingest with the default pattern set.
pub fn ingest_defaults(store: &mut ArtifactStore, root: &Path) -> Result<usize, IngestError> {
    let includes: Vec<String> = DEFAULT_INCLUDES
        .iter()
        .chain(EXTRA_INCLUDES.iter())
        .map(|s| s.to_string())
        .collect();
    ingest(store, root, &includes)
}

/// Project-relative key with forward slashes.
fn relative_key(root: &Path, path: &Path) -> String {
    let relative = pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf());
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_ingest_defaults_loads_known_dialects() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Logical")).unwrap();
        fs::write(dir.path().join("Demo.apj"), "<Project />").unwrap();
        fs::write(dir.path().join("Logical/Main.st"), "PROGRAM _INIT").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut store = ArtifactStore::new();
        let loaded = ingest_defaults(&mut store, dir.path()).unwrap();
        assert_eq!(loaded, 2);
        assert!(store.get("Demo.apj").is_some());
        assert!(store.get("Logical/Main.st").is_some());
        assert!(store.get("notes.txt").is_none());
    }

    #[test]
    fn test_keys_use_forward_slashes() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/b/x.st"), "x").unwrap();
        let mut store = ArtifactStore::new();
        ingest_defaults(&mut store, dir.path()).unwrap();
        assert!(store.get("a/b/x.st").is_some());
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-project");
        let mut store = ArtifactStore::new();
        let err = ingest_defaults(&mut store, &missing).unwrap_err();
        assert!(matches!(err, IngestError::MissingRoot { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_bad_pattern_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ArtifactStore::new();
        let result = ingest(&mut store, dir.path(), &["[".to_string()]);
        assert!(result.is_err());
    }
}
