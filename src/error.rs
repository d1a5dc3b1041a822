//! Error types for the filesystem-facing edges. The core stays
//! infallible by construction; only ingest and export can fail.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid include pattern `{pattern}`")]
    BadPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("project root `{}` does not exist", root.display())]
    MissingRoot { root: PathBuf },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write `{path}`")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize report")]
    Serialize(#[from] serde_json::Error),
}
