use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while writing a similarity report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to serialize report for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReportError {
    /// Path of the report that could not be written.
    pub fn path(&self) -> &Path {
        match self {
            Self::Serialize { path, .. } | Self::Io { path, .. } => path,
        }
    }
}
