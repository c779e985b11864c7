//! Per-submission failure reasons.

use std::path::PathBuf;

use simcheck_core::ConfigError;
use thiserror::Error;

/// Why a submission could not be fingerprinted.
///
/// Everything except [`SubmissionError::RootMissing`] is recorded in the
/// submission's outcome and the batch moves on.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The submissions root does not exist or is not a directory.
    #[error("Submissions directory not found: {path}")]
    RootMissing { path: PathBuf },

    /// No `.zip` archive in the submitter's directory.
    #[error("No archive found in {dir}")]
    NoArchive { dir: PathBuf },

    /// The archive could not be opened or extracted.
    #[error("Unreadable archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Filesystem error while preparing or walking the submission.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Walking the extracted project failed.
    #[error("Failed to walk {path}: {message}")]
    Walk { path: PathBuf, message: String },

    /// Nothing in the project matched the extension profile.
    #[error("No files matching the selected profile under {root}")]
    NoMatchingFiles { root: PathBuf },

    /// The scan configuration could not be applied.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SubmissionError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short stable code for tallies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RootMissing { .. } => "root-missing",
            Self::NoArchive { .. } => "no-archive",
            Self::Archive { .. } => "bad-archive",
            Self::Io { .. } => "io",
            Self::Walk { .. } => "walk",
            Self::NoMatchingFiles { .. } => "no-files",
            Self::Config(_) => "config",
        }
    }
}
