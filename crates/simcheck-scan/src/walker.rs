//! JWalk-based collection of the files a profile accepts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use jwalk::{Parallelism, WalkDir};

use simcheck_core::ScanConfig;

use crate::error::SubmissionError;

/// Collects candidate source files under a project root.
///
/// The walk is serial and sorted so that two runs over the same tree see
/// files in the same order.
#[derive(Debug, Default)]
pub struct SourceScanner;

impl SourceScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        Self
    }

    /// Sorted absolute paths of every accepted file under `root`.
    pub fn collect(&self, root: &Path, config: &ScanConfig) -> Result<Vec<PathBuf>, SubmissionError> {
        if !root.is_dir() {
            return Err(SubmissionError::io(
                root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            ));
        }

        let ignore = config.ignore_set()?;
        let prune = Arc::new(config.clone());

        let walker = WalkDir::new(root)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(false)
            .follow_links(false)
            .process_read_dir(move |_depth, _path, _state, children| {
                children.retain(|entry| match entry {
                    Ok(e) if e.file_type().is_dir() => {
                        !prune.should_skip_dir(&e.file_name().to_string_lossy())
                    }
                    _ => true,
                });
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|err| SubmissionError::Walk {
                path: err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf()),
                message: err.to_string(),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if !config.accepts_file(&name) {
                continue;
            }

            let path = entry.path();
            if !config.ignore_patterns.is_empty() && ignore.is_match(relative_path(root, &path)) {
                tracing::trace!(path = %path.display(), "ignored by pattern");
                continue;
            }
            files.push(path);
        }

        files.sort();
        Ok(files)
    }
}

/// `/`-separated path of `path` relative to `root`.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
