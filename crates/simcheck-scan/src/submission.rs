//! Turning an extracted project directory into path -> text pairs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use strum::Display;

use simcheck_core::ScanConfig;

use crate::error::SubmissionError;
use crate::read::read_source;
use crate::walker::{SourceScanner, relative_path};

/// Build system detected at the project root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ProjectType {
    Maven,
    Gradle,
    Ant,
    #[strum(to_string = "Plain Java")]
    Plain,
}

/// Detect the build system from files at the project root.
pub fn detect_project_type(root: &Path) -> ProjectType {
    if root.join("pom.xml").is_file() {
        return ProjectType::Maven;
    }

    let has_gradle = std::fs::read_dir(root)
        .map(|entries| {
            entries.flatten().any(|e| {
                e.file_name()
                    .to_string_lossy()
                    .starts_with("build.gradle")
            })
        })
        .unwrap_or(false);
    if has_gradle {
        ProjectType::Gradle
    } else if root.join("build.xml").is_file() {
        ProjectType::Ant
    } else {
        ProjectType::Plain
    }
}

/// Decoded sources of one submission, ready for fingerprinting.
#[derive(Debug, Clone)]
pub struct SubmissionFiles {
    /// Project root the relative paths start from.
    pub root: PathBuf,
    /// Relative `/`-separated path to decoded text.
    pub files: BTreeMap<String, String>,
    /// Files that were selected but could not be read; not hashed.
    pub unreadable: Vec<String>,
    /// Files decoded through the Latin-1 fallback.
    pub latin1: Vec<String>,
}

impl SubmissionFiles {
    /// Number of files that will be fingerprinted.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no file will be fingerprinted.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Collect and decode every accepted file under `root`.
///
/// Fails with [`SubmissionError::NoMatchingFiles`] when nothing readable
/// remains.
pub fn load_submission(root: &Path, config: &ScanConfig) -> Result<SubmissionFiles, SubmissionError> {
    let paths = SourceScanner::new().collect(root, config)?;

    let mut files = BTreeMap::new();
    let mut unreadable = Vec::new();
    let mut latin1 = Vec::new();

    for path in paths {
        let rel = relative_path(root, &path);
        match read_source(&path) {
            Ok(text) => {
                if text.is_fallback() {
                    latin1.push(rel.clone());
                }
                files.insert(rel, text.into_string());
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable file excluded");
                unreadable.push(rel);
            }
        }
    }

    if files.is_empty() {
        return Err(SubmissionError::NoMatchingFiles {
            root: root.to_path_buf(),
        });
    }

    Ok(SubmissionFiles {
        root: root.to_path_buf(),
        files,
        unreadable,
        latin1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use simcheck_core::ExtensionProfile;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_detect_project_type() {
        let temp = TempDir::new().unwrap();
        assert_eq!(detect_project_type(temp.path()), ProjectType::Plain);

        fs::write(temp.path().join("build.xml"), "<project/>").unwrap();
        assert_eq!(detect_project_type(temp.path()), ProjectType::Ant);

        fs::write(temp.path().join("build.gradle.kts"), "").unwrap();
        assert_eq!(detect_project_type(temp.path()), ProjectType::Gradle);

        fs::write(temp.path().join("pom.xml"), "<project/>").unwrap();
        assert_eq!(detect_project_type(temp.path()), ProjectType::Maven);
        assert_eq!(ProjectType::Plain.to_string(), "Plain Java");
    }

    #[test]
    fn test_load_submission_relative_paths() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/app")).unwrap();
        fs::write(temp.path().join("src/app/Main.java"), "class Main {}").unwrap();
        fs::write(temp.path().join("src/app/Legacy.java"), [b'/', b'/', 0xE9]).unwrap();

        let config = ScanConfig::new(ExtensionProfile::JavaSources);
        let loaded = load_submission(temp.path(), &config).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.files["src/app/Main.java"], "class Main {}");
        assert_eq!(loaded.files["src/app/Legacy.java"], "//é");
        assert_eq!(loaded.latin1, vec!["src/app/Legacy.java"]);
        assert!(loaded.unreadable.is_empty());
    }

    #[test]
    fn test_load_submission_without_matches() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("notes.md"), "hi").unwrap();

        let config = ScanConfig::new(ExtensionProfile::JavaSources);
        let err = load_submission(temp.path(), &config).unwrap_err();
        assert_eq!(err.code(), "no-files");
    }
}
