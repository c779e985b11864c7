//! Archive discovery and extraction.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::error::SubmissionError;

/// Metadata directory macOS adds to archives; never a project root.
const MACOS_METADATA_DIR: &str = "__MACOSX";

/// `.zip` files directly inside `dir`, sorted by file name.
pub fn find_archives(dir: &Path) -> Result<Vec<PathBuf>, SubmissionError> {
    let entries = fs::read_dir(dir).map_err(|e| SubmissionError::io(dir, e))?;

    let mut archives = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SubmissionError::io(dir, e))?;
        let path = entry.path();
        let is_zip = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
        if is_zip && path.is_file() {
            archives.push(path);
        }
    }
    archives.sort();
    Ok(archives)
}

/// Extract `archive` into `dest` and return the project root.
///
/// When the archive unpacks to a single top-level directory, that directory
/// is the root; otherwise `dest` is. Entry names are confined to `dest` by
/// the zip reader.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<PathBuf, SubmissionError> {
    let archive_err = |source| SubmissionError::Archive {
        path: archive.to_path_buf(),
        source,
    };

    let file = File::open(archive).map_err(|e| SubmissionError::io(archive, e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(archive_err)?;
    tracing::debug!(archive = %archive.display(), entries = zip.len(), "extracting");
    zip.extract(dest).map_err(archive_err)?;

    project_root(dest)
}

/// Collapse a lone top-level directory into the project root.
fn project_root(dest: &Path) -> Result<PathBuf, SubmissionError> {
    let mut top_level = Vec::new();
    for entry in fs::read_dir(dest).map_err(|e| SubmissionError::io(dest, e))? {
        let entry = entry.map_err(|e| SubmissionError::io(dest, e))?;
        if entry.file_name() != MACOS_METADATA_DIR {
            top_level.push(entry.path());
        }
    }

    match top_level.as_slice() {
        [only] if only.is_dir() => Ok(only.clone()),
        _ => Ok(dest.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, content) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_find_archives_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.zip"), "").unwrap();
        fs::write(temp.path().join("A.ZIP"), "").unwrap();
        fs::write(temp.path().join("notes.txt"), "").unwrap();

        let found = find_archives(temp.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["A.ZIP", "b.zip"]);
    }

    #[test]
    fn test_extract_collapses_single_directory() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("entrega.zip");
        write_zip(
            &archive,
            &[
                ("proyecto/src/Main.java", "class Main {}"),
                ("__MACOSX/proyecto/._Main.java", "junk"),
            ],
        );

        let dest = temp.path().join("out");
        fs::create_dir(&dest).unwrap();
        let root = extract_archive(&archive, &dest).unwrap();
        assert_eq!(root, dest.join("proyecto"));
        assert!(root.join("src/Main.java").is_file());
    }

    #[test]
    fn test_extract_flat_archive_uses_dest() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("entrega.zip");
        write_zip(&archive, &[("Main.java", "a"), ("Util.java", "b")]);

        let dest = temp.path().join("out");
        fs::create_dir(&dest).unwrap();
        assert_eq!(extract_archive(&archive, &dest).unwrap(), dest);
    }

    #[test]
    fn test_corrupt_archive_is_reported() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("broken.zip");
        fs::write(&archive, "definitely not a zip").unwrap();

        let err = extract_archive(&archive, temp.path()).unwrap_err();
        assert_eq!(err.code(), "bad-archive");
    }
}
