//! Per-submission fingerprint records.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDateTime;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::hash::{ContentHash, ProjectFingerprint};

/// Hash of one file inside a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileFingerprint {
    /// Path relative to the project root, `/`-separated.
    pub path: CompactString,
    /// Hash of the normalized content.
    pub hash: ContentHash,
}

/// Everything remembered about one submitter's latest submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// When the submission was fingerprinted (local time).
    #[serde(rename = "fecha_procesado")]
    pub processed_at: NaiveDateTime,

    /// Aggregate hash over raw file contents.
    #[serde(rename = "hash_proyecto")]
    pub project_hash: ContentHash,

    /// Relative path to file hash.
    #[serde(rename = "archivos")]
    pub files: BTreeMap<String, ContentHash>,

    /// Number of files fingerprinted.
    #[serde(rename = "total_archivos")]
    pub file_count: u64,

    /// Total line count over all files.
    #[serde(rename = "total_lineas")]
    pub line_count: u64,
}

impl ProjectRecord {
    /// Build a record from a fresh fingerprint.
    pub fn new(fingerprint: ProjectFingerprint, processed_at: NaiveDateTime) -> Self {
        Self {
            processed_at,
            project_hash: fingerprint.project_hash,
            files: fingerprint.file_hashes,
            file_count: fingerprint.file_count,
            line_count: fingerprint.line_count,
        }
    }

    /// File fingerprints in path order.
    pub fn fingerprints(&self) -> impl Iterator<Item = FileFingerprint> + '_ {
        self.files.iter().map(|(path, hash)| FileFingerprint {
            path: CompactString::new(path),
            hash: *hash,
        })
    }

    /// Distinct file hashes; files repeated inside the project count once.
    pub fn unique_hashes(&self) -> HashSet<ContentHash> {
        self.files.values().copied().collect()
    }

    /// First path, in path order, whose content has this hash.
    pub fn first_path_with(&self, hash: &ContentHash) -> Option<&str> {
        self.files
            .iter()
            .find(|(_, h)| *h == hash)
            .map(|(path, _)| path.as_str())
    }

    /// Whether the stored content matches a fingerprint (timestamp ignored).
    pub fn matches(&self, fingerprint: &ProjectFingerprint) -> bool {
        self.project_hash == fingerprint.project_hash
            && self.files == fingerprint.file_hashes
            && self.file_count == fingerprint.file_count
            && self.line_count == fingerprint.line_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(files: &[(&str, u8)]) -> ProjectRecord {
        let file_hashes: BTreeMap<String, ContentHash> = files
            .iter()
            .map(|(p, b)| (p.to_string(), ContentHash::new([*b; 32])))
            .collect();
        ProjectRecord::new(
            ProjectFingerprint {
                project_hash: ContentHash::new([0xff; 32]),
                file_count: file_hashes.len() as u64,
                file_hashes,
                line_count: 10,
            },
            chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn test_unique_hashes_deduplicate_boilerplate() {
        let rec = record(&[("a/Util.java", 1), ("b/Util.java", 1), ("Main.java", 2)]);
        assert_eq!(rec.files.len(), 3);
        assert_eq!(rec.unique_hashes().len(), 2);
    }

    #[test]
    fn test_first_path_with_uses_path_order() {
        let rec = record(&[("z/Copy.java", 1), ("a/Copy.java", 1)]);
        assert_eq!(
            rec.first_path_with(&ContentHash::new([1; 32])),
            Some("a/Copy.java")
        );
        assert_eq!(rec.first_path_with(&ContentHash::new([9; 32])), None);
    }

    #[test]
    fn test_fingerprints_in_path_order() {
        let rec = record(&[("b.java", 1), ("a.java", 2)]);
        let paths: Vec<_> = rec.fingerprints().map(|f| f.path).collect();
        assert_eq!(paths, vec!["a.java", "b.java"]);
    }

    #[test]
    fn test_serialized_field_names() {
        let rec = record(&[("Main.java", 3)]);
        let json = serde_json::to_value(&rec).unwrap();
        assert!(json.get("fecha_procesado").is_some());
        assert!(json.get("hash_proyecto").unwrap().is_string());
        assert_eq!(json["total_archivos"], 1);
        assert_eq!(json["total_lineas"], 10);
        assert_eq!(json["archivos"]["Main.java"], "03".repeat(32));
    }
}
