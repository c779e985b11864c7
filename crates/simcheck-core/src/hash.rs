//! BLAKE3 fingerprints for single files and whole projects.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseHashError;
use crate::normalize::{count_lines, normalize};

/// Length of a rendered digest in hex characters.
pub const HEX_LEN: usize = 64;

/// BLAKE3 content hash, rendered as 64 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hash arbitrary bytes.
    pub fn of(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// First `len` hex characters followed by `...`, for display.
    pub fn short(&self, len: usize) -> String {
        let hex = self.to_hex();
        format!("{}...", &hex[..len.min(HEX_LEN)])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != HEX_LEN {
            return Err(ParseHashError::Length { found: s.len() });
        }

        blake3::Hash::from_hex(s)
            .map(|hash| Self(*hash.as_bytes()))
            .map_err(|e| ParseHashError::Hex {
                message: e.to_string(),
            })
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Hash already-normalized file content.
pub fn file_hash(normalized: &str) -> ContentHash {
    ContentHash::of(normalized.as_bytes())
}

/// Hash a whole project from its raw (non-normalized) file contents.
///
/// Entries are visited in byte order of their path and fed to the hasher as
/// `path:content`, so the result does not depend on the order in which the
/// archive listed its files.
pub fn project_hash<P, C>(files: impl IntoIterator<Item = (P, C)>) -> ContentHash
where
    P: AsRef<str>,
    C: AsRef<str>,
{
    let mut entries: Vec<(P, C)> = files.into_iter().collect();
    entries.sort_by(|a, b| a.0.as_ref().as_bytes().cmp(b.0.as_ref().as_bytes()));

    let mut hasher = blake3::Hasher::new();
    for (path, content) in &entries {
        hasher.update(path.as_ref().as_bytes());
        hasher.update(b":");
        hasher.update(content.as_ref().as_bytes());
    }
    ContentHash(*hasher.finalize().as_bytes())
}

/// Everything the registry stores about one submission's files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFingerprint {
    /// Aggregate hash over raw content.
    pub project_hash: ContentHash,
    /// Relative path to normalized-content hash.
    pub file_hashes: BTreeMap<String, ContentHash>,
    /// Number of files fingerprinted.
    pub file_count: u64,
    /// Sum of per-file line counts.
    pub line_count: u64,
}

/// Fingerprint every file of a project plus the project as a whole.
pub fn fingerprint_project(files: &BTreeMap<String, String>) -> ProjectFingerprint {
    let file_hashes = files
        .iter()
        .map(|(path, content)| (path.clone(), file_hash(&normalize(content))))
        .collect();
    let line_count = files.values().map(|content| count_lines(content)).sum();

    ProjectFingerprint {
        project_hash: project_hash(files.iter()),
        file_hashes,
        file_count: files.len() as u64,
        line_count,
    }
}
