//! Best-effort text decoding of source files.

use std::fs;
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decoded file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceText {
    /// Valid UTF-8 (BOM removed).
    Utf8(String),
    /// Not UTF-8; every byte mapped through Latin-1.
    Latin1(String),
}

impl SourceText {
    /// The decoded text.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Utf8(s) | Self::Latin1(s) => s,
        }
    }

    /// Take the decoded text.
    pub fn into_string(self) -> String {
        match self {
            Self::Utf8(s) | Self::Latin1(s) => s,
        }
    }

    /// Whether the Latin-1 fallback was needed.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Latin1(_))
    }
}

/// Decode bytes as UTF-8, falling back to Latin-1 (which accepts any input).
pub fn decode(bytes: Vec<u8>) -> SourceText {
    let bytes = match bytes.strip_prefix(UTF8_BOM) {
        Some(rest) => rest.to_vec(),
        None => bytes,
    };
    match String::from_utf8(bytes) {
        Ok(text) => SourceText::Utf8(text),
        Err(e) => SourceText::Latin1(e.into_bytes().iter().map(|&b| char::from(b)).collect()),
    }
}

/// Read and decode a file. Only I/O failures are errors.
pub fn read_source(path: &Path) -> std::io::Result<SourceText> {
    fs::read(path).map(decode)
}
