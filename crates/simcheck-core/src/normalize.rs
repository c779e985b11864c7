//! Whitespace normalization applied before per-file hashing.

/// Canonical form of a source file for hashing.
///
/// Every line is trimmed on both sides, lines that end up empty are dropped
/// and the rest are joined with `\n`. `\r\n` and lone `\r` terminators are
/// treated like `\n`.
pub fn normalize(raw: &str) -> String {
    raw.split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Line count as reported in the registry: line breaks plus one.
///
/// `\r\n`, lone `\r` and `\n` each count as one break.
pub fn count_lines(raw: &str) -> u64 {
    let bytes = raw.as_bytes();
    let breaks = bytes
        .iter()
        .enumerate()
        .filter(|&(i, &b)| b == b'\n' || (b == b'\r' && bytes.get(i + 1) != Some(&b'\n')))
        .count();
    breaks as u64 + 1
}
