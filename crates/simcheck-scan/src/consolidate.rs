//! Single-file listings of a submission for manual review.
//!
//! A listing is Markdown-flavoured text: a metadata header, the directory
//! tree, every collected file in a fenced code block and closing totals.
//! Batch runs write one per submitter under [`LISTING_DIR`].

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tempfile::NamedTempFile;

use simcheck_core::{ScanConfig, count_lines, extension_of};

use crate::error::SubmissionError;
use crate::submission::{ProjectType, SubmissionFiles};

/// Directory (under the output directory) holding per-submitter listings.
pub const LISTING_DIR: &str = "consolidado";

/// Maximum number of entries drawn in the directory tree.
pub const TREE_LIMIT: usize = 50;

/// Where a batch run puts the listing of `identity`.
pub fn listing_path(output_dir: &Path, identity: &str) -> PathBuf {
    output_dir.join(LISTING_DIR).join(format!("{identity}.txt"))
}

/// Profile name and extensions, as printed in the `Mode` line.
pub fn mode_label(scan: &ScanConfig) -> String {
    format!(
        "{} ({})",
        scan.profile.kind(),
        scan.profile.extensions().join(", ")
    )
}

/// Code fence language for a file, by extension.
pub fn fence_language(path: &str) -> &'static str {
    match extension_of(path).as_deref() {
        Some(".java") => "java",
        Some(".xml") => "xml",
        Some(".properties") => "properties",
        Some(".gradle") => "gradle",
        Some(".kts") => "kotlin",
        Some(".yaml" | ".yml") => "yaml",
        Some(".json") => "json",
        Some(".sql") => "sql",
        Some(".md") => "markdown",
        Some(".sh") => "bash",
        Some(".bat" | ".cmd") => "batch",
        _ => "text",
    }
}

/// Descriptive fields printed at the top of a listing.
#[derive(Debug, Clone)]
pub struct ListingHeader {
    /// Submitter, when the listing belongs to a batch.
    pub student: Option<String>,
    /// Project name, usually the project directory name.
    pub project: String,
    /// Archive or directory the sources came from.
    pub source: PathBuf,
    pub project_type: ProjectType,
    /// Extension profile description.
    pub mode: String,
    pub generated_at: NaiveDateTime,
}

impl ListingHeader {
    /// Header stamped with the current local time.
    pub fn new(
        project: impl Into<String>,
        source: impl Into<PathBuf>,
        project_type: ProjectType,
        mode: impl Into<String>,
    ) -> Self {
        Self {
            student: None,
            project: project.into(),
            source: source.into(),
            project_type,
            mode: mode.into(),
            generated_at: Local::now().naive_local(),
        }
    }

    /// Attach the submitter name.
    pub fn with_student(mut self, student: impl Into<String>) -> Self {
        self.student = Some(student.into());
        self
    }
}

/// Totals printed at the end of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListingStats {
    pub files: usize,
    pub lines: u64,
    pub java_files: usize,
}

impl ListingStats {
    /// Files that are not `.java` sources.
    pub fn other_files(&self) -> usize {
        self.files - self.java_files
    }
}

/// A submission rendered as one document. Use `to_string()` for the text.
#[derive(Debug, Clone, Copy)]
pub struct Listing<'a> {
    header: &'a ListingHeader,
    sources: &'a SubmissionFiles,
}

impl<'a> Listing<'a> {
    pub fn new(header: &'a ListingHeader, sources: &'a SubmissionFiles) -> Self {
        Self { header, sources }
    }

    /// File and line totals over the listed sources.
    pub fn stats(&self) -> ListingStats {
        let files = &self.sources.files;
        ListingStats {
            files: files.len(),
            lines: files.values().map(|text| count_lines(text)).sum(),
            java_files: files
                .keys()
                .filter(|path| extension_of(path).as_deref() == Some(".java"))
                .count(),
        }
    }

    /// Files and every directory above them, sorted by path.
    fn tree_entries(&self) -> BTreeSet<&'a str> {
        let mut entries = BTreeSet::new();
        for path in self.sources.files.keys() {
            for (end, _) in path.match_indices('/') {
                entries.insert(&path[..end]);
            }
            entries.insert(path.as_str());
        }
        entries
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.tree_entries();
        for entry in entries.iter().take(TREE_LIMIT) {
            let depth = entry.matches('/').count();
            let name = entry.rsplit('/').next().unwrap_or(*entry);
            let slash = if self.sources.files.contains_key(*entry) {
                ""
            } else {
                "/"
            };
            writeln!(f, "{}{name}{slash}", "  ".repeat(depth))?;
        }
        if entries.len() > TREE_LIMIT {
            writeln!(f)?;
            writeln!(f, "... and {} more entries", entries.len() - TREE_LIMIT)?;
        }
        Ok(())
    }
}

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = self.header;
        let stats = self.stats();

        writeln!(f, "# Consolidated Project")?;
        writeln!(f)?;
        writeln!(
            f,
            "**Generated:** {}",
            header.generated_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(f)?;
        if let Some(student) = &header.student {
            writeln!(f, "**Student:** {student}")?;
            writeln!(f)?;
        }
        writeln!(f, "**Project:** {}", header.project)?;
        writeln!(f)?;
        writeln!(f, "**Source:** `{}`", header.source.display())?;
        writeln!(f)?;
        writeln!(f, "**Mode:** {}", header.mode)?;
        writeln!(f)?;

        writeln!(f, "## Metadata")?;
        writeln!(f)?;
        writeln!(f, "- **Project type:** {}", header.project_type)?;
        writeln!(f, "- **Total files:** {}", stats.files)?;
        writeln!(f)?;

        writeln!(f, "## Directory Structure")?;
        writeln!(f)?;
        writeln!(f, "```")?;
        self.write_tree(f)?;
        writeln!(f, "```")?;
        writeln!(f)?;

        writeln!(f, "## File Contents")?;
        writeln!(f)?;
        writeln!(f, "---")?;
        writeln!(f)?;
        for (path, text) in &self.sources.files {
            let fence = fence_for(text);
            writeln!(f, "### `{path}`")?;
            writeln!(f)?;
            writeln!(
                f,
                "**Lines:** {} | **Type:** {}",
                count_lines(text),
                extension_of(path).unwrap_or_else(|| "(none)".to_string())
            )?;
            writeln!(f)?;
            writeln!(f, "{fence}{}", fence_language(path))?;
            f.write_str(text)?;
            if !text.ends_with('\n') {
                writeln!(f)?;
            }
            writeln!(f, "{fence}")?;
            writeln!(f)?;
            writeln!(f, "---")?;
            writeln!(f)?;
        }

        writeln!(f, "## Statistics")?;
        writeln!(f)?;
        writeln!(f, "- **Files processed:** {}", stats.files)?;
        writeln!(f, "- **Lines:** {}", stats.lines)?;
        writeln!(f, "- **Java files:** {}", stats.java_files)?;
        writeln!(f, "- **Other files:** {}", stats.other_files())
    }
}

/// Backtick fence longer than any backtick run inside `text`.
fn fence_for(text: &str) -> String {
    let longest = text
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

/// Atomically write a rendered listing, creating parent directories.
pub fn write_listing(path: &Path, listing: &Listing<'_>) -> Result<ListingStats, SubmissionError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| SubmissionError::io(path, e))?;

    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| SubmissionError::io(path, e))?;
    tmp.write_all(listing.to_string().as_bytes())
        .map_err(|e| SubmissionError::io(path, e))?;
    tmp.persist(path)
        .map_err(|e| SubmissionError::io(path, e.error))?;

    let stats = listing.stats();
    tracing::info!(path = %path.display(), files = stats.files, "listing written");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sources(entries: &[(&str, &str)]) -> SubmissionFiles {
        SubmissionFiles {
            root: PathBuf::from("proyecto"),
            files: entries
                .iter()
                .map(|(path, text)| (path.to_string(), text.to_string()))
                .collect::<BTreeMap<_, _>>(),
            unreadable: Vec::new(),
            latin1: Vec::new(),
        }
    }

    fn header() -> ListingHeader {
        let mut header =
            ListingHeader::new("proyecto", "entregas/ana/entrega.zip", ProjectType::Maven, "full")
                .with_student("ana");
        header.generated_at = NaiveDateTime::parse_from_str("2024-03-01 10:00:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        header
    }

    #[test]
    fn test_mode_label() {
        let scan = ScanConfig::new(simcheck_core::ExtensionProfile::JavaSources);
        assert_eq!(mode_label(&scan), "java (.java)");
    }

    #[test]
    fn test_fence_language() {
        assert_eq!(fence_language("src/Main.java"), "java");
        assert_eq!(fence_language("build.gradle.kts"), "kotlin");
        assert_eq!(fence_language("config.YML"), "yaml");
        assert_eq!(fence_language("run.cmd"), "batch");
        assert_eq!(fence_language("LICENSE"), "text");
        assert_eq!(fence_language("notes.csv"), "text");
    }

    #[test]
    fn test_listing_sections() {
        let files = sources(&[
            ("pom.xml", "<project/>"),
            ("src/main/Main.java", "class Main {\n}\n"),
        ]);
        let header = header();
        let text = Listing::new(&header, &files).to_string();

        assert!(text.starts_with("# Consolidated Project\n"));
        assert!(text.contains("**Generated:** 2024-03-01 10:00:00"));
        assert!(text.contains("**Student:** ana"));
        assert!(text.contains("- **Project type:** Maven"));
        assert!(text.contains("- **Total files:** 2"));
        assert!(text.contains("pom.xml\nsrc/\n  main/\n    Main.java\n"));
        assert!(text.contains("### `src/main/Main.java`\n\n**Lines:** 3 | **Type:** .java"));
        assert!(text.contains("```java\nclass Main {\n}\n```\n"));
        assert!(text.contains("```xml\n<project/>\n```\n"));
        assert!(text.contains("- **Lines:** 4"));
        assert!(text.contains("- **Java files:** 1"));
        assert!(text.ends_with("- **Other files:** 1\n"));
    }

    #[test]
    fn test_listing_without_student() {
        let files = sources(&[("A.java", "class A {}")]);
        let header = ListingHeader::new("proyecto", "proyecto", ProjectType::Plain, "java");
        let text = Listing::new(&header, &files).to_string();
        assert!(!text.contains("**Student:**"));
        assert!(text.contains("- **Project type:** Plain Java"));
    }

    #[test]
    fn test_tree_is_capped() {
        let names: Vec<String> = (0..60).map(|i| format!("src/F{i:02}.java")).collect();
        let entries: Vec<(&str, &str)> = names.iter().map(|n| (n.as_str(), "")).collect();
        let files = sources(&entries);
        let header = header();
        let text = Listing::new(&header, &files).to_string();

        // "src" plus 60 files, 50 drawn
        assert!(text.contains("  F48.java\n"));
        assert!(!text.contains("  F49.java\n"));
        assert!(text.contains("... and 11 more entries"));
    }

    #[test]
    fn test_fence_outgrows_embedded_backticks() {
        let files = sources(&[("README.md", "```rust\nfn main() {}\n```\n")]);
        let header = header();
        let text = Listing::new(&header, &files).to_string();
        assert!(text.contains("````markdown\n```rust\n"));
        assert!(text.contains("```\n````\n"));
    }

    #[test]
    fn test_write_listing() {
        let temp = tempfile::TempDir::new().unwrap();
        let files = sources(&[("A.java", "class A {}\r\n\r\n")]);
        let header = header();
        let path = listing_path(temp.path(), "ana");
        assert!(path.ends_with("consolidado/ana.txt"));

        let stats = write_listing(&path, &Listing::new(&header, &files)).unwrap();
        assert_eq!(
            stats,
            ListingStats {
                files: 1,
                lines: 3,
                java_files: 1
            }
        );
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("**Student:** ana"));
    }

    #[test]
    fn test_write_listing_under_a_file_fails() {
        let temp = tempfile::TempDir::new().unwrap();
        fs::write(temp.path().join("consolidado"), "").unwrap();
        let files = sources(&[("A.java", "class A {}")]);
        let header = header();

        let err = write_listing(&listing_path(temp.path(), "ana"), &Listing::new(&header, &files))
            .unwrap_err();
        assert_eq!(err.code(), "io");
    }
}
