//! The serializable similarity report and its plain-text summary.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use simcheck_core::{ContentHash, ProjectRegistry};

use crate::duplicates::{DuplicationResult, IdenticalGroup, MostDuplicated, PartialOverlap};
use crate::error::ReportError;

/// Default report file name inside the output directory.
pub const REPORT_FILE_NAME: &str = "reporte_similitud.json";

/// Hex characters kept when a hash is shown in the report.
pub const SHORT_HASH_LEN: usize = 16;

/// Partial copies at or above this percentage are flagged in the summary.
pub const HIGH_SIMILARITY: f64 = 50.0;

/// Most-copied files listed in the summary.
pub const SUMMARY_TOP_FILES: usize = 10;

/// More partial copies than this raise an alert in the summary.
pub const PARTIAL_ALERT_THRESHOLD: usize = 5;

fn short(hash: &ContentHash) -> String {
    hash.short(SHORT_HASH_LEN)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdenticalEntry {
    #[serde(rename = "alumnos")]
    pub members: Vec<String>,
    #[serde(rename = "hash_proyecto")]
    pub project_hash: String,
    #[serde(rename = "archivos_identicos")]
    pub file_count: u64,
    #[serde(rename = "total_lineas")]
    pub line_count: u64,
}

impl From<&IdenticalGroup> for IdenticalEntry {
    fn from(group: &IdenticalGroup) -> Self {
        Self {
            members: group.members.clone(),
            project_hash: short(&group.project_hash),
            file_count: group.file_count,
            line_count: group.line_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopiedFile {
    #[serde(rename = "nombre")]
    pub path: String,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialEntry {
    /// Always two identities, lower first.
    #[serde(rename = "alumnos")]
    pub members: Vec<String>,
    #[serde(rename = "porcentaje_similitud")]
    pub similarity: f64,
    #[serde(rename = "total_archivos_comunes")]
    pub common: usize,
    #[serde(rename = "archivos_copiados")]
    pub files: Vec<CopiedFile>,
}

impl From<&PartialOverlap> for PartialEntry {
    fn from(overlap: &PartialOverlap) -> Self {
        Self {
            members: vec![overlap.first.clone(), overlap.second.clone()],
            similarity: overlap.similarity,
            common: overlap.common,
            files: overlap
                .shared
                .iter()
                .map(|f| CopiedFile {
                    path: f.path.clone(),
                    hash: short(&f.hash),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MostCopiedEntry {
    #[serde(rename = "archivo")]
    pub path: String,
    pub hash: String,
    #[serde(rename = "aparece_en")]
    pub submitters: Vec<String>,
    #[serde(rename = "total_copias")]
    pub count: usize,
}

impl From<&MostDuplicated> for MostCopiedEntry {
    fn from(file: &MostDuplicated) -> Self {
        Self {
            path: file.path.clone(),
            hash: short(&file.hash),
            submitters: file.submitters.clone(),
            count: file.count(),
        }
    }
}

/// Report consumed by downstream renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityReport {
    #[serde(rename = "generado")]
    pub generated_at: NaiveDateTime,
    #[serde(rename = "total_proyectos_analizados")]
    pub projects_analyzed: usize,
    #[serde(rename = "total_grupos_identicos")]
    pub identical_count: usize,
    #[serde(rename = "total_copias_parciales")]
    pub partial_count: usize,
    #[serde(rename = "proyectos_identicos")]
    pub identical: Vec<IdenticalEntry>,
    #[serde(rename = "copias_parciales")]
    pub partial: Vec<PartialEntry>,
    #[serde(rename = "archivos_mas_copiados")]
    pub most_copied: Vec<MostCopiedEntry>,
}

impl SimilarityReport {
    /// Build a report stamped with the current local time.
    pub fn assemble(registry: &ProjectRegistry, result: &DuplicationResult) -> Self {
        Self::assemble_at(registry, result, Local::now().naive_local())
    }

    /// Build a report with an explicit timestamp.
    pub fn assemble_at(
        registry: &ProjectRegistry,
        result: &DuplicationResult,
        generated_at: NaiveDateTime,
    ) -> Self {
        Self {
            generated_at,
            projects_analyzed: registry.len(),
            identical_count: result.identical.len(),
            partial_count: result.partial.len(),
            identical: result.identical.iter().map(Into::into).collect(),
            partial: result.partial.iter().map(Into::into).collect(),
            most_copied: result.most_duplicated.iter().map(Into::into).collect(),
        }
    }

    /// Pretty JSON rendering.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Atomically write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), ReportError> {
        let io_error = |source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(io_error)?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(io_error)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, self).map_err(|source| {
                ReportError::Serialize {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            writer.flush().map_err(io_error)?;
        }
        tmp.persist(path).map_err(|e| io_error(e.error))?;

        tracing::info!(path = %path.display(), "report written");
        Ok(())
    }

    /// Whether anything should make a reviewer look closer.
    pub fn needs_attention(&self) -> bool {
        self.identical_count > 0 || self.partial_count > PARTIAL_ALERT_THRESHOLD
    }

    /// Terminal-friendly summary, one line per entry.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Projects analyzed:    {}", self.projects_analyzed),
            format!("Identical groups:     {}", self.identical_count),
            format!("Partial copies:       {}", self.partial_count),
        ];

        if !self.identical.is_empty() {
            lines.push(String::new());
            lines.push("Identical projects:".to_string());
            for (i, group) in self.identical.iter().enumerate() {
                lines.push(format!(
                    "  {}. {} ({} files, {} lines) [{}]",
                    i + 1,
                    group.members.join(", "),
                    group.file_count,
                    group.line_count,
                    group.project_hash
                ));
            }
        }

        if !self.partial.is_empty() {
            lines.push(String::new());
            lines.push("Partial copies:".to_string());
            for entry in &self.partial {
                let marker = if entry.similarity >= HIGH_SIMILARITY { "!" } else { " " };
                lines.push(format!(
                    "  {marker} {:>5.1}%  {}  ({} files in common)",
                    entry.similarity,
                    entry.members.join(" <-> "),
                    entry.common
                ));
            }
        }

        if !self.most_copied.is_empty() {
            lines.push(String::new());
            lines.push("Most copied files:".to_string());
            for file in self.most_copied.iter().take(SUMMARY_TOP_FILES) {
                lines.push(format!("  {:>3}x  {}", file.count, file.path));
            }
            if self.most_copied.len() > SUMMARY_TOP_FILES {
                lines.push(format!(
                    "  ... and {} more",
                    self.most_copied.len() - SUMMARY_TOP_FILES
                ));
            }
        }

        if self.needs_attention() {
            lines.push(String::new());
            lines.push(
                "ALERT: significant duplication detected, manual review recommended".to_string(),
            );
        }
        lines
    }
}
