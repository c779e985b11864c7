//! Sequential ingestion of a directory of submissions.
//!
//! Layout expected under the submissions root: one directory per submitter,
//! named after them, holding the `.zip` they handed in. Submitters are
//! processed one at a time in name order; a failure is recorded in that
//! submitter's [`SubmissionOutcome`] and the loop continues.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tokio::sync::broadcast;

use simcheck_core::{ProjectRegistry, ScanConfig, fingerprint_project};

use crate::archive::{extract_archive, find_archives};
use crate::consolidate::{Listing, ListingHeader, listing_path, mode_label, write_listing};
use crate::error::SubmissionError;
use crate::progress::BatchProgress;
use crate::submission::{ProjectType, SubmissionFiles, detect_project_type, load_submission};

/// Where submissions live and how to read them.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Directory holding one subdirectory per submitter.
    pub submissions_root: PathBuf,
    /// File selection rules.
    pub scan: ScanConfig,
}

impl BatchConfig {
    /// Create a batch config.
    pub fn new(submissions_root: impl Into<PathBuf>, scan: ScanConfig) -> Self {
        Self {
            submissions_root: submissions_root.into(),
            scan,
        }
    }
}

/// What was ingested for a successful submission.
#[derive(Debug, Clone)]
pub struct SubmissionStats {
    /// Archive that was extracted (`None` for directory ingestion).
    pub archive: Option<PathBuf>,
    /// Additional archives that were ignored.
    pub ignored_archives: usize,
    /// Detected build system.
    pub project_type: ProjectType,
    /// Files fingerprinted.
    pub file_count: u64,
    /// Lines over all fingerprinted files.
    pub line_count: u64,
    /// Selected files that could not be read and were left out.
    pub unreadable: Vec<String>,
    /// Files decoded through the Latin-1 fallback.
    pub latin1: Vec<String>,
    /// A previous record for this submitter was replaced.
    pub replaced: bool,
    /// The replaced record had exactly the same content.
    pub unchanged: bool,
    /// Consolidated listing written for this submission, if requested.
    pub listing: Option<PathBuf>,
}

/// Result of processing one submitter.
#[derive(Debug)]
pub struct SubmissionOutcome {
    /// Submitter identity (directory name).
    pub identity: String,
    /// Stats on success, reason on failure.
    pub result: Result<SubmissionStats, SubmissionError>,
}

impl SubmissionOutcome {
    /// Whether the submission made it into the registry.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Failure message, if any.
    pub fn reason(&self) -> Option<String> {
        self.result.as_ref().err().map(ToString::to_string)
    }
}

/// Per-run tally of outcomes.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Outcomes in processing order.
    pub outcomes: Vec<SubmissionOutcome>,
    /// Wall time of the run.
    pub elapsed: Duration,
}

impl BatchSummary {
    /// Number of successful submissions.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of failed submissions.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Failed outcomes in processing order.
    pub fn failures(&self) -> impl Iterator<Item = &SubmissionOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// Total submissions seen.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether no submission was found.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Drives a batch run against a registry.
pub struct BatchRunner {
    progress_tx: broadcast::Sender<BatchProgress>,
    listing_dir: Option<PathBuf>,
}

impl BatchRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            progress_tx,
            listing_dir: None,
        }
    }

    /// Also write a consolidated listing per submission under `output_dir`.
    pub fn with_listings(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.listing_dir = Some(output_dir.into());
        self
    }

    /// Subscribe to per-submission progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<BatchProgress> {
        self.progress_tx.subscribe()
    }

    /// Process every submitter directory under the root.
    ///
    /// Only a missing or unreadable root is an error; individual failures
    /// end up in the returned summary.
    pub fn run(
        &self,
        config: &BatchConfig,
        registry: &mut ProjectRegistry,
    ) -> Result<BatchSummary, SubmissionError> {
        let start = Instant::now();
        let submitters = list_submitters(&config.submissions_root)?;
        let total = submitters.len();
        tracing::info!(
            root = %config.submissions_root.display(),
            total,
            "starting batch"
        );

        let mut summary = BatchSummary::default();
        for (identity, dir) in submitters {
            let result = self.process_submission(&identity, &dir, &config.scan, registry);
            match &result {
                Ok(stats) => tracing::info!(
                    %identity,
                    files = stats.file_count,
                    lines = stats.line_count,
                    "submission ingested"
                ),
                Err(e) => tracing::warn!(%identity, code = e.code(), error = %e, "submission failed"),
            }
            summary.outcomes.push(SubmissionOutcome {
                identity: identity.clone(),
                result,
            });

            // No subscribers is fine.
            let _ = self.progress_tx.send(BatchProgress {
                processed: summary.len(),
                total,
                current: identity,
                failures: summary.failed(),
                elapsed: start.elapsed(),
            });
        }

        summary.elapsed = start.elapsed();
        Ok(summary)
    }

    /// Extract one submitter's archive into a temporary directory and ingest it.
    pub fn process_submission(
        &self,
        identity: &str,
        dir: &Path,
        scan: &ScanConfig,
        registry: &mut ProjectRegistry,
    ) -> Result<SubmissionStats, SubmissionError> {
        let archives = find_archives(dir)?;
        let Some(archive) = archives.first() else {
            return Err(SubmissionError::NoArchive {
                dir: dir.to_path_buf(),
            });
        };
        if archives.len() > 1 {
            tracing::warn!(
                %identity,
                using = %archive.display(),
                count = archives.len(),
                "several archives found, using the first"
            );
        }

        let workdir = TempDir::new().map_err(|e| SubmissionError::io(dir, e))?;
        let root = extract_archive(archive, workdir.path())?;
        let project_type = detect_project_type(&root);
        let loaded = load_submission(&root, scan)?;

        let listing = self.listing_dir.as_deref().and_then(|output_dir| {
            // Archives without a lone top-level directory are named after the submitter.
            let project = root
                .strip_prefix(workdir.path())
                .ok()
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| identity.to_string());
            let header = ListingHeader::new(project, archive, project_type, mode_label(scan))
                .with_student(identity);
            let path = listing_path(output_dir, identity);
            match write_listing(&path, &Listing::new(&header, &loaded)) {
                Ok(_) => Some(path),
                Err(e) => {
                    tracing::warn!(%identity, error = %e, "listing not written");
                    None
                }
            }
        });

        let mut stats = record_submission(identity, project_type, loaded, registry);
        stats.archive = Some(archive.clone());
        stats.ignored_archives = archives.len() - 1;
        stats.listing = listing;
        Ok(stats)
    }
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Fingerprint an already-extracted project and upsert it.
pub fn ingest_project(
    identity: &str,
    root: &Path,
    scan: &ScanConfig,
    registry: &mut ProjectRegistry,
) -> Result<SubmissionStats, SubmissionError> {
    let project_type = detect_project_type(root);
    let loaded = load_submission(root, scan)?;
    Ok(record_submission(identity, project_type, loaded, registry))
}

fn record_submission(
    identity: &str,
    project_type: ProjectType,
    loaded: SubmissionFiles,
    registry: &mut ProjectRegistry,
) -> SubmissionStats {
    let fingerprint = fingerprint_project(&loaded.files);

    let previous = registry.get(identity);
    let replaced = previous.is_some();
    let unchanged = previous.is_some_and(|record| record.matches(&fingerprint));

    let stats = SubmissionStats {
        archive: None,
        ignored_archives: 0,
        project_type,
        file_count: fingerprint.file_count,
        line_count: fingerprint.line_count,
        unreadable: loaded.unreadable,
        latin1: loaded.latin1,
        replaced,
        unchanged,
        listing: None,
    };
    registry.upsert(identity, fingerprint);
    stats
}

/// Submitter directories under `root`, sorted by name.
fn list_submitters(root: &Path) -> Result<Vec<(String, PathBuf)>, SubmissionError> {
    if !root.is_dir() {
        return Err(SubmissionError::RootMissing {
            path: root.to_path_buf(),
        });
    }

    let mut submitters = Vec::new();
    for entry in std::fs::read_dir(root).map_err(|e| SubmissionError::io(root, e))? {
        let entry = entry.map_err(|e| SubmissionError::io(root, e))?;
        let path = entry.path();
        if path.is_dir() {
            let identity = entry.file_name().to_string_lossy().into_owned();
            submitters.push((identity, path));
        }
    }
    submitters.sort();
    Ok(submitters)
}
