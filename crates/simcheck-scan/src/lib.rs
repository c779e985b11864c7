//! Submission discovery and source collection for simcheck.
//!
//! # Overview
//!
//! `simcheck-scan` turns a directory of submissions into registry records:
//!
//! - **Archive handling** via `zip`, one archive per submitter directory
//! - **File selection** via a serial, sorted jwalk traversal
//! - **Text decoding** with a Latin-1 fallback for legacy encodings
//! - **Progress updates** via broadcast channels
//! - **Consolidated listings** of each submission for manual review
//!
//! # Example
//!
//! ```rust,no_run
//! use simcheck_core::{RegistryStore, ScanConfig};
//! use simcheck_scan::{BatchConfig, BatchRunner};
//!
//! let store = RegistryStore::in_dir("resultados");
//! let (mut registry, _) = store.load();
//!
//! let config = BatchConfig::new("entregas", ScanConfig::default());
//! let summary = BatchRunner::new().run(&config, &mut registry).unwrap();
//! store.save(&mut registry).unwrap();
//!
//! println!("{} ok, {} failed", summary.succeeded(), summary.failed());
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use simcheck_scan::BatchRunner;
//!
//! let runner = BatchRunner::new();
//! let mut progress_rx = runner.subscribe();
//!
//! std::thread::spawn(move || {
//!     while let Ok(progress) = progress_rx.blocking_recv() {
//!         println!("{}/{} {}", progress.processed, progress.total, progress.current);
//!     }
//! });
//! ```

mod archive;
mod batch;
mod consolidate;
mod error;
mod progress;
mod read;
mod submission;
mod walker;

pub use archive::{extract_archive, find_archives};
pub use batch::{
    BatchConfig, BatchRunner, BatchSummary, SubmissionOutcome, SubmissionStats, ingest_project,
};
pub use consolidate::{
    LISTING_DIR, Listing, ListingHeader, ListingStats, TREE_LIMIT, fence_language, listing_path,
    mode_label, write_listing,
};
pub use error::SubmissionError;
pub use progress::BatchProgress;
pub use read::{SourceText, decode, read_source};
pub use submission::{ProjectType, SubmissionFiles, detect_project_type, load_submission};
pub use walker::{SourceScanner, relative_path};

// Re-export core types for convenience
pub use simcheck_core::{ExtensionProfile, ProfileKind, ScanConfig};
