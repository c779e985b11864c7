//! Duplication analysis for simcheck.
//!
//! This crate works on a loaded [`ProjectRegistry`] and never reads
//! submissions itself:
//!
//! - **Identical projects** - submitters whose project hashes match
//! - **Partial copies** - pairs sharing at least N identical files
//! - **Most copied files** - file contents found in many submissions
//!
//! # Example
//!
//! ```rust,no_run
//! use simcheck_analyze::{DuplicationAnalyzer, SimilarityReport};
//! use simcheck_core::RegistryStore;
//!
//! let (registry, _) = RegistryStore::in_dir("resultados").load();
//! let result = DuplicationAnalyzer::new().analyze(&registry);
//!
//! let report = SimilarityReport::assemble(&registry, &result);
//! for line in report.summary_lines() {
//!     println!("{line}");
//! }
//! ```
//!
//! # Similarity
//!
//! Partial copies are scored against the smaller project:
//! `common / min(|A|, |B|) * 100`, rounded to one decimal, so a project
//! fully contained in another scores 100.

mod duplicates;
mod error;
pub mod report;
mod similarity;

pub use duplicates::{
    AnalyzerConfig, AnalyzerConfigBuilder, DuplicationAnalyzer, DuplicationResult, IdenticalGroup,
    MostDuplicated, PartialOverlap, SharedFile,
};
pub use error::ReportError;
pub use report::{REPORT_FILE_NAME, SimilarityReport};
pub use similarity::similarity_percent;

// Re-export core types
pub use simcheck_core::{ContentHash, ProjectRecord, ProjectRegistry};
