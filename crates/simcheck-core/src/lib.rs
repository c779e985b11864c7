//! Core types for simcheck.
//!
//! This crate holds the pieces every other crate builds on: whitespace
//! normalization, BLAKE3 fingerprints for files and whole projects, the
//! persistent project registry and the scan configuration.

mod config;
mod error;
mod hash;
mod normalize;
mod record;
mod registry;

pub use config::{ExtensionProfile, ProfileKind, ScanConfig, ScanConfigBuilder, extension_of};
pub use error::{ConfigError, ParseHashError, RegistryError};
pub use hash::{ContentHash, HEX_LEN, ProjectFingerprint, file_hash, fingerprint_project, project_hash};
pub use normalize::{count_lines, normalize};
pub use record::{FileFingerprint, ProjectRecord};
pub use registry::{LoadStatus, ProjectRegistry, REGISTRY_FILE_NAME, REGISTRY_VERSION, RegistryStore};
