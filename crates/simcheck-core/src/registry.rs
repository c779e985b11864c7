//! Persistent registry of every processed submission.
//!
//! The registry is loaded once at the start of a batch, mutated in memory
//! while submissions are ingested and written back in a single atomic
//! replace at the end. Loading never fails: a missing or unreadable file
//! yields an empty registry and a [`LoadStatus`] describing what happened.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::RegistryError;
use crate::hash::ProjectFingerprint;
use crate::record::ProjectRecord;

/// Schema version written to new registries.
pub const REGISTRY_VERSION: &str = "1.0";

/// Default file name of the registry inside an output directory.
pub const REGISTRY_FILE_NAME: &str = "hashes_database.json";

/// In-memory registry: submitter identity to latest record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRegistry {
    version: String,

    #[serde(rename = "ultima_actualizacion")]
    last_updated: Option<NaiveDateTime>,

    #[serde(rename = "total_proyectos", default)]
    total_projects: usize,

    #[serde(rename = "proyectos", default)]
    projects: BTreeMap<String, ProjectRecord>,

    #[serde(skip)]
    dirty: bool,
}

impl Default for ProjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectRegistry {
    /// Empty registry with the current schema version.
    pub fn new() -> Self {
        Self {
            version: REGISTRY_VERSION.to_string(),
            last_updated: None,
            total_projects: 0,
            projects: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Insert or replace the record of `identity`, stamped with the current time.
    pub fn upsert(&mut self, identity: impl Into<String>, fingerprint: ProjectFingerprint) {
        self.upsert_at(identity, fingerprint, Local::now().naive_local());
    }

    /// Insert or replace the record of `identity` with an explicit timestamp.
    pub fn upsert_at(
        &mut self,
        identity: impl Into<String>,
        fingerprint: ProjectFingerprint,
        processed_at: NaiveDateTime,
    ) {
        let identity = identity.into();
        let replaced = self
            .projects
            .insert(identity.clone(), ProjectRecord::new(fingerprint, processed_at))
            .is_some();
        tracing::debug!(%identity, replaced, "registry upsert");
        self.dirty = true;
    }

    /// Record of a submitter, if any.
    pub fn get(&self, identity: &str) -> Option<&ProjectRecord> {
        self.projects.get(identity)
    }

    /// Records in identity order.
    pub fn projects(&self) -> impl Iterator<Item = (&str, &ProjectRecord)> {
        self.projects.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of submitters.
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Whether no submitter has been recorded.
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Project count as of the last save (or as read from disk).
    pub fn stored_count(&self) -> usize {
        self.total_projects
    }

    /// Schema version tag.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Time of the last successful save.
    pub fn last_updated(&self) -> Option<NaiveDateTime> {
        self.last_updated
    }

    /// Whether there are unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Outcome of [`RegistryStore::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// An existing registry was read.
    Loaded { projects: usize },
    /// No file existed; starting empty.
    Fresh,
    /// The file existed but could not be used; starting empty.
    Recovered { reason: String },
}

impl LoadStatus {
    /// Whether prior-run continuity was lost.
    pub fn is_recovered(&self) -> bool {
        matches!(self, Self::Recovered { .. })
    }
}

/// Location of a registry on disk.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    /// Store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default file name inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(REGISTRY_FILE_NAME))
    }

    /// Path of the registry file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the registry, substituting an empty one when absent or corrupt.
    pub fn load(&self) -> (ProjectRegistry, LoadStatus) {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no registry yet, starting empty");
                return (ProjectRegistry::new(), LoadStatus::Fresh);
            }
            Err(e) => return self.recover(format!("read failed: {e}")),
        };

        match serde_json::from_str::<ProjectRegistry>(&text) {
            Ok(registry) => {
                let projects = registry.len();
                tracing::info!(path = %self.path.display(), projects, "registry loaded");
                (registry, LoadStatus::Loaded { projects })
            }
            Err(e) => self.recover(format!("parse failed: {e}")),
        }
    }

    fn recover(&self, reason: String) -> (ProjectRegistry, LoadStatus) {
        tracing::warn!(
            path = %self.path.display(),
            %reason,
            "registry unusable, continuing with an empty one"
        );
        (ProjectRegistry::new(), LoadStatus::Recovered { reason })
    }

    /// Stamp, recount and atomically write the registry.
    ///
    /// The JSON is written to a temporary file next to the target which is
    /// then renamed over it, so readers see either the old or the new file.
    pub fn save(&self, registry: &mut ProjectRegistry) -> Result<(), RegistryError> {
        registry.last_updated = Some(Local::now().naive_local());
        registry.total_projects = registry.projects.len();

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|source| self.io_error(source))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|source| self.io_error(source))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, &*registry).map_err(|source| {
                RegistryError::Serialize {
                    path: self.path.clone(),
                    source,
                }
            })?;
            writer.flush().map_err(|source| self.io_error(source))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|source| self.io_error(source))?;
        tmp.persist(&self.path)
            .map_err(|e| RegistryError::Persist {
                path: self.path.clone(),
                source: e.error,
            })?;

        registry.dirty = false;
        tracing::info!(
            path = %self.path.display(),
            projects = registry.total_projects,
            "registry saved"
        );
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> RegistryError {
        RegistryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
