//! Error types for the registry, configuration and digest parsing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while persisting the project registry.
///
/// Loading never fails; see [`crate::LoadStatus`].
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Serializing the registry failed.
    #[error("Failed to serialize registry for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Writing the temporary file or creating its directory failed.
    #[error("Failed to write registry {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Atomically replacing the registry file failed.
    #[error("Failed to replace registry {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RegistryError {
    /// Path of the registry file that could not be written.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Serialize { path, .. } | Self::Io { path, .. } | Self::Persist { path, .. } => {
                path
            }
        }
    }
}

/// Invalid scan or profile configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A custom profile was requested without any extension.
    #[error("Custom profile needs at least one extension")]
    EmptyExtensions,

    /// An extension contained characters that can never match a file name.
    #[error("Invalid extension: {0:?}")]
    InvalidExtension(String),

    /// An ignore glob failed to compile.
    #[error("Invalid ignore pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// A stored digest that is not 64 hex characters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseHashError {
    #[error("expected 64 hex characters, found {found}")]
    Length { found: usize },

    #[error("invalid hex digest: {message}")]
    Hex { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_names_path() {
        let err = RegistryError::Persist {
            path: PathBuf::from("/out/hashes_database.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.path(), std::path::Path::new("/out/hashes_database.json"));
        assert!(err.to_string().contains("/out/hashes_database.json"));
    }

    #[test]
    fn test_config_error_messages() {
        assert!(ConfigError::EmptyExtensions.to_string().contains("at least one"));
        let err = ConfigError::InvalidExtension(".ja va".to_string());
        assert!(err.to_string().contains(".ja va"));
    }
}
