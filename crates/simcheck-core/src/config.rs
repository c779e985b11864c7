//! Extension profiles and scan configuration.

use std::collections::BTreeSet;
use std::path::Path;

use derive_builder::Builder;
use globset::{Glob, GlobSet, GlobSetBuilder};
use strum::{Display, EnumIter, EnumString};

use crate::error::ConfigError;

const JAVA_SOURCES: &[&str] = &[".java"];

const FULL_PROJECT: &[&str] = &[
    ".bat", ".cmd", ".gradle", ".java", ".json", ".kts", ".md", ".properties", ".sh", ".sql",
    ".txt", ".xml", ".yaml", ".yml",
];

const EXCLUDED_DIRS: &[&str] = &[
    ".git", ".gradle", ".idea", ".mvn", ".pytest_cache", ".settings", ".vscode",
    "__pycache__", "bin", "build", "node_modules", "out", "target",
];

const BINARY_EXTENSIONS: &[&str] = &[
    ".7z", ".class", ".dll", ".doc", ".docx", ".dylib", ".ear", ".exe", ".gif", ".gz", ".ico",
    ".jar", ".jpeg", ".jpg", ".pdf", ".png", ".so", ".tar", ".war", ".zip",
];

const BUILD_FILES: &[&str] = &["build.gradle", "gradlew", "mvnw", "pom.xml", "settings.gradle"];

/// Names of the selectable extension profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ProfileKind {
    /// `.java` only.
    Java,
    /// Sources plus build and configuration files.
    Full,
    /// Caller-supplied extension list.
    Custom,
}

impl ProfileKind {
    /// One-line description for listings.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Java => "Java source files only",
            Self::Full => "Sources plus build and configuration files",
            Self::Custom => "Caller-selected extensions (requires --extensions)",
        }
    }
}

/// Set of file extensions accepted for fingerprinting.
///
/// Extensions are stored lowercase with a leading dot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExtensionProfile {
    /// `.java` only.
    JavaSources,
    /// Sources plus build and configuration files.
    #[default]
    FullProject,
    /// Explicit, already validated extension set.
    Custom(BTreeSet<String>),
}

impl ExtensionProfile {
    /// Build a profile by kind. `Custom` requires a comma-separated list.
    pub fn from_kind(kind: ProfileKind, custom: Option<&str>) -> Result<Self, ConfigError> {
        match kind {
            ProfileKind::Java => Ok(Self::JavaSources),
            ProfileKind::Full => Ok(Self::FullProject),
            ProfileKind::Custom => Self::parse_list(custom.unwrap_or_default()),
        }
    }

    /// Parse a comma-separated list such as `.java, xml,.Properties`.
    pub fn parse_list(list: &str) -> Result<Self, ConfigError> {
        Self::custom(list.split(','))
    }

    /// Validate and normalize a custom extension set.
    pub fn custom<I, S>(extensions: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for raw in extensions {
            let ext = raw.as_ref().trim();
            if ext.is_empty() {
                continue;
            }
            let ext = if ext.starts_with('.') {
                ext.to_lowercase()
            } else {
                format!(".{}", ext.to_lowercase())
            };
            if ext.len() == 1 || ext[1..].contains(['.', '/', '\\']) || ext.contains(char::is_whitespace) {
                return Err(ConfigError::InvalidExtension(raw.as_ref().trim().to_string()));
            }
            set.insert(ext);
        }

        if set.is_empty() {
            return Err(ConfigError::EmptyExtensions);
        }
        Ok(Self::Custom(set))
    }

    /// Kind of this profile.
    pub fn kind(&self) -> ProfileKind {
        match self {
            Self::JavaSources => ProfileKind::Java,
            Self::FullProject => ProfileKind::Full,
            Self::Custom(_) => ProfileKind::Custom,
        }
    }

    /// Accepted extensions, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        match self {
            Self::JavaSources => JAVA_SOURCES.to_vec(),
            Self::FullProject => FULL_PROJECT.to_vec(),
            Self::Custom(set) => set.iter().map(String::as_str).collect(),
        }
    }

    /// Whether a lowercase dotted extension is accepted.
    pub fn accepts(&self, extension: &str) -> bool {
        match self {
            Self::JavaSources => JAVA_SOURCES.contains(&extension),
            Self::FullProject => FULL_PROJECT.contains(&extension),
            Self::Custom(set) => set.contains(extension),
        }
    }
}

/// Lowercase dotted extension of a file name (`Main.JAVA` -> `.java`).
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

fn to_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Configuration for turning an extracted submission into a file list.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Extensions to fingerprint.
    #[builder(default)]
    pub profile: ExtensionProfile,

    /// Descend into directories whose name contains `test`.
    #[builder(default = "false")]
    pub include_tests: bool,

    /// Directory names never descended into.
    #[builder(default = "to_set(EXCLUDED_DIRS)")]
    pub excluded_dirs: BTreeSet<String>,

    /// Extensions skipped regardless of profile.
    #[builder(default = "to_set(BINARY_EXTENSIONS)")]
    pub binary_extensions: BTreeSet<String>,

    /// Lowercase file names always included (build descriptors).
    #[builder(default = "to_set(BUILD_FILES)")]
    pub build_files: BTreeSet<String>,

    /// Extra glob patterns matched against relative paths.
    #[builder(default)]
    pub ignore_patterns: Vec<String>,
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ExtensionProfile::Custom(set)) = &self.profile
            && set.is_empty()
        {
            return Err(ConfigError::EmptyExtensions.to_string());
        }
        if let Some(patterns) = &self.ignore_patterns {
            compile_globs(patterns).map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Default exclusions with the given profile.
    pub fn new(profile: ExtensionProfile) -> Self {
        Self {
            profile,
            include_tests: false,
            excluded_dirs: to_set(EXCLUDED_DIRS),
            binary_extensions: to_set(BINARY_EXTENSIONS),
            build_files: to_set(BUILD_FILES),
            ignore_patterns: Vec::new(),
        }
    }

    /// Whether the walker should prune a directory with this name.
    pub fn should_skip_dir(&self, name: &str) -> bool {
        self.excluded_dirs.contains(name)
            || (!self.include_tests && name.to_lowercase().contains("test"))
    }

    /// Whether a file with this name is fingerprinted.
    pub fn accepts_file(&self, name: &str) -> bool {
        let extension = extension_of(name);
        if let Some(ext) = &extension
            && self.binary_extensions.contains(ext)
        {
            return false;
        }
        self.build_files.contains(&name.to_lowercase())
            || extension.is_some_and(|ext| self.profile.accepts(&ext))
    }

    /// Compile the ignore patterns.
    pub fn ignore_set(&self) -> Result<GlobSet, ConfigError> {
        compile_globs(&self.ignore_patterns)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(ExtensionProfile::default())
    }
}

fn compile_globs(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| ConfigError::InvalidPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| ConfigError::InvalidPattern {
        pattern: patterns.join(","),
        message: e.to_string(),
    })
}
