//! Generator configuration loaded from `bridgemeta.toml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::version::Version;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error reading a configuration file.
    #[error("I/O error reading {path}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },

    /// The configuration file is not valid TOML for `GeneratorConfig`.
    #[error("invalid config {path}: {error}")]
    Toml {
        path: PathBuf,
        error: toml::de::Error,
    },

    /// The rename file is not a YAML string map.
    #[error("invalid rename file {path}: {error}")]
    Yaml {
        path: PathBuf,
        error: serde_yaml::Error,
    },

    /// A version string could not be parsed.
    #[error("invalid version '{0}' (expected MAJOR[.MINOR[.SUBMINOR]])")]
    InvalidVersion(String),

    /// An include/exclude pattern is not a valid glob.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Settings for one metadata generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Platform whose availability attributes are honored (e.g. `ios`).
    pub platform: String,
    /// Deployment target; gates `introduced` and `deprecated`.
    pub target_version: Version,
    /// Toolchain/SDK version; gates `obsoleted`.
    pub toolchain_version: Version,
    /// Interface whose double pointer marks a trailing error-output parameter.
    pub error_interface: String,
    /// `module[:symbol]` glob patterns; empty means include everything.
    pub include: Vec<String>,
    /// `module[:symbol]` glob patterns; always win over `include`.
    pub exclude: Vec<String>,
    /// Bridge-name overrides keyed by `Owner.nativeName` or `nativeName`.
    pub renames: BTreeMap<String, String>,
    /// Optional YAML map merged under `renames`, relative to the config file.
    pub rename_file: Option<PathBuf>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            platform: "ios".to_string(),
            target_version: Version::new(13, 0, 0),
            toolchain_version: Version::new(15, 0, 0),
            error_interface: "NSError".to_string(),
            include: Vec::new(),
            exclude: Vec::new(),
            renames: BTreeMap::new(),
            rename_file: None,
        }
    }
}

impl GeneratorConfig {
    /// Parse a configuration from TOML text without touching the filesystem.
    pub fn from_toml_str(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|error| ConfigError::Toml {
            path: origin.to_path_buf(),
            error,
        })
    }

    /// Load a configuration file and merge its rename file, if any.
    ///
    /// Inline `renames` entries win over entries from `rename_file`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = read_file(path)?;
        let mut config = Self::from_toml_str(&contents, path)?;

        if let Some(rename_file) = config.rename_file.clone() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            let rename_path = if rename_file.is_absolute() {
                rename_file
            } else {
                base.join(rename_file)
            };
            let from_file = load_rename_file(&rename_path)?;
            debug!(
                path = %rename_path.display(),
                entries = from_file.len(),
                "Loaded rename file."
            );
            for (key, value) in from_file {
                config.renames.entry(key).or_insert(value);
            }
        }

        Ok(config)
    }
}

/// Read a YAML `nativeKey: bridgeName` map.
pub fn load_rename_file(path: &Path) -> Result<BTreeMap<String, String>, ConfigError> {
    let contents = read_file(path)?;
    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_yaml::from_str(&contents).map_err(|error| ConfigError::Yaml {
        path: path.to_path_buf(),
        error,
    })
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|error| ConfigError::Io {
        path: path.to_path_buf(),
        error,
    })
}
