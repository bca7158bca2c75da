//! Per-run resolution context.

use std::collections::BTreeMap;

use bridgemeta_common::{ConfigError, GeneratorConfig, Version};

use crate::policy::InclusionPolicy;

/// Settings and lookup tables shared by the factory and the naming engine.
///
/// Built once per run from a `GeneratorConfig` and passed by reference, so
/// concurrent or test runs never share rename tables.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    pub platform: String,
    pub target_version: Version,
    pub toolchain_version: Version,
    pub error_interface: String,
    pub renames: BTreeMap<String, String>,
    pub policy: InclusionPolicy,
}

impl ResolutionContext {
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            platform: config.platform.clone(),
            target_version: config.target_version,
            toolchain_version: config.toolchain_version,
            error_interface: config.error_interface.clone(),
            renames: config.renames.clone(),
            policy: InclusionPolicy::new(&config.include, &config.exclude)?,
        })
    }

    #[must_use]
    pub fn with_target_version(mut self, version: Version) -> Self {
        self.target_version = version;
        self
    }

    #[must_use]
    pub fn with_rename(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.renames.insert(key.into(), value.into());
        self
    }
}

impl Default for ResolutionContext {
    fn default() -> Self {
        let config = GeneratorConfig::default();
        Self {
            platform: config.platform,
            target_version: config.target_version,
            toolchain_version: config.toolchain_version,
            error_interface: config.error_interface,
            renames: config.renames,
            policy: InclusionPolicy::default(),
        }
    }
}
