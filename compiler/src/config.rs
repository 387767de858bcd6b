// config.rs — Build configuration
//
// Names the generated artifacts are rooted in and the classifier registry.
// Every field has a default, so an empty JSON object is a valid config.
//
// Failure modes: unreadable file, malformed JSON, or blank names.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::m3::paths;
use crate::registry::ClassifierRegistry;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid config: {field} must be a non-empty name without whitespace")]
    InvalidName { field: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Package every artifact name is qualified with.
    pub root_package: String,
    /// Runtime-support artifact co-partitioned with every file artifact.
    pub common_runtime: String,
    pub lambda_runtime: String,
    pub enum_support: String,
    /// Element path of the platform enum type the enum support extends.
    pub enum_base_type: String,
    pub classifiers: ClassifierRegistry,
    /// Element path → bucket key; forces placement during bucket repair.
    pub bucket_overrides: BTreeMap<String, String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            root_package: "generated".to_string(),
            common_runtime: "CoreGen".to_string(),
            lambda_runtime: "PureCompiledLambda".to_string(),
            enum_support: "PureEnum_LazyImpl".to_string(),
            enum_base_type: paths::ENUM.to_string(),
            classifiers: ClassifierRegistry::default(),
            bucket_overrides: BTreeMap::new(),
        }
    }
}

impl BuildConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: BuildConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), root = %config.root_package, "loaded build config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("root_package", &self.root_package),
            ("common_runtime", &self.common_runtime),
            ("lambda_runtime", &self.lambda_runtime),
            ("enum_support", &self.enum_support),
            ("enum_base_type", &self.enum_base_type),
        ];
        for (field, value) in fields {
            if value.is_empty() || value.chars().any(char::is_whitespace) {
                return Err(ConfigError::InvalidName { field });
            }
        }
        Ok(())
    }
}
