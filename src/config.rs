//! Catalog configuration, read from YAML.

use crate::{byte_stream, enums::Overflow, slice_index};

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Directory holding volume sub-directories and transfer function files
    #[serde(default = "default_resource_path")]
    pub resource_path: PathBuf,

    /// Extension of slice files inside a volume directory (default: dcm)
    #[serde(default = "default_slice_extension")]
    pub slice_extension: String,

    /// Extension of transfer function files (default: tf)
    #[serde(default = "default_transfer_function_extension")]
    pub transfer_function_extension: String,

    /// Handling of rescaled samples outside the u16 range (default: wrap)
    #[serde(default)]
    pub overflow: Overflow,

    /// Chunks buffered ahead of an async consumer (default: 2)
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,
}

fn default_resource_path() -> PathBuf {
    PathBuf::from("resources")
}

fn default_slice_extension() -> String {
    slice_index::SLICE_EXTENSION.to_string()
}

fn default_transfer_function_extension() -> String {
    "tf".to_string()
}

fn default_stream_buffer() -> usize {
    byte_stream::DEFAULT_BUFFER
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            resource_path: default_resource_path(),
            slice_extension: default_slice_extension(),
            transfer_function_extension: default_transfer_function_extension(),
            overflow: Overflow::default(),
            stream_buffer: default_stream_buffer(),
        }
    }
}

impl CatalogConfig {
    /// Configuration serving the resources in `path` with default settings.
    pub fn with_resource_path(path: impl Into<PathBuf>) -> Self {
        Self {
            resource_path: path.into(),
            ..Self::default()
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: CatalogConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stream_buffer == 0 {
            return Err(ConfigError::Invalid(
                "stream_buffer must be greater than 0".to_string(),
            ));
        }
        for (name, extension) in [
            ("slice_extension", &self.slice_extension),
            ("transfer_function_extension", &self.transfer_function_extension),
        ] {
            if extension.is_empty() || extension.starts_with('.') {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a bare extension, got {extension:?}"
                )));
            }
        }
        Ok(())
    }
}
