//! Read-only catalog of the volumes and transfer functions found in a
//! resource directory, plus the descriptor views handed to clients.

use crate::{
    config::{CatalogConfig, ConfigError},
    enums::{Overflow, TextureFormat},
    transfer_function::{TransferFunction, TransferFunctionError},
    volume::Volume,
    volume_loader::{VolumeLoader, VolumeLoaderError},
    volume_stream::VolumeStream,
};

use serde::Serialize;
use std::{
    convert::Infallible,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Cannot read resource directory {path}: {source}")]
    ResourceDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Volume(#[from] VolumeLoaderError),

    #[error(transparent)]
    TransferFunction(#[from] TransferFunctionError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<Infallible> for CatalogError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

/// Public description of a volume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeInfo {
    pub filename: String,
    pub size: [usize; 3],
    #[serde(rename = "bitsPerVoxel")]
    pub bits_per_voxel: u16,
    #[serde(rename = "bytesPerLine")]
    pub bytes_per_line: usize,
    pub signed: bool,
    #[serde(rename = "boundingBox")]
    pub bounding_box: [f64; 3],
    #[serde(rename = "textureFormat")]
    pub texture_format: TextureFormat,
}

impl From<&Volume> for VolumeInfo {
    fn from(volume: &Volume) -> Self {
        let (rows, columns, slices) = volume.dimensions();
        let (width, height, depth) = volume.bounding_box_mm();
        Self {
            filename: volume.filename().to_string(),
            size: [rows, columns, slices],
            bits_per_voxel: volume.voxel_bits(),
            bytes_per_line: volume.bytes_per_row(),
            signed: volume.signed(),
            bounding_box: [width, height, depth],
            texture_format: volume.texture_format(),
        }
    }
}

/// Public description of a transfer function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferFunctionInfo {
    pub filename: String,
    pub n_colours: u32,
}

impl From<&TransferFunction> for TransferFunctionInfo {
    fn from(tf: &TransferFunction) -> Self {
        Self {
            filename: tf.filename().to_string(),
            n_colours: tf.colour_count(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    volumes: Vec<Volume>,
    transfer_functions: Vec<TransferFunction>,
    overflow: Overflow,
}

impl Catalog {
    /// Register every resource under `config.resource_path`.
    ///
    /// Entries are visited in name order and hidden entries are ignored.
    /// Sub-directories become volumes and files carrying the transfer
    /// function extension become transfer functions. An entry that fails to
    /// register is logged and skipped.
    pub fn from_directory(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let root = config.resource_path.as_path();
        let listing_error = |source: std::io::Error| CatalogError::ResourceDirectory {
            path: root.to_path_buf(),
            source,
        };
        let listing = fs::read_dir(root)
            .map_err(listing_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(listing_error)?;
        let mut entries: Vec<_> = listing
            .iter()
            .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
            .map(|entry| entry.path())
            .collect();
        entries.sort();

        let mut catalog = Self {
            overflow: config.overflow,
            ..Self::default()
        };
        for path in entries {
            if has_extension(&path, &config.transfer_function_extension) && path.is_file() {
                match TransferFunction::open(&path) {
                    Ok(tf) => catalog.transfer_functions.push(tf),
                    Err(error) => {
                        warn!(path = %path.display(), %error, "skipping transfer function")
                    }
                }
            } else if path.is_dir() {
                match VolumeLoader::load_from_directory_with_extension(
                    &path,
                    &config.slice_extension,
                ) {
                    Ok(volume) => catalog.volumes.push(volume),
                    Err(error) => warn!(path = %path.display(), %error, "skipping volume"),
                }
            }
        }

        info!(
            root = %root.display(),
            volumes = catalog.volumes.len(),
            transfer_functions = catalog.transfer_functions.len(),
            "catalog ready"
        );
        Ok(catalog)
    }

    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }

    pub fn transfer_functions(&self) -> &[TransferFunction] {
        &self.transfer_functions
    }

    pub fn volume(&self, filename: &str) -> Option<&Volume> {
        self.volumes.iter().find(|volume| volume.filename() == filename)
    }

    pub fn transfer_function(&self, filename: &str) -> Option<&TransferFunction> {
        self.transfer_functions
            .iter()
            .find(|tf| tf.filename() == filename)
    }

    /// Stream a registered volume with the catalog's overflow policy.
    pub fn stream_volume(&self, filename: &str) -> Result<VolumeStream, CatalogError> {
        self.volume(filename)
            .map(|volume| volume.stream_with(self.overflow))
            .ok_or_else(|| CatalogError::NotFound(filename.to_string()))
    }

    pub fn volume_infos(&self) -> Vec<VolumeInfo> {
        self.volumes.iter().map(VolumeInfo::from).collect()
    }

    pub fn transfer_function_infos(&self) -> Vec<TransferFunctionInfo> {
        self.transfer_functions
            .iter()
            .map(TransferFunctionInfo::from)
            .collect()
    }

    pub fn volumes_json(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string(&self.volume_infos())?)
    }

    pub fn transfer_functions_json(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string(&self.transfer_function_infos())?)
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}
