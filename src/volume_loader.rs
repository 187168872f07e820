use crate::{
    enums::TextureFormat,
    slice_index::{self, Slice, int_attribute, open_header},
    volume::Volume,
};

use dicom_dictionary_std::tags;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("No valid DICOM images found")]
    NoValidImages,

    #[error("Invalid bits per voxel for volume texture: {0}")]
    UnsupportedBitsAllocated(u16),

    #[error("Missing attribute: {0}")]
    MissingAttribute(&'static str),

    #[error("Inconsistent image dimensions: expected {expected:?}, found {actual:?}")]
    InconsistentDimensions {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),

    #[error("Pixel data error: {0}")]
    PixelData(#[from] dicom::pixeldata::Error),
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Describe the volume stored in a directory of `.dcm` slices.
    ///
    /// Only file headers are read. The ordered slice list is kept inside the
    /// returned [`Volume`] so that streaming does not need to scan the
    /// directory again.
    ///
    /// # Errors
    ///
    /// Returns error if the directory holds no slices, a header cannot be
    /// read, or the voxel depth is neither 8 nor 16 bits.
    pub fn load_from_directory(path: impl AsRef<Path>) -> Result<Volume, VolumeLoaderError> {
        Self::load_from_directory_with_extension(path, slice_index::SLICE_EXTENSION)
    }

    pub fn load_from_directory_with_extension(
        path: impl AsRef<Path>,
        extension: &str,
    ) -> Result<Volume, VolumeLoaderError> {
        let path = path.as_ref();
        let slices = slice_index::index_directory_with_extension(path, extension)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self::load_from_slices(filename, slices)
    }

    /// Describe a volume from an already ordered slice list. The first slice
    /// supplies the plane geometry, voxel depth and spacing.
    pub fn load_from_slices(
        filename: impl Into<String>,
        slices: Vec<Slice>,
    ) -> Result<Volume, VolumeLoaderError> {
        let first = slices.first().ok_or(VolumeLoaderError::NoValidImages)?;
        let header = open_header(&first.path)?;

        let rows = int_attribute(&header, tags::ROWS)
            .ok_or(VolumeLoaderError::MissingAttribute("Rows"))? as usize;
        let columns = int_attribute(&header, tags::COLUMNS)
            .ok_or(VolumeLoaderError::MissingAttribute("Columns"))? as usize;
        let voxel_bits = int_attribute(&header, tags::BITS_ALLOCATED)
            .ok_or(VolumeLoaderError::MissingAttribute("BitsAllocated"))?;
        let signed = int_attribute(&header, tags::PIXEL_REPRESENTATION)
            .ok_or(VolumeLoaderError::MissingAttribute("PixelRepresentation"))?
            == 1;
        // the row spacing is reused for all three axes
        let spacing = header
            .get(tags::PIXEL_SPACING)
            .and_then(|element| element.to_multi_float64().ok())
            .and_then(|values| values.first().copied())
            .ok_or(VolumeLoaderError::MissingAttribute("PixelSpacing"))?;

        let texture_format = TextureFormat::from_voxel_bits(voxel_bits)
            .ok_or(VolumeLoaderError::UnsupportedBitsAllocated(voxel_bits))?;

        let volume = Volume::new(
            filename.into(),
            (rows, columns),
            voxel_bits,
            signed,
            spacing,
            texture_format,
            slices,
        );
        info!(
            filename = volume.filename(),
            dimensions = ?volume.dimensions(),
            voxel_bits,
            "registered volume"
        );
        Ok(volume)
    }
}
