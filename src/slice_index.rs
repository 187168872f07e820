use crate::volume_loader::VolumeLoaderError;

use dicom::{
    core::Tag,
    object::{DefaultDicomObject, OpenFileOptions},
};
use dicom_dictionary_std::tags;
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Default extension of slice files inside a volume directory.
pub const SLICE_EXTENSION: &str = "dcm";

/// One slice file of a volume, with the header values needed to order it
/// and to rescale its samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub path: PathBuf,
    pub instance_number: i32,
    pub rescale_slope: f64,
    pub rescale_intercept: f64,
}

impl Slice {
    /// Read the header of a slice file, stopping before its pixel data.
    pub fn from_header(path: impl Into<PathBuf>) -> Result<Self, VolumeLoaderError> {
        let path = path.into();
        let header = open_header(&path)?;

        let instance_number = header
            .get(tags::INSTANCE_NUMBER)
            .and_then(|element| element.to_int::<i32>().ok())
            .unwrap_or(0);
        let rescale_slope = float_attribute(&header, tags::RESCALE_SLOPE).unwrap_or(1.0);
        let rescale_intercept = float_attribute(&header, tags::RESCALE_INTERCEPT).unwrap_or(0.0);

        Ok(Self {
            path,
            instance_number,
            rescale_slope,
            rescale_intercept,
        })
    }
}

/// Index every `.dcm` file of `dir` in instance-number order.
///
/// Files are listed by name before their headers are read, so repeated calls
/// over an unchanged directory give the same order. Slices sharing an
/// instance number keep their listing order.
pub fn index_directory(dir: impl AsRef<Path>) -> Result<Vec<Slice>, VolumeLoaderError> {
    index_directory_with_extension(dir, SLICE_EXTENSION)
}

pub fn index_directory_with_extension(
    dir: impl AsRef<Path>,
    extension: &str,
) -> Result<Vec<Slice>, VolumeLoaderError> {
    let dir = dir.as_ref();
    let mut paths = fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()?;
    paths.retain(|path| {
        path.is_file()
            && path
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
    });

    if paths.is_empty() {
        return Err(VolumeLoaderError::NoValidImages);
    }
    paths.sort();

    let mut slices = paths
        .par_iter()
        .map(|path| Slice::from_header(path.as_path()))
        .collect::<Result<Vec<_>, _>>()?;
    slices.sort_by_key(|slice| slice.instance_number);

    debug!(dir = %dir.display(), slices = slices.len(), "indexed volume directory");
    Ok(slices)
}

pub(crate) fn open_header(path: &Path) -> Result<DefaultDicomObject, VolumeLoaderError> {
    Ok(OpenFileOptions::new()
        .read_until(tags::PIXEL_DATA)
        .open_file(path)?)
}

fn float_attribute(header: &DefaultDicomObject, tag: Tag) -> Option<f64> {
    header.get(tag)?.to_float64().ok()
}

pub(crate) fn int_attribute(header: &DefaultDicomObject, tag: Tag) -> Option<u16> {
    header.get(tag)?.to_int::<u16>().ok()
}
