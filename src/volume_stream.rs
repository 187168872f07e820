//! Slice-by-slice encoding of a volume's voxels for renderers.
//!
//! Every slice becomes one chunk of `rows * columns` little-endian `u16`
//! words, rescaled with the slice's slope and shifted by a fixed bias of
//! `2^15` so that signed and narrow sample ranges land in the unsigned
//! 16-bit range:
//!
//! ```text
//! encoded = slope * raw + intercept + (2^15 - intercept)
//!         = slope * raw + 2^15
//! ```
//!
//! Only one slice is decoded at a time. A slice file is opened, read and
//! closed inside a single call to [`Iterator::next`], so dropping the
//! stream early never leaves a handle behind.

use crate::{
    enums::Overflow,
    slice_index::{self, Slice},
    volume_loader::VolumeLoaderError,
};

use bytes::Bytes;
use dicom::{
    object::open_file,
    pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder},
};
use ndarray::{Array2, s};
use std::{iter::FusedIterator, path::Path, sync::Arc};
use tracing::{debug, warn};

/// Offset added to every rescaled sample.
pub const BIAS: f64 = 32768.0;

pub struct VolumeStream {
    slices: Arc<[Slice]>,
    cursor: usize,
    plane: Option<(usize, usize)>,
    overflow: Overflow,
    failed: bool,
}

impl VolumeStream {
    pub(crate) fn new(
        slices: Arc<[Slice]>,
        plane: Option<(usize, usize)>,
        overflow: Overflow,
    ) -> Self {
        Self {
            slices,
            cursor: 0,
            plane,
            overflow,
            failed: false,
        }
    }

    /// Scan `dir` again and stream its slices in instance-number order.
    ///
    /// Prefer [`Volume::stream`](crate::volume::Volume::stream), which reuses
    /// the order captured at registration. This entry point only matches that
    /// order while the directory stays unchanged.
    pub fn from_directory(dir: impl AsRef<Path>) -> Result<Self, VolumeLoaderError> {
        let slices = slice_index::index_directory(dir)?;
        Ok(Self::new(slices.into(), None, Overflow::default()))
    }

    pub fn with_overflow(mut self, overflow: Overflow) -> Self {
        self.overflow = overflow;
        self
    }

    /// Number of chunks left to produce.
    pub fn remaining(&self) -> usize {
        if self.failed {
            0
        } else {
            self.slices.len() - self.cursor
        }
    }

    fn encode_slice(&mut self, slice: &Slice) -> Result<Bytes, VolumeLoaderError> {
        let samples = read_samples(&slice.path)?;
        let plane = samples.dim();
        match self.plane {
            Some(expected) if expected != plane => {
                return Err(VolumeLoaderError::InconsistentDimensions {
                    expected,
                    actual: plane,
                });
            }
            Some(_) => {}
            None => self.plane = Some(plane),
        }

        let chunk = encode_samples(&samples, slice.rescale_slope, self.overflow);
        debug!(
            path = %slice.path.display(),
            instance_number = slice.instance_number,
            bytes = chunk.len(),
            "encoded slice"
        );
        Ok(chunk.into())
    }
}

impl Iterator for VolumeStream {
    type Item = Result<Bytes, VolumeLoaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let slices = Arc::clone(&self.slices);
        let slice = slices.get(self.cursor)?;
        self.cursor += 1;

        let result = self.encode_slice(slice);
        if let Err(error) = &result {
            warn!(path = %slice.path.display(), %error, "aborting volume stream");
            self.failed = true;
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining()))
    }
}

impl FusedIterator for VolumeStream {}

/// Decode the first frame of a slice file as raw stored samples, without
/// applying the modality LUT.
fn read_samples(path: &Path) -> Result<Array2<i32>, VolumeLoaderError> {
    let object = open_file(path)?;
    let pixel_data = object.decode_pixel_data()?;
    let options = ConvertOptions::new().with_modality_lut(ModalityLutOption::None);
    let samples = pixel_data
        .to_ndarray_with_options::<i32>(&options)?
        .slice_move(s![0, .., .., 0]);
    Ok(samples)
}

/// Rescale, bias and serialise samples in row-major order.
pub fn encode_samples(samples: &Array2<i32>, slope: f64, overflow: Overflow) -> Vec<u8> {
    let mut chunk = Vec::with_capacity(samples.len() * 2);
    for &raw in samples.iter() {
        // the intercept cancels out; adding and removing it in f64 would
        // leave fractional intercepts one below the integer after truncation
        let value = slope * raw as f64 + BIAS;
        chunk.extend_from_slice(&overflow.apply(value).to_le_bytes());
    }
    chunk
}
