use crate::enums::{Overflow, TextureFormat};
use crate::slice_index::Slice;
use crate::volume_stream::VolumeStream;

use std::sync::Arc;

/// Static description of a volume, computed once at registration.
#[derive(Debug, Clone)]
pub struct Volume {
    filename: String,
    dimensions: (usize, usize, usize),
    voxel_bits: u16,
    bytes_per_row: usize,
    signed: bool,
    bounding_box_mm: (f64, f64, f64),
    texture_format: TextureFormat,
    slices: Arc<[Slice]>,
}

impl Volume {
    pub(crate) fn new(
        filename: String,
        (rows, columns): (usize, usize),
        voxel_bits: u16,
        signed: bool,
        spacing: f64,
        texture_format: TextureFormat,
        slices: Vec<Slice>,
    ) -> Self {
        let dimensions = (rows, columns, slices.len());
        Self {
            filename,
            dimensions,
            voxel_bits,
            bytes_per_row: rows * (voxel_bits as usize / 8),
            signed,
            bounding_box_mm: (
                dimensions.0 as f64 * spacing,
                dimensions.1 as f64 * spacing,
                dimensions.2 as f64 * spacing,
            ),
            texture_format,
            slices: slices.into(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Get the dimensions of the volume (rows, columns, slices)
    pub fn dimensions(&self) -> (usize, usize, usize) {
        self.dimensions
    }

    pub fn voxel_bits(&self) -> u16 {
        self.voxel_bits
    }

    pub fn bytes_per_row(&self) -> usize {
        self.bytes_per_row
    }

    /// Whether the stored samples are signed. Streamed samples are always
    /// biased into the unsigned range.
    pub fn signed(&self) -> bool {
        self.signed
    }

    pub fn bounding_box_mm(&self) -> (f64, f64, f64) {
        self.bounding_box_mm
    }

    pub fn texture_format(&self) -> TextureFormat {
        self.texture_format
    }

    /// Slices in streaming order.
    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    /// Size in bytes of one streamed slice.
    pub fn chunk_len(&self) -> usize {
        self.dimensions.0 * self.dimensions.1 * 2
    }

    /// Stream the encoded voxels slice by slice, in the order captured at
    /// registration.
    pub fn stream(&self) -> VolumeStream {
        self.stream_with(Overflow::default())
    }

    pub fn stream_with(&self, overflow: Overflow) -> VolumeStream {
        VolumeStream::new(
            Arc::clone(&self.slices),
            Some((self.dimensions.0, self.dimensions.1)),
            overflow,
        )
    }
}
