//! `TF01` transfer functions: a lookup table of RGBA colours indexed by
//! voxel intensity.
//!
//! The file layout is little-endian:
//!
//! | offset | size               | field                          |
//! |--------|--------------------|--------------------------------|
//! | 0      | 4                  | magic `"TF01"`                 |
//! | 4      | 4                  | colour count (`u32`)           |
//! | 8      | `colour_count * 16`| RGBA entries, 4 x `f32` each   |

use bytes::Bytes;
use image::{Rgba, RgbaImage};
use std::{fs, iter, path::Path};
use thiserror::Error;
use tracing::debug;

/// Tag at the start of every transfer function file.
pub const MAGIC: [u8; 4] = *b"TF01";

const HEADER_LEN: usize = 8;
/// Bytes per RGBA entry.
pub const COLOUR_STRIDE: usize = 16;

#[derive(Debug, Error)]
pub enum TransferFunctionError {
    #[error("Invalid transfer function file format")]
    InvalidMagic,

    #[error("Truncated transfer function: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Too many colours for a transfer function: {0}")]
    TooManyColours(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferFunction {
    filename: String,
    colour_count: u32,
    colour_data: Bytes,
}

impl TransferFunction {
    /// Read and decode a `.tf` file. The file name becomes the lookup key.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TransferFunctionError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tf = Self::decode(filename, &bytes)?;
        debug!(
            filename = tf.filename(),
            colours = tf.colour_count(),
            "decoded transfer function"
        );
        Ok(tf)
    }

    /// Decode `TF01` bytes. Anything after the declared colour table is
    /// ignored.
    pub fn decode(
        filename: impl Into<String>,
        bytes: &[u8],
    ) -> Result<Self, TransferFunctionError> {
        if bytes.len() < MAGIC.len() || bytes[..MAGIC.len()] != MAGIC {
            return Err(TransferFunctionError::InvalidMagic);
        }
        let count_bytes: [u8; 4] = bytes
            .get(4..HEADER_LEN)
            .and_then(|b| b.try_into().ok())
            .ok_or(TransferFunctionError::Truncated {
                expected: HEADER_LEN,
                actual: bytes.len(),
            })?;
        let colour_count = u32::from_le_bytes(count_bytes);

        let expected = HEADER_LEN + colour_count as usize * COLOUR_STRIDE;
        if bytes.len() < expected {
            return Err(TransferFunctionError::Truncated {
                expected,
                actual: bytes.len(),
            });
        }

        Ok(Self {
            filename: filename.into(),
            colour_count,
            colour_data: Bytes::copy_from_slice(&bytes[HEADER_LEN..expected]),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.colour_data.len());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&self.colour_count.to_le_bytes());
        out.extend_from_slice(&self.colour_data);
        out
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TransferFunctionError> {
        fs::write(path, self.encode())?;
        Ok(())
    }

    /// Stream the colour table without its header. Yields a single chunk
    /// sharing the decoded buffer; call again to restart.
    pub fn stream_colour_data(&self) -> iter::Once<Bytes> {
        iter::once(self.colour_data.clone())
    }

    /// Build a transfer function from RGBA entries.
    pub fn from_colours(
        filename: impl Into<String>,
        colours: &[[f32; 4]],
    ) -> Result<Self, TransferFunctionError> {
        let colour_count = colour_count_for(colours.len())?;
        let colour_data: Vec<u8> = colours
            .iter()
            .flatten()
            .flat_map(|channel| channel.to_le_bytes())
            .collect();
        Ok(Self {
            filename: filename.into(),
            colour_count,
            colour_data: colour_data.into(),
        })
    }

    /// Build an `n`-entry table by linear interpolation between key points.
    ///
    /// Entries before the first key point stay transparent black, entries
    /// after the last one repeat its colour. Key points at or past `n` only
    /// shape the ramp leading up to them.
    pub fn from_key_points(
        filename: impl Into<String>,
        n: usize,
        key_points: &[(usize, [f32; 4])],
    ) -> Result<Self, TransferFunctionError> {
        colour_count_for(n)?;
        let mut points = key_points.to_vec();
        points.sort_by_key(|(index, _)| *index);

        let mut colours = vec![[0.0f32; 4]; n];
        for pair in points.windows(2) {
            let (start, start_colour) = pair[0];
            let (end, end_colour) = pair[1];
            let span = (end - start).max(1) as f32;
            for (index, colour) in colours
                .iter_mut()
                .enumerate()
                .take(end + 1)
                .skip(start)
            {
                let t = (index - start) as f32 / span;
                for channel in 0..4 {
                    colour[channel] =
                        start_colour[channel] * (1.0 - t) + end_colour[channel] * t;
                }
            }
        }
        if let Some(&(last, last_colour)) = points.last() {
            colours
                .iter_mut()
                .skip(last + 1)
                .for_each(|colour| *colour = last_colour);
        }

        Self::from_colours(filename, &colours)
    }

    pub fn colours(&self) -> Vec<[f32; 4]> {
        self.colour_data
            .chunks_exact(COLOUR_STRIDE)
            .map(|entry| {
                let mut colour = [0.0f32; 4];
                for (channel, bytes) in colour.iter_mut().zip(entry.chunks_exact(4)) {
                    *channel = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                }
                colour
            })
            .collect()
    }

    /// Render the colour map as an opaque strip, one column per entry.
    pub fn preview(&self, height: u32) -> RgbaImage {
        let colours = self.colours();
        RgbaImage::from_fn(colours.len() as u32, height, |x, _| {
            let [r, g, b, _] = colours[x as usize];
            Rgba([to_u8(r), to_u8(g), to_u8(b), u8::MAX])
        })
    }

    /// Write [`preview`](Self::preview) to `path`; the extension picks the
    /// image format.
    pub fn save_preview(
        &self,
        path: impl AsRef<Path>,
        height: u32,
    ) -> Result<(), TransferFunctionError> {
        self.preview(height).save(path)?;
        Ok(())
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn colour_count(&self) -> u32 {
        self.colour_count
    }

    pub fn colour_data(&self) -> &Bytes {
        &self.colour_data
    }
}

/// The header stores the colour count as a `u32`.
fn colour_count_for(len: usize) -> Result<u32, TransferFunctionError> {
    u32::try_from(len).map_err(|_| TransferFunctionError::TooManyColours(len))
}

#[inline]
fn to_u8(channel: f32) -> u8 {
    (channel * 255.0).clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tf_bytes(count: u32, payload: &[u8]) -> Vec<u8> {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&count.to_le_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn decode_two_colours_streams_one_chunk() {
        let payload: Vec<u8> = (0u8..32).collect();
        let tf = TransferFunction::decode("two.tf", &tf_bytes(2, &payload)).unwrap();

        assert_eq!(tf.colour_count(), 2);
        let chunks: Vec<Bytes> = tf.stream_colour_data().collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(&chunks[0][..], &payload[..]);

        // restartable
        assert_eq!(tf.stream_colour_data().count(), 1);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = tf_bytes(0, &[]);
        bytes[3] = b'2';
        assert!(matches!(
            TransferFunction::decode("bad.tf", &bytes),
            Err(TransferFunctionError::InvalidMagic)
        ));
        assert!(matches!(
            TransferFunction::decode("short.tf", b"TF"),
            Err(TransferFunctionError::InvalidMagic)
        ));
    }

    #[test]
    fn rejects_truncated_payload() {
        let bytes = tf_bytes(3, &[0u8; 40]);
        match TransferFunction::decode("cut.tf", &bytes) {
            Err(TransferFunctionError::Truncated { expected, actual }) => {
                assert_eq!(expected, 56);
                assert_eq!(actual, 48);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            TransferFunction::decode("header.tf", b"TF01\x01\x00"),
            Err(TransferFunctionError::Truncated { .. })
        ));
    }

    #[test]
    fn empty_table_is_valid() {
        let tf = TransferFunction::decode("empty.tf", &tf_bytes(0, &[])).unwrap();
        assert_eq!(tf.colour_count(), 0);
        assert!(tf.colour_data().is_empty());
        assert_eq!(tf.encode(), tf_bytes(0, &[]));
    }

    #[test]
    fn colours_are_little_endian_rgba() {
        let tf = TransferFunction::from_colours("c.tf", &[[1.0, 0.5, 0.25, 0.0]]).unwrap();
        assert_eq!(&tf.colour_data()[..4], &1.0f32.to_le_bytes());
        assert_eq!(&tf.colour_data()[4..8], &0.5f32.to_le_bytes());
        assert_eq!(tf.colours(), vec![[1.0, 0.5, 0.25, 0.0]]);
    }

    #[test]
    fn key_points_interpolate_and_fill_tail() {
        let tf = TransferFunction::from_key_points(
            "ramp.tf",
            6,
            &[(4, [1.0, 1.0, 1.0, 1.0]), (0, [0.0, 0.0, 0.0, 0.0])],
        )
        .unwrap();
        let colours = tf.colours();
        assert_eq!(tf.colour_count(), 6);
        assert_eq!(colours[0], [0.0; 4]);
        assert_eq!(colours[2], [0.5; 4]);
        assert_eq!(colours[4], [1.0; 4]);
        assert_eq!(colours[5], [1.0; 4]);
    }

    #[test]
    fn preview_has_one_column_per_colour() {
        let tf = TransferFunction::from_colours(
            "p.tf",
            &[[1.0, 0.0, 0.0, 0.2], [0.0, 0.0, 1.0, 1.0]],
        )
        .unwrap();
        let image = tf.preview(4);
        assert_eq!(image.dimensions(), (2, 4));
        assert_eq!(image.get_pixel(0, 3), &Rgba([255, 0, 0, 255]));
        assert_eq!(image.get_pixel(1, 0), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn preview_is_saved_as_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strip.png");
        let tf = TransferFunction::from_colours("p.tf", &[[0.0, 1.0, 0.0, 1.0]; 3]).unwrap();
        tf.save_preview(&path, 5).unwrap();

        let image = image::open(&path).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (3, 5));
        assert_eq!(image.get_pixel(2, 4), &Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn preview_with_unknown_extension_is_an_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let tf = TransferFunction::from_colours("p.tf", &[[0.0; 4]]).unwrap();
        assert!(matches!(
            tf.save_preview(dir.path().join("strip.nope"), 5),
            Err(TransferFunctionError::Image(_))
        ));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn colour_count_must_fit_the_header() {
        assert_eq!(colour_count_for(256).unwrap(), 256);
        assert_eq!(colour_count_for(u32::MAX as usize).unwrap(), u32::MAX);
        let too_many = u32::MAX as usize + 1;
        assert!(matches!(
            colour_count_for(too_many),
            Err(TransferFunctionError::TooManyColours(len)) if len == too_many
        ));
    }

    proptest! {
        #[test]
        fn decode_encode_round_trip(colours in proptest::collection::vec(any::<[u8; 16]>(), 0..64)) {
            let payload: Vec<u8> = colours.concat();
            let bytes = tf_bytes(colours.len() as u32, &payload);
            let tf = TransferFunction::decode("rt.tf", &bytes).unwrap();
            prop_assert_eq!(tf.encode(), bytes.clone());
            let again = TransferFunction::decode("rt.tf", &tf.encode()).unwrap();
            prop_assert_eq!(again, tf);
        }
    }
}
