//! # DICOM-volume-stream library
//!
//! This crate exposes volumes made of DICOM slices and `TF01` transfer
//! functions to remote volume renderers, streaming their payloads chunk by
//! chunk instead of holding a whole volume in memory.
//!
//! A volume is a directory with one ".dcm" file per slice. Slices are
//! ordered by InstanceNumber (ties keep file name order) and only their
//! headers are read when the volume is registered. When the volume is
//! streamed each slice is decoded on its own, rescaled with its
//! RescaleSlope, shifted by a fixed bias of `2^15` and emitted as
//! little-endian `u16` words, one chunk per slice.
//!
//! DICOM files are assumed to have the following attributes:
//!  - No multiframe (always the first frame is used)
//!  - One sample per pixel, 8 or 16 bits allocated
//!  - Images from the same series with identical Rows and Columns
//!
//! A transfer function is a lookup table of RGBA colours stored in a small
//! binary format, see [`transfer_function`].
//!
//! # Examples
//!
//! ## Streaming a volume
//!
//! Register the volume stored in the dicom/ directory, then write its
//! encoded slices in order.
//!
//! ```no_run
//! # use dicom_volume_stream::VolumeLoader;
//! # use std::io::Write;
//! let volume = VolumeLoader::load_from_directory("dicom")
//!     .expect("should have indexed the volume directory");
//! let mut out = std::fs::File::create("volume.raw").unwrap();
//! for chunk in volume.stream() {
//!     let chunk = chunk.expect("should have encoded the slice");
//!     out.write_all(&chunk).unwrap();
//! }
//! ```
//!
//! ## Serving a resource directory
//!
//! ```no_run
//! # use dicom_volume_stream::{Catalog, CatalogConfig};
//! let catalog = Catalog::from_directory(&CatalogConfig::with_resource_path("resources"))
//!     .expect("should have read the resource directory");
//! println!("{}", catalog.volumes_json().unwrap());
//! ```

pub mod byte_stream;
pub mod catalog;
pub mod config;
pub mod enums;
pub mod slice_index;
pub mod transfer_function;
pub mod volume;
pub mod volume_loader;
pub mod volume_stream;

pub use catalog::{Catalog, CatalogError, TransferFunctionInfo, VolumeInfo};
pub use config::{CatalogConfig, ConfigError};
pub use enums::{Overflow, TextureFormat};
pub use slice_index::Slice;
pub use transfer_function::{TransferFunction, TransferFunctionError};
pub use volume::Volume;
pub use volume_loader::{VolumeLoader, VolumeLoaderError};
pub use volume_stream::VolumeStream;
