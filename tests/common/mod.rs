#![allow(dead_code)]

use dicom::core::{DataElement, PrimitiveValue, VR};
use dicom::object::{FileMetaTableBuilder, InMemDicomObject, mem::InMemElement};
use dicom_dictionary_std::tags;
use std::path::{Path, PathBuf};

const CT_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.2";
const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";

/// Single-frame monochrome slice written as a DICOM file.
#[derive(Debug, Clone)]
pub struct TestSlice {
    pub instance_number: Option<i32>,
    pub rows: u16,
    pub columns: u16,
    pub bits_allocated: u16,
    pub signed: bool,
    pub spacing: Option<f64>,
    pub rescale: Option<(f64, f64)>,
    pub pixels: Vec<i32>,
}

impl TestSlice {
    /// Unsigned 8-bit slice with every sample set to `value`.
    pub fn filled_u8(rows: u16, columns: u16, value: u8) -> Self {
        Self {
            instance_number: None,
            rows,
            columns,
            bits_allocated: 8,
            signed: false,
            spacing: Some(0.5),
            rescale: None,
            pixels: vec![value as i32; rows as usize * columns as usize],
        }
    }

    pub fn signed_16(rows: u16, columns: u16, pixels: Vec<i32>) -> Self {
        Self {
            instance_number: None,
            rows,
            columns,
            bits_allocated: 16,
            signed: true,
            spacing: Some(0.75),
            rescale: None,
            pixels,
        }
    }

    pub fn instance(mut self, number: i32) -> Self {
        self.instance_number = Some(number);
        self
    }

    pub fn rescale(mut self, slope: f64, intercept: f64) -> Self {
        self.rescale = Some((slope, intercept));
        self
    }

    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let mut obj = InMemDicomObject::new_empty();
        let sop_instance_uid = format!("2.25.{}", name.len() * 1000 + self.pixels.len());

        obj.put(DataElement::new(
            tags::SOP_CLASS_UID,
            VR::UI,
            PrimitiveValue::from(CT_IMAGE_STORAGE),
        ));
        obj.put(DataElement::new(
            tags::SOP_INSTANCE_UID,
            VR::UI,
            PrimitiveValue::from(sop_instance_uid.as_str()),
        ));
        if let Some(number) = self.instance_number {
            obj.put(DataElement::new(
                tags::INSTANCE_NUMBER,
                VR::IS,
                PrimitiveValue::from(number.to_string()),
            ));
        }
        if let Some(spacing) = self.spacing {
            obj.put(DataElement::new(
                tags::PIXEL_SPACING,
                VR::DS,
                PrimitiveValue::from(format!("{spacing}\\{spacing}")),
            ));
        }
        if let Some((slope, intercept)) = self.rescale {
            obj.put(DataElement::new(
                tags::RESCALE_SLOPE,
                VR::DS,
                PrimitiveValue::from(slope.to_string()),
            ));
            obj.put(DataElement::new(
                tags::RESCALE_INTERCEPT,
                VR::DS,
                PrimitiveValue::from(intercept.to_string()),
            ));
        }
        obj.put(DataElement::new(
            tags::SAMPLES_PER_PIXEL,
            VR::US,
            PrimitiveValue::from(1_u16),
        ));
        obj.put(DataElement::new(
            tags::PHOTOMETRIC_INTERPRETATION,
            VR::CS,
            PrimitiveValue::from("MONOCHROME2"),
        ));
        obj.put(DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(self.rows)));
        obj.put(DataElement::new(
            tags::COLUMNS,
            VR::US,
            PrimitiveValue::from(self.columns),
        ));
        obj.put(DataElement::new(
            tags::BITS_ALLOCATED,
            VR::US,
            PrimitiveValue::from(self.bits_allocated),
        ));
        obj.put(DataElement::new(
            tags::BITS_STORED,
            VR::US,
            PrimitiveValue::from(self.bits_allocated),
        ));
        obj.put(DataElement::new(
            tags::HIGH_BIT,
            VR::US,
            PrimitiveValue::from(self.bits_allocated - 1),
        ));
        obj.put(DataElement::new(
            tags::PIXEL_REPRESENTATION,
            VR::US,
            PrimitiveValue::from(u16::from(self.signed)),
        ));
        obj.put(self.pixel_data());

        let file = obj
            .with_meta(
                FileMetaTableBuilder::new()
                    .transfer_syntax(EXPLICIT_VR_LITTLE_ENDIAN)
                    .media_storage_sop_class_uid(CT_IMAGE_STORAGE)
                    .media_storage_sop_instance_uid(sop_instance_uid),
            )
            .expect("should have built file meta group");
        let path = dir.join(name);
        file.write_to_file(&path)
            .expect("should have written DICOM slice");
        path
    }

    fn pixel_data(&self) -> InMemElement {
        match self.bits_allocated {
            8 => DataElement::new(
                tags::PIXEL_DATA,
                VR::OB,
                PrimitiveValue::from(self.pixels.iter().map(|&v| v as u8).collect::<Vec<u8>>()),
            ),
            16 => DataElement::new(
                tags::PIXEL_DATA,
                VR::OW,
                PrimitiveValue::U16(self.pixels.iter().map(|&v| v as u16).collect()),
            ),
            bits => DataElement::new(
                tags::PIXEL_DATA,
                VR::OB,
                PrimitiveValue::from(vec![0_u8; self.pixels.len() * (bits as usize / 8)]),
            ),
        }
    }
}

/// Decode a streamed chunk back into its little-endian words.
pub fn words(chunk: &[u8]) -> Vec<u16> {
    chunk
        .chunks_exact(2)
        .map(|word| u16::from_le_bytes([word[0], word[1]]))
        .collect()
}

/// Transfer function file bytes for `count` colours.
pub fn tf_file(count: u32) -> Vec<u8> {
    let mut bytes = b"TF01".to_vec();
    bytes.extend_from_slice(&count.to_le_bytes());
    bytes.extend((0..count * 16).map(|i| i as u8));
    bytes
}
