use serde::{Deserialize, Serialize};

/// Texture packing advertised to renderers for a volume's voxel data.
///
/// 16-bit volumes are announced as two 8-bit channels rather than one
/// 16-bit channel. Renderers reassemble the sample from the channel pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFormat {
    #[serde(rename = "r8unorm")]
    SingleChannel8,
    #[serde(rename = "rg8unorm")]
    DualChannel8,
}

impl TextureFormat {
    /// Map a voxel bit depth onto its texture format. Only 8 and 16 bits
    /// are representable.
    pub fn from_voxel_bits(bits: u16) -> Option<Self> {
        match bits {
            8 => Some(Self::SingleChannel8),
            16 => Some(Self::DualChannel8),
            _ => None,
        }
    }

    /// The tag sent over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleChannel8 => "r8unorm",
            Self::DualChannel8 => "rg8unorm",
        }
    }
}

impl std::fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TextureFormat> for wgpu::TextureFormat {
    fn from(format: TextureFormat) -> Self {
        match format {
            TextureFormat::SingleChannel8 => wgpu::TextureFormat::R8Unorm,
            TextureFormat::DualChannel8 => wgpu::TextureFormat::Rg8Unorm,
        }
    }
}

/// What happens when a rescaled sample falls outside `0..=65535`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Overflow {
    /// Truncate toward zero, then keep the low 16 bits.
    #[default]
    Wrap,
    /// Saturate at the nearest bound.
    Clamp,
}

impl Overflow {
    #[inline]
    pub fn apply(self, value: f64) -> u16 {
        match self {
            Overflow::Wrap => (value as i64) as u16,
            Overflow::Clamp => value.clamp(0.0, u16::MAX as f64) as u16,
        }
    }
}
