//! Pixel depths understood by the blit engine.
//!
//! Only depths that are a whole number of bytes are supported. Anything else (1, 4, 24bpp packed
//! and friends) has no [`BitsPerPixel`] and is declined by every path that needs one.

use derive_enum_all_values::AllValues;

/// A supported pixel depth.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, AllValues)]
pub enum BitsPerPixel {
    /// 8 bits per pixel, e.g. palettized or greyscale.
    Bpp8,
    /// 16 bits per pixel, e.g. r5g6b5.
    Bpp16,
    /// 32 bits per pixel, e.g. a8r8g8b8.
    Bpp32,
}

impl BitsPerPixel {
    /// Maps a raw depth in bits to a supported depth.
    ///
    /// Returns [`None`] for any depth that is not 8, 16 or 32.
    #[inline]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            8 => Some(Self::Bpp8),
            16 => Some(Self::Bpp16),
            32 => Some(Self::Bpp32),
            _ => None,
        }
    }

    /// Depth in bits.
    #[inline]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Bpp8 => 8,
            Self::Bpp16 => 16,
            Self::Bpp32 => 32,
        }
    }

    /// Depth in bytes.
    #[inline]
    pub const fn bytes(self) -> usize {
        (self.bits() >> 3) as usize
    }

    /// Truncates a packed colour to the low bits this depth stores.
    #[inline]
    pub const fn mask_color(self, color: u32) -> u32 {
        match self {
            Self::Bpp8 => color & 0xFF,
            Self::Bpp16 => color & 0xFFFF,
            Self::Bpp32 => color,
        }
    }
}
