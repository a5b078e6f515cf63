//! Pixel formats of transfer buffers
//!
//! Sub-byte formats pack pixels MSB-first and pad every scanline to a whole
//! byte. Multi-byte formats are stored big-endian, which is the order SPI
//! panels consume them in.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pixel layout of a transfer buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PixelFormat {
    /// 1-bit monochrome (e-paper, memory LCD, OLED)
    Mono1,
    /// 2-bit grayscale
    Gray2,
    /// 4-bit grayscale
    Gray4,
    /// 8-bit grayscale
    Gray8,
    /// 4-bit palette index
    Indexed4,
    /// 8-bit palette index
    Indexed8,
    /// 16-bit RGB 5-6-5
    #[default]
    Rgb565,
    /// 24-bit RGB 8-8-8
    Rgb888,
    /// 32-bit ARGB 8-8-8-8
    Argb8888,
}

impl PixelFormat {
    /// Bits per pixel
    pub const fn bits_per_pixel(&self) -> u8 {
        match self {
            PixelFormat::Mono1 => 1,
            PixelFormat::Gray2 => 2,
            PixelFormat::Gray4 | PixelFormat::Indexed4 => 4,
            PixelFormat::Gray8 | PixelFormat::Indexed8 => 8,
            PixelFormat::Rgb565 => 16,
            PixelFormat::Rgb888 => 24,
            PixelFormat::Argb8888 => 32,
        }
    }

    /// Check if pixel values are palette indices
    pub const fn is_indexed(&self) -> bool {
        matches!(self, PixelFormat::Indexed4 | PixelFormat::Indexed8)
    }

    /// Bytes per scanline of the given width
    pub const fn stride(&self, width: u32) -> usize {
        (width as usize * self.bits_per_pixel() as usize + 7) / 8
    }

    /// Bytes needed for a `width` x `height` region
    pub const fn buffer_len(&self, width: u32, height: u32) -> usize {
        self.stride(width) * height as usize
    }

    /// Mask of the bits a raw pixel value may use
    pub const fn value_mask(&self) -> u32 {
        match self.bits_per_pixel() {
            32 => u32::MAX,
            bits => (1u32 << bits) - 1,
        }
    }

    /// Look up a format by its configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        let format = match name {
            "mono1" => PixelFormat::Mono1,
            "gray2" => PixelFormat::Gray2,
            "gray4" => PixelFormat::Gray4,
            "gray8" => PixelFormat::Gray8,
            "indexed4" => PixelFormat::Indexed4,
            "indexed8" => PixelFormat::Indexed8,
            "rgb565" => PixelFormat::Rgb565,
            "rgb888" => PixelFormat::Rgb888,
            "argb8888" => PixelFormat::Argb8888,
            _ => return None,
        };
        Some(format)
    }
}
