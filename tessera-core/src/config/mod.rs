//! Screen configuration
//!
//! Board-agnostic description of the panel and the compositor's memory
//! budget. The transfer buffers themselves are supplied separately because
//! they usually live in statically allocated (often DMA-capable) RAM.

pub mod toml;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::geometry::Rect;
use crate::surface::PixelFormat;

/// How dirty regions are pushed to the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UpdateMode {
    /// Render dirty rectangles in buffer-sized strips; supports double buffering
    #[default]
    Partial,
    /// Render whole dirty rectangles into a full-frame buffer
    Direct,
}

impl UpdateMode {
    /// Look up a mode by its configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "partial" => Some(UpdateMode::Partial),
            "direct" => Some(UpdateMode::Direct),
            _ => None,
        }
    }
}

/// Compositor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScreenConfig {
    /// Panel width in pixels
    pub width: u16,
    /// Panel height in pixels
    pub height: u16,
    /// Pixel format of the transfer buffers
    pub format: PixelFormat,
    /// Update strategy
    pub mode: UpdateMode,
    /// Usable bytes per transfer buffer (0 = whole supplied buffer)
    pub buffer_size: usize,
    /// Horizontal alignment granularity of flushed regions (pixels)
    pub h_align: u16,
    /// Vertical alignment granularity of flushed regions (pixels)
    pub v_align: u16,
    /// Raw pixel value used to clear each chunk before painting
    pub background: u32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self::new(320, 240, PixelFormat::Rgb565)
    }
}

impl ScreenConfig {
    /// Configuration for a panel with default options
    pub const fn new(width: u16, height: u16, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            mode: UpdateMode::Partial,
            buffer_size: 0,
            h_align: 1,
            v_align: 1,
            background: 0,
        }
    }

    pub const fn with_mode(mut self, mode: UpdateMode) -> Self {
        self.mode = mode;
        self
    }

    pub const fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub const fn with_alignment(mut self, h_align: u16, v_align: u16) -> Self {
        self.h_align = h_align;
        self.v_align = v_align;
        self
    }

    pub const fn with_background(mut self, background: u32) -> Self {
        self.background = background;
        self
    }

    /// Full screen rectangle
    pub fn bounds(&self) -> Rect {
        // validate() rejects zero sizes; fall back to a single pixel
        Rect::from_size(self.width, self.height).unwrap_or(Rect::new(0, 0, 0, 0))
    }

    /// Bytes needed for one full frame
    pub const fn frame_len(&self) -> usize {
        self.format.buffer_len(self.width as u32, self.height as u32)
    }

    /// Check the configuration for consistency
    pub fn validate(&self) -> Result<(), Error> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidArgument);
        }
        if self.width > i16::MAX as u16 || self.height > i16::MAX as u16 {
            return Err(Error::InvalidArgument);
        }
        if self.h_align == 0 || self.v_align == 0 {
            return Err(Error::InvalidArgument);
        }
        if self.background & !self.format.value_mask() != 0 {
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }
}
