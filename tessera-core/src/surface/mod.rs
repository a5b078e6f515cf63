//! Drawing surfaces over transfer buffers
//!
//! A [`Surface`] wraps a caller-owned byte buffer holding a rectangular block
//! of pixels. Controls never see the raw buffer: they receive a *view* that
//! is translated into their own coordinate space and clipped to the part of
//! the control that falls inside the current chunk, so drawing outside the
//! clip is silently discarded.
//!
//! Raw pixel values are written as-is (masked to the format's bit depth).
//! Rasterizing shapes, text and images is left to the widget code, usually
//! through the `embedded-graphics` adapter in [`Canvas`].

mod canvas;
mod format;

pub use canvas::Canvas;
pub use format::PixelFormat;

use crate::error::Error;
use crate::geometry::{Point, Rect};

/// A clipped, translated view over a pixel buffer
#[derive(Debug)]
pub struct Surface<'b> {
    data: &'b mut [u8],
    format: PixelFormat,
    palette: Option<&'b [u32]>,
    /// Bytes per buffer scanline
    stride: usize,
    /// Buffer position of local (0, 0)
    origin_x: i32,
    origin_y: i32,
    /// Writable area in local coordinates; `None` when fully clipped
    clip: Option<Rect>,
}

impl<'b> Surface<'b> {
    /// Create a surface covering a `width` x `height` pixel buffer
    pub fn new(
        data: &'b mut [u8],
        width: u16,
        height: u16,
        format: PixelFormat,
    ) -> Result<Self, Error> {
        if width > i16::MAX as u16 || height > i16::MAX as u16 {
            return Err(Error::InvalidArgument);
        }
        let clip = Rect::from_size(width, height).ok_or(Error::InvalidArgument)?;
        if data.len() < format.buffer_len(width as u32, height as u32) {
            return Err(Error::OutOfMemory);
        }

        Ok(Self {
            data,
            format,
            palette: None,
            stride: format.stride(width as u32),
            origin_x: 0,
            origin_y: 0,
            clip: Some(clip),
        })
    }

    /// Attach a palette for indexed formats
    pub fn with_palette(mut self, palette: Option<&'b [u32]>) -> Self {
        self.palette = palette;
        self
    }

    /// Create a sub-view whose local origin sits at (`dx`, `dy`) of this one
    ///
    /// `clip` is given in the new view's coordinates and is further limited
    /// to what this surface may write.
    pub fn view(&mut self, dx: i32, dy: i32, clip: Rect) -> Surface<'_> {
        let clip = self
            .clip
            .map(|parent| parent.offset(-dx, -dy))
            .and_then(|parent| parent.intersection(&clip));

        Surface {
            data: &mut *self.data,
            format: self.format,
            palette: self.palette,
            stride: self.stride,
            origin_x: self.origin_x + dx,
            origin_y: self.origin_y + dy,
            clip,
        }
    }

    /// Pixel format of the underlying buffer
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Palette entries (RGB888), if one was configured
    pub fn palette(&self) -> Option<&[u32]> {
        self.palette
    }

    /// Writable area in local coordinates
    pub fn bounds(&self) -> Option<Rect> {
        self.clip
    }

    /// Write one pixel; points outside the clip are ignored
    pub fn set_pixel(&mut self, point: Point, value: u32) {
        if !self.clip.is_some_and(|clip| clip.contains_point(point)) {
            return;
        }
        let (x, y) = self.buffer_position(point);
        self.fill_span(x, y, 1, value);
    }

    /// Read one pixel back; `None` outside the clip
    pub fn pixel(&self, point: Point) -> Option<u32> {
        if !self.clip?.contains_point(point) {
            return None;
        }
        let (x, y) = self.buffer_position(point);
        let row = y * self.stride;
        let value = match self.format.bits_per_pixel() {
            8 => self.data[row + x] as u32,
            bits @ (16 | 24 | 32) => {
                let n = bits as usize / 8;
                let start = row + x * n;
                self.data[start..start + n]
                    .iter()
                    .fold(0u32, |acc, &b| (acc << 8) | b as u32)
            }
            bits => {
                let bit = x * bits as usize;
                let shift = 8 - bits as usize - bit % 8;
                let mask = (1u32 << bits) - 1;
                (self.data[row + bit / 8] as u32 >> shift) & mask
            }
        };
        Some(value)
    }

    /// Fill a rectangle (local coordinates), clipped to the view
    pub fn fill_rect(&mut self, rect: Rect, value: u32) {
        let Some(area) = self.clip.and_then(|clip| clip.intersection(&rect)) else {
            return;
        };
        let (x, y) = self.buffer_position(area.top_left());
        let count = area.width() as usize;
        for row in 0..area.height() as usize {
            self.fill_span(x, y + row, count, value);
        }
    }

    /// Fill the whole writable area
    pub fn clear(&mut self, value: u32) {
        if let Some(clip) = self.clip {
            self.fill_rect(clip, value);
        }
    }

    /// Closest palette index for an RGB888 color
    pub fn palette_index(&self, rgb: u32) -> Result<u32, Error> {
        let palette = self.palette.ok_or(Error::NoPalette)?;
        palette
            .iter()
            .enumerate()
            .min_by_key(|&(_, entry)| color_distance(*entry, rgb))
            .map(|(index, _)| index as u32)
            .ok_or(Error::NoPalette)
    }

    fn buffer_position(&self, point: Point) -> (usize, usize) {
        // The clip never extends past the buffer, so this is non-negative
        (
            (point.x as i32 + self.origin_x) as usize,
            (point.y as i32 + self.origin_y) as usize,
        )
    }

    fn fill_span(&mut self, x: usize, y: usize, count: usize, value: u32) {
        let value = value & self.format.value_mask();
        let row = y * self.stride;
        match self.format.bits_per_pixel() {
            8 => self.data[row + x..row + x + count].fill(value as u8),
            bits @ (16 | 24 | 32) => {
                let n = bits as usize / 8;
                let bytes = value.to_be_bytes();
                let pixel = &bytes[4 - n..];
                let start = row + x * n;
                for chunk in self.data[start..start + count * n].chunks_exact_mut(n) {
                    chunk.copy_from_slice(pixel);
                }
            }
            bits => {
                let bits = bits as usize;
                let lane = ((1u16 << bits) - 1) as u8;
                for i in 0..count {
                    let bit = (x + i) * bits;
                    let shift = 8 - bits - bit % 8;
                    let mask = lane << shift;
                    let byte = &mut self.data[row + bit / 8];
                    *byte = (*byte & !mask) | (((value as u8) << shift) & mask);
                }
            }
        }
    }
}

fn color_distance(a: u32, b: u32) -> u32 {
    let channel = |c: u32, shift: u32| ((c >> shift) & 0xFF) as i32;
    let dr = channel(a, 16) - channel(b, 16);
    let dg = channel(a, 8) - channel(b, 8);
    let db = channel(a, 0) - channel(b, 0);
    (dr * dr + dg * dg + db * db) as u32
}
