//! FT6x36 capacitive touch controller (I2C)
//!
//! FT6206/FT6236/FT6336 family. The controller reports up to two points in
//! panel-native coordinates; [`TouchTransform`] maps them into screen space
//! for rotated or mirrored mounting.
//!
//! # Register layout
//!
//! Reading from `TD_STATUS` (0x02) returns the point count followed by one
//! 6-byte record per point:
//! - XH: event flag (bits 7:6), X high nibble (bits 3:0)
//! - XL: X low byte
//! - YH: touch id (bits 7:4), Y high nibble (bits 3:0)
//! - YL: Y low byte
//! - weight, area (unused)

use embedded_hal::i2c::I2c;
use tessera_core::error::Error;
use tessera_core::geometry::Point;
use tessera_core::traits::{TouchSource, MAX_TOUCH_POINTS};

/// Default 7-bit I2C address
pub const DEFAULT_ADDRESS: u8 = 0x38;

/// FT6x36 register addresses
pub mod reg {
    /// Number of active points
    pub const TD_STATUS: u8 = 0x02;
    /// First point record
    pub const P1_XH: u8 = 0x03;
    /// Chip vendor id
    pub const CHIP_ID: u8 = 0xA3;
}

/// Bytes per point record
const POINT_LEN: usize = 6;

/// Status byte plus two point records
const REPORT_LEN: usize = 1 + POINT_LEN * MAX_TOUCH_POINTS;

/// Mapping from panel-native to screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchTransform {
    /// Exchange X and Y before mirroring
    pub swap_xy: bool,
    pub mirror_x: bool,
    pub mirror_y: bool,
    /// Screen width (after swapping)
    pub width: u16,
    /// Screen height (after swapping)
    pub height: u16,
}

impl TouchTransform {
    /// Pass coordinates through unchanged
    pub const fn identity(width: u16, height: u16) -> Self {
        Self {
            swap_xy: false,
            mirror_x: false,
            mirror_y: false,
            width,
            height,
        }
    }

    /// Map a raw controller point into screen space
    pub fn apply(&self, x: u16, y: u16) -> Point {
        let (mut x, mut y) = if self.swap_xy { (y, x) } else { (x, y) };
        if self.mirror_x {
            x = self.width.saturating_sub(1).saturating_sub(x);
        }
        if self.mirror_y {
            y = self.height.saturating_sub(1).saturating_sub(y);
        }
        Point::new(clamp(x), clamp(y))
    }
}

/// FT6x36 touch source
pub struct Ft6x36<I2C> {
    i2c: I2C,
    address: u8,
    transform: TouchTransform,
    last_error: Option<Error>,
}

impl<I2C: I2c> Ft6x36<I2C> {
    pub fn new(i2c: I2C, transform: TouchTransform) -> Self {
        Self {
            i2c,
            address: DEFAULT_ADDRESS,
            transform,
            last_error: None,
        }
    }

    /// Use a non-default I2C address
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Read the vendor id register
    pub fn chip_id(&mut self) -> Result<u8, I2C::Error> {
        let mut id = [0u8; 1];
        self.i2c.write_read(self.address, &[reg::CHIP_ID], &mut id)?;
        Ok(id[0])
    }

    /// Read the active points in screen coordinates
    ///
    /// Returns how many entries of `points` were filled.
    pub fn read_points(&mut self, points: &mut [Point]) -> Result<usize, I2C::Error> {
        let mut report = [0u8; REPORT_LEN];
        self.i2c
            .write_read(self.address, &[reg::TD_STATUS], &mut report)?;

        let count = (report[0] & 0x0F) as usize;
        // The status nibble reads 0x0F while the controller is idle
        if count > MAX_TOUCH_POINTS {
            return Ok(0);
        }

        let count = count.min(points.len());
        for (i, point) in points.iter_mut().take(count).enumerate() {
            let record = &report[1 + i * POINT_LEN..1 + (i + 1) * POINT_LEN];
            let x = u16::from_be_bytes([record[0] & 0x0F, record[1]]);
            let y = u16::from_be_bytes([record[2] & 0x0F, record[3]]);
            *point = self.transform.apply(x, y);
        }
        Ok(count)
    }

    /// Error from the most recent failed read, if any
    pub fn take_error(&mut self) -> Option<Error> {
        self.last_error.take()
    }

    /// Give back the bus
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> TouchSource for Ft6x36<I2C> {
    fn read(&mut self, points: &mut [Point]) -> usize {
        match self.read_points(points) {
            Ok(count) => count,
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("touch read failed");
                self.last_error = Some(Error::IoError);
                // Report a release rather than a stale touch
                0
            }
        }
    }
}

fn clamp(value: u16) -> i16 {
    value.min(i16::MAX as u16) as i16
}
