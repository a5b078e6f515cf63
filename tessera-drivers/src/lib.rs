//! Hardware adapters for the Tessera compositor
//!
//! This crate implements the traits defined in tessera-core on top of
//! `embedded-hal` 1.0 buses:
//!
//! - MIPI DCS panels on SPI with a data/command pin (ST7789, ILI9341, GC9A01, ...)
//! - FT6x36 capacitive touch controllers on I2C
//!
//! Panel initialization sequences are board specific and left to the
//! firmware; [`spi_panel::SpiPanel::command`] can be used to send them.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod ft6x36;
pub mod spi_panel;
