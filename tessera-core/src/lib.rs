//! Screen compositor for memory-constrained embedded displays
//!
//! This crate contains the board-agnostic part of the UI toolkit:
//!
//! - Geometry and dirty region tracking
//! - Drawing surfaces over transfer buffers (with an `embedded-graphics` adapter)
//! - The control contract implemented by widgets
//! - The chunked, double-buffered render/flush state machine
//! - Touch hit-testing and capture
//! - Screen configuration and panel profiles
//!
//! Moving pixels to the panel and reading touches happens behind the traits
//! in [`traits`]; see the `tessera-drivers` crate for SPI/I2C implementations.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod log;

pub mod config;
pub mod control;
pub mod dirty;
pub mod error;
pub mod geometry;
pub mod screen;
pub mod surface;
pub mod traits;

mod touch;

#[cfg(test)]
mod testing;
