//! Hardware boundary traits
//!
//! These traits define the interface between the compositor and the
//! board-specific code that moves pixels to the panel and reads touches.

pub mod flush;
pub mod touch;

pub use flush::{FlushFn, FlushTarget};
pub use touch::{NoTouch, TouchFn, TouchSource, MAX_TOUCH_POINTS};
