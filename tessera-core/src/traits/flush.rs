//! Flush boundary
//!
//! The compositor hands every completed chunk to a [`FlushTarget`]. The
//! target starts the transfer (usually a DMA write of the address window
//! followed by the pixel data) and returns immediately; completion is
//! reported later through [`FlushSignal::complete`](crate::screen::FlushSignal::complete),
//! typically from the DMA-complete interrupt.

use crate::geometry::Rect;

/// Destination of rendered chunks
pub trait FlushTarget {
    /// Start transferring `pixels` into the panel window `area`
    ///
    /// `pixels` holds exactly the window: `area.height()` scanlines of
    /// `area.width()` pixels in the configured format, packed row by row in
    /// both update modes. The buffer stays untouched
    /// by the compositor until the transfer is signaled complete. Must not
    /// block.
    fn flush(&mut self, area: Rect, pixels: &[u8]);

    /// Called repeatedly while the compositor waits for a transfer to finish
    ///
    /// Only used when no second buffer is available to render into.
    fn wait(&mut self) {
        core::hint::spin_loop();
    }
}

impl<T: FlushTarget + ?Sized> FlushTarget for &mut T {
    fn flush(&mut self, area: Rect, pixels: &[u8]) {
        (**self).flush(area, pixels)
    }

    fn wait(&mut self) {
        (**self).wait()
    }
}

/// Adapter turning a closure into a [`FlushTarget`]
pub struct FlushFn<F>(pub F);

impl<F> FlushTarget for FlushFn<F>
where
    F: FnMut(Rect, &[u8]),
{
    fn flush(&mut self, area: Rect, pixels: &[u8]) {
        (self.0)(area, pixels)
    }
}
