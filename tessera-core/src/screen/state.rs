//! Compositor state machine records

use crate::geometry::Rect;

/// Compositor update state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Nothing left to render
    #[default]
    Idle,
    /// About to pick the next dirty rectangle
    Selecting,
    /// Rendering strips of the current dirty rectangle
    Chunking,
    /// A rendered chunk waits for the other buffer's transfer to finish
    AwaitingBuffer,
}

impl State {
    /// Check if a render pass is in progress
    pub fn is_busy(&self) -> bool {
        !matches!(self, State::Idle)
    }
}

/// Position inside the current render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChunkCursor {
    /// Index into the pass's dirty regions
    pub region: usize,
    /// Aligned and clipped dirty rectangle being rendered
    pub area: Rect,
    /// First scanline of the next chunk, relative to `area`
    pub line: u32,
    /// Scanlines per chunk
    pub lines: u32,
}

impl ChunkCursor {
    /// Screen rectangle of the next chunk
    pub fn chunk(&self) -> Rect {
        let top = self.area.y1() as i32 + self.line as i32;
        let bottom = (top + self.lines as i32 - 1).min(self.area.y2() as i32);
        Rect::new(self.area.x1(), top as i16, self.area.x2(), bottom as i16)
    }

    /// Cursor for the following chunk, if the area is not yet covered
    pub fn advance(&self) -> Option<ChunkCursor> {
        let line = self.line + self.lines;
        (line < self.area.height()).then_some(ChunkCursor { line, ..*self })
    }
}

/// A rendered chunk whose flush waits for a free buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DeferredFlush {
    pub slot: usize,
    pub area: Rect,
    pub len: usize,
}
