//! Dirty region tracking
//!
//! Keeps the set of screen rectangles that need to be redrawn. Incoming
//! rectangles are clipped to the screen and folded into any rectangle they
//! overlap, so the set stays small and pairwise disjoint.
//!
//! The merge is greedy: it is not a minimal cover and its exact output can
//! depend on insertion order. What it does guarantee is that coverage only
//! grows between two [`DirtyRegions::validate_all`] calls, and that an
//! already-covered rectangle never changes the set.

use heapless::Vec;

use crate::error::Error;
use crate::geometry::{Point, Rect};

/// Default capacity of a dirty region set
pub const MAX_DIRTY_REGIONS: usize = 16;

/// Set of invalid screen rectangles
#[derive(Debug, Clone)]
pub struct DirtyRegions<const N: usize = MAX_DIRTY_REGIONS> {
    /// Screen bounds; everything is clipped to this
    bounds: Rect,
    /// Pairwise disjoint dirty rectangles
    regions: Vec<Rect, N>,
}

impl<const N: usize> DirtyRegions<N> {
    /// Create an empty set for a screen with the given bounds
    pub const fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            regions: Vec::new(),
        }
    }

    /// Screen bounds
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Mark a rectangle as needing redraw
    ///
    /// Rectangles entirely off-screen are ignored. Fails with
    /// [`Error::OutOfMemory`] when the rectangle overlaps nothing and the set
    /// is already full; the set is left unchanged in that case.
    pub fn invalidate(&mut self, rect: Rect) -> Result<(), Error> {
        let Some(mut candidate) = rect.intersection(&self.bounds) else {
            return Ok(());
        };

        if self.regions.iter().any(|r| r.contains(&candidate)) {
            return Ok(());
        }

        // Folding removes at least one entry, so only a disjoint rectangle
        // can overflow the set
        if self.regions.is_full() && !self.regions.iter().any(|r| r.intersects(&candidate)) {
            warn!("dirty region set full ({} regions)", N);
            return Err(Error::OutOfMemory);
        }

        // Every rectangle the result would subsume also intersects it, so
        // folding until nothing overlaps leaves no contained rectangles behind
        while let Some(index) = self.regions.iter().position(|r| r.intersects(&candidate)) {
            let existing = self.regions.swap_remove(index);
            candidate = candidate.union(&existing);
        }

        self.regions
            .push(candidate)
            .map_err(|_| Error::OutOfMemory)
    }

    /// Mark the whole screen as needing redraw
    pub fn invalidate_all(&mut self) {
        self.regions.clear();
        // Cannot fail: the set is empty
        let _ = self.regions.push(self.bounds);
    }

    /// Clear the set once every dirty rectangle has been flushed
    pub fn validate_all(&mut self) {
        self.regions.clear();
    }

    /// Current dirty rectangles, in no particular order
    pub fn regions(&self) -> &[Rect] {
        &self.regions
    }

    /// Check if nothing needs redrawing
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Number of tracked rectangles
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Check if a pixel is covered by the set
    pub fn contains_point(&self, point: Point) -> bool {
        self.regions.iter().any(|r| r.contains_point(point))
    }

    /// Total number of dirty pixels
    pub fn area(&self) -> u64 {
        // Regions are disjoint, so areas simply add up
        self.regions.iter().map(|r| r.area()).sum()
    }
}
