//! Control contract
//!
//! Every widget implements [`Control`] and embeds a [`ControlBase`] holding
//! the bookkeeping the compositor relies on. Controls are registered with a
//! [`Screen`](crate::screen::Screen) by shared reference to a `RefCell`, so
//! application code keeps ownership and can still mutate its widgets between
//! updates.
//!
//! A control has no pointer back to its screen. Invalidations requested by
//! the control are recorded as pending damage in its base and collected by
//! the screen at the start of every update.

use heapless::Vec;

use crate::error::Error;
use crate::geometry::{Point, Rect};
use crate::surface::Surface;

/// Pending damage rectangles a control can hold between two updates
pub const MAX_PENDING_DAMAGE: usize = 4;

/// Handle of a registered control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlId(pub(crate) u16);

impl ControlId {
    /// Raw handle value
    pub const fn raw(&self) -> u16 {
        self.0
    }
}

/// Shared control state
#[derive(Debug, Clone)]
pub struct ControlBase {
    /// Screen-space bounds
    bounds: Rect,
    visible: bool,
    /// Registered with a screen
    attached: bool,
    /// Screen-space rectangles waiting to be collected
    damage: Vec<Rect, MAX_PENDING_DAMAGE>,
}

impl ControlBase {
    /// Visible, unattached control state
    pub const fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            visible: true,
            attached: false,
            damage: Vec::new(),
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Move or resize the control
    ///
    /// While attached and visible both the old and the new area are marked
    /// for redraw.
    pub fn set_bounds(&mut self, bounds: Rect) {
        if bounds == self.bounds {
            return;
        }
        if self.attached && self.visible {
            self.record(self.bounds);
            self.record(bounds);
        }
        self.bounds = bounds;
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the control, marking its area for redraw on change
    pub fn set_visible(&mut self, visible: bool) {
        if visible == self.visible {
            return;
        }
        self.visible = visible;
        if self.attached {
            self.record(self.bounds);
        }
    }

    /// Check if the control is registered with a screen
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Mark the whole control for redraw
    pub fn invalidate(&mut self) -> Result<(), Error> {
        if !self.attached {
            return Err(Error::InvalidState);
        }
        self.record(self.bounds);
        Ok(())
    }

    /// Mark part of the control for redraw
    ///
    /// `rect` is in control-local coordinates and is clipped to the control.
    pub fn invalidate_rect(&mut self, rect: Rect) -> Result<(), Error> {
        if !self.attached {
            return Err(Error::InvalidState);
        }
        let screen = rect.offset(self.bounds.x1() as i32, self.bounds.y1() as i32);
        if let Some(area) = screen.intersection(&self.bounds) {
            self.record(area);
        }
        Ok(())
    }

    /// Check if any damage is waiting to be collected
    pub fn has_damage(&self) -> bool {
        !self.damage.is_empty()
    }

    pub(crate) fn attach(&mut self) {
        self.attached = true;
    }

    pub(crate) fn detach(&mut self) {
        self.attached = false;
        self.damage.clear();
    }

    pub(crate) fn peek_damage(&self) -> Option<Rect> {
        self.damage.last().copied()
    }

    pub(crate) fn pop_damage(&mut self) -> Option<Rect> {
        self.damage.pop()
    }

    fn record(&mut self, rect: Rect) {
        if let Err(rect) = self.damage.push(rect) {
            // Full: grow the newest entry instead of losing area
            if let Some(last) = self.damage.last_mut() {
                *last = last.union(&rect);
            }
        }
    }
}

/// Widget interface driven by the compositor
///
/// Only [`base`](Control::base), [`base_mut`](Control::base_mut) and
/// [`on_paint`](Control::on_paint) are required; everything else has a
/// default built on the base.
pub trait Control {
    fn base(&self) -> &ControlBase;

    fn base_mut(&mut self) -> &mut ControlBase;

    fn bounds(&self) -> Rect {
        self.base().bounds()
    }

    fn set_bounds(&mut self, bounds: Rect) {
        self.base_mut().set_bounds(bounds)
    }

    fn visible(&self) -> bool {
        self.base().visible()
    }

    fn set_visible(&mut self, visible: bool) {
        self.base_mut().set_visible(visible)
    }

    /// Called once per pass, before the first `on_paint` of that pass
    fn on_before_paint(&mut self) {}

    /// Draw the part of the control inside `clip`
    ///
    /// Called once for every chunk intersecting the control. `surface` is
    /// translated so that (0, 0) is the control's top-left corner, and
    /// `clip` is expressed in the same coordinates. Writes outside `clip`
    /// are discarded.
    fn on_paint(&mut self, surface: &mut Surface<'_>, clip: Rect);

    /// Called once per pass, after the last chunk that touched the control
    fn on_after_paint(&mut self) {}

    /// Handle touch points given in control-local coordinates
    ///
    /// Returning `true` captures touch input until release.
    fn on_touch(&mut self, _points: &[Point]) -> bool {
        false
    }

    /// Touch capture ended
    fn on_release(&mut self) {}

    fn invalidate(&mut self) -> Result<(), Error> {
        self.base_mut().invalidate()
    }

    fn invalidate_rect(&mut self, rect: Rect) -> Result<(), Error> {
        self.base_mut().invalidate_rect(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(base: &mut ControlBase) -> std::vec::Vec<Rect> {
        let mut out = std::vec::Vec::new();
        while let Some(rect) = base.pop_damage() {
            out.push(rect);
        }
        out.reverse();
        out
    }

    #[test]
    fn test_invalidate_requires_attachment() {
        let mut base = ControlBase::new(Rect::new(0, 0, 9, 9));
        assert_eq!(base.invalidate(), Err(Error::InvalidState));
        assert_eq!(
            base.invalidate_rect(Rect::new(0, 0, 1, 1)),
            Err(Error::InvalidState)
        );
        assert!(!base.has_damage());
    }

    #[test]
    fn test_invalidate_rect_is_local_and_clipped() {
        let mut base = ControlBase::new(Rect::new(10, 20, 19, 29));
        base.attach();
        base.invalidate_rect(Rect::new(5, 5, 20, 20)).unwrap();
        // Entirely outside the control
        base.invalidate_rect(Rect::new(50, 50, 60, 60)).unwrap();
        assert_eq!(drain(&mut base), [Rect::new(15, 25, 19, 29)]);
    }

    #[test]
    fn test_set_bounds_records_old_and_new() {
        let mut base = ControlBase::new(Rect::new(0, 0, 9, 9));
        base.set_bounds(Rect::new(1, 1, 10, 10));
        assert!(!base.has_damage());

        base.attach();
        base.set_bounds(Rect::new(20, 20, 29, 29));
        assert_eq!(
            drain(&mut base),
            [Rect::new(1, 1, 10, 10), Rect::new(20, 20, 29, 29)]
        );

        // Hidden controls move silently
        base.set_visible(false);
        base.pop_damage();
        base.set_bounds(Rect::new(0, 0, 1, 1));
        assert!(!base.has_damage());
    }

    #[test]
    fn test_visibility_change_records_bounds() {
        let mut base = ControlBase::new(Rect::new(0, 0, 9, 9));
        base.attach();
        base.set_visible(true);
        assert!(!base.has_damage());
        base.set_visible(false);
        assert_eq!(drain(&mut base), [Rect::new(0, 0, 9, 9)]);
    }

    #[test]
    fn test_full_damage_list_unions_into_last() {
        let mut base = ControlBase::new(Rect::new(0, 0, 99, 99));
        base.attach();
        for i in 0..MAX_PENDING_DAMAGE as i16 + 2 {
            base.invalidate_rect(Rect::new(i * 10, 0, i * 10 + 1, 1)).unwrap();
        }
        let damage = drain(&mut base);
        assert_eq!(damage.len(), MAX_PENDING_DAMAGE);
        assert_eq!(damage[MAX_PENDING_DAMAGE - 1], Rect::new(30, 0, 51, 1));
    }

    #[test]
    fn test_detach_drops_damage() {
        let mut base = ControlBase::new(Rect::new(0, 0, 9, 9));
        base.attach();
        base.invalidate().unwrap();
        base.detach();
        assert!(!base.has_damage());
        assert!(!base.is_attached());
    }
}
