//! Touch dispatch
//!
//! Hit-testing and capture over the registered controls. The topmost
//! visible control under the primary point gets the first chance to handle
//! a touch; controls that decline pass it down to the ones below. A control
//! that accepts captures all further points until every finger is lifted.

use heapless::Vec;

use crate::control::ControlId;
use crate::geometry::{Point, Rect};
use crate::screen::Registered;
use crate::traits::MAX_TOUCH_POINTS;

/// Touch capture tracking
#[derive(Debug, Default)]
pub(crate) struct TouchDispatcher {
    captured: Option<ControlId>,
}

impl TouchDispatcher {
    pub(crate) const fn new() -> Self {
        Self { captured: None }
    }

    pub(crate) fn captured(&self) -> Option<ControlId> {
        self.captured
    }

    /// Drop capture held by `id`, returning whether it was held
    pub(crate) fn release(&mut self, id: ControlId) -> bool {
        if self.captured == Some(id) {
            self.captured = None;
            true
        } else {
            false
        }
    }

    /// Deliver one touch report in screen coordinates
    pub(crate) fn dispatch(&mut self, controls: &[Registered<'_>], points: &[Point]) {
        if points.is_empty() {
            if let Some(id) = self.captured.take() {
                if let Some(entry) = controls.iter().find(|e| e.id == id) {
                    if let Ok(mut control) = entry.control.try_borrow_mut() {
                        control.on_release();
                    }
                }
                debug!("touch released by control {}", id.raw());
            }
            return;
        }

        if let Some(id) = self.captured {
            match controls.iter().find(|e| e.id == id) {
                Some(entry) => {
                    if let Ok(mut control) = entry.control.try_borrow_mut() {
                        let local = to_local(points, control.bounds());
                        control.on_touch(&local);
                    }
                    return;
                }
                None => self.captured = None,
            }
        }

        let primary = points[0];
        for entry in controls.iter().rev() {
            let Ok(mut control) = entry.control.try_borrow_mut() else {
                continue;
            };
            let bounds = control.bounds();
            if !control.visible() || !bounds.contains_point(primary) {
                continue;
            }
            if control.on_touch(&to_local(points, bounds)) {
                debug!("touch captured by control {}", entry.id.raw());
                self.captured = Some(entry.id);
                return;
            }
        }
        trace!("touch at ({}, {}) not handled", primary.x, primary.y);
    }
}

fn to_local(points: &[Point], bounds: Rect) -> Vec<Point, MAX_TOUCH_POINTS> {
    points
        .iter()
        .take(MAX_TOUCH_POINTS)
        .map(|p| p.offset(-(bounds.x1() as i32), -(bounds.y1() as i32)))
        .collect()
}
