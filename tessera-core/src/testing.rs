//! Test doubles shared by the unit tests

use std::vec::Vec;

use crate::control::{Control, ControlBase};
use crate::geometry::{Point, Rect};
use crate::screen::FlushSignal;
use crate::surface::Surface;
use crate::traits::{FlushTarget, TouchSource};

/// Control that records every call it receives
pub struct TestControl {
    base: ControlBase,
    /// Raw pixel value painted over the clip
    pub fill: u32,
    pub handles_touch: bool,
    /// Invalidate itself from the next `on_paint`
    pub invalidate_on_paint: bool,
    pub paints: Vec<Rect>,
    pub before: usize,
    pub after: usize,
    pub touches: Vec<Vec<Point>>,
    pub releases: usize,
}

impl TestControl {
    pub fn new(bounds: Rect) -> Self {
        Self {
            base: ControlBase::new(bounds),
            fill: 0,
            handles_touch: false,
            invalidate_on_paint: false,
            paints: Vec::new(),
            before: 0,
            after: 0,
            touches: Vec::new(),
            releases: 0,
        }
    }

    pub fn filled(mut self, fill: u32) -> Self {
        self.fill = fill;
        self
    }

    pub fn handling_touch(mut self, handles: bool) -> Self {
        self.handles_touch = handles;
        self
    }
}

impl Control for TestControl {
    fn base(&self) -> &ControlBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ControlBase {
        &mut self.base
    }

    fn on_before_paint(&mut self) {
        self.before += 1;
    }

    fn on_paint(&mut self, surface: &mut Surface<'_>, clip: Rect) {
        self.paints.push(clip);
        surface.fill_rect(clip, self.fill);
        if self.invalidate_on_paint {
            self.invalidate_on_paint = false;
            assert!(self.invalidate().is_ok());
        }
    }

    fn on_after_paint(&mut self) {
        self.after += 1;
    }

    fn on_touch(&mut self, points: &[Point]) -> bool {
        self.touches.push(points.to_vec());
        self.handles_touch
    }

    fn on_release(&mut self) {
        self.releases += 1;
    }
}

/// One flushed chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flushed {
    pub area: Rect,
    pub pixels: Vec<u8>,
}

/// Flush target that keeps a copy of every chunk
///
/// With `auto_complete` the transfer finishes inside `flush`, otherwise it
/// finishes on the first `wait` or when the test calls
/// [`FlushSignal::complete`].
pub struct Recorder<'s> {
    signal: &'s FlushSignal,
    pub auto_complete: bool,
    pub flushes: Vec<Flushed>,
    pub waits: usize,
}

impl<'s> Recorder<'s> {
    pub fn new(signal: &'s FlushSignal, auto_complete: bool) -> Self {
        Self {
            signal,
            auto_complete,
            flushes: Vec::new(),
            waits: 0,
        }
    }

    pub fn areas(&self) -> Vec<Rect> {
        self.flushes.iter().map(|f| f.area).collect()
    }
}

impl FlushTarget for Recorder<'_> {
    fn flush(&mut self, area: Rect, pixels: &[u8]) {
        self.flushes.push(Flushed {
            area,
            pixels: pixels.to_vec(),
        });
        if self.auto_complete {
            self.signal.complete();
        }
    }

    fn wait(&mut self) {
        self.waits += 1;
        self.signal.complete();
    }
}

/// Touch source reporting a fixed set of points until changed
#[derive(Debug, Default)]
pub struct ScriptedTouch {
    pub points: Vec<Point>,
}

impl TouchSource for ScriptedTouch {
    fn read(&mut self, points: &mut [Point]) -> usize {
        let count = self.points.len().min(points.len());
        points[..count].copy_from_slice(&self.points[..count]);
        count
    }
}
