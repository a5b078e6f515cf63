//! Screen compositor
//!
//! The [`Screen`] owns the dirty region set and the registered controls and
//! drives rendering through a resumable state machine:
//!
//! ```text
//! Idle -> Selecting -> Chunking -> (AwaitingBuffer) -> Selecting / Idle
//! ```
//!
//! In partial mode each dirty rectangle is aligned, split into strips that
//! fit one transfer buffer, and every strip is painted by the controls that
//! intersect it before being handed to the [`FlushTarget`]. With two buffers
//! the next strip is rendered while the previous one is still in flight; a
//! strip that finishes before the other buffer is free is parked and flushed
//! on the next [`Screen::update`]. With one buffer every flush is waited for.
//!
//! Each pass renders a snapshot of the dirty set taken when the pass starts.
//! Invalidations arriving while a pass is in progress are kept for the next
//! pass.

mod buffers;
mod state;

pub use buffers::{Buffers, FlushSignal, SlotState};
pub use state::State;

use core::cell::{RefCell, RefMut};
use core::mem;

use heapless::Vec;

use self::buffers::BufferSlots;
use self::state::{ChunkCursor, DeferredFlush};
use crate::config::{ScreenConfig, UpdateMode};
use crate::control::{Control, ControlBase, ControlId};
use crate::dirty::DirtyRegions;
use crate::error::Error;
use crate::geometry::{Point, Rect};
use crate::surface::Surface;
use crate::touch::TouchDispatcher;
use crate::traits::{FlushTarget, NoTouch, TouchSource, MAX_TOUCH_POINTS};

/// Maximum number of controls registered with one screen
pub const MAX_CONTROLS: usize = 32;

/// A registered control
pub(crate) struct Registered<'a> {
    pub id: ControlId,
    pub control: &'a RefCell<dyn Control + 'a>,
    /// `on_before_paint` was called in the current pass
    pub touched: bool,
}

/// Screen compositor
pub struct Screen<'a, F, T = NoTouch> {
    config: ScreenConfig,
    bounds: Rect,
    /// Invalidations not yet picked up by a pass
    dirty: DirtyRegions,
    /// Regions rendered by the current pass
    pass: DirtyRegions,
    controls: Vec<Registered<'a>, MAX_CONTROLS>,
    next_id: u16,
    buffers: BufferSlots<'a>,
    signal: &'a FlushSignal,
    palette: Option<&'a [u32]>,
    flush: F,
    touch: T,
    dispatcher: TouchDispatcher,
    state: State,
    cursor: Option<ChunkCursor>,
    deferred: Option<DeferredFlush>,
}

impl<'a, F: FlushTarget> Screen<'a, F> {
    /// Create a compositor
    ///
    /// Fails with [`Error::InvalidArgument`] for an inconsistent
    /// configuration and with [`Error::OutOfMemory`] when the buffers cannot
    /// hold one aligned full-width strip (partial mode) or one full frame
    /// (direct mode).
    pub fn new(
        config: ScreenConfig,
        buffers: Buffers<'a>,
        signal: &'a FlushSignal,
        flush: F,
    ) -> Result<Self, Error> {
        config.validate()?;

        let buffers = match (config.mode, buffers) {
            // Direct mode renders whole frames into the first buffer only
            (UpdateMode::Direct, Buffers::Double(first, _)) => Buffers::Single(first),
            (_, buffers) => buffers,
        };
        let buffers = BufferSlots::new(buffers, config.buffer_size)?;

        let required = match config.mode {
            UpdateMode::Partial => {
                config.format.stride(config.width as u32) * config.v_align as usize
            }
            UpdateMode::Direct => config.frame_len(),
        };
        if buffers.capacity() < required {
            warn!(
                "transfer buffer too small: {} < {} bytes",
                buffers.capacity(),
                required
            );
            return Err(Error::OutOfMemory);
        }

        let bounds = config.bounds();
        debug!(
            "screen {}x{}, {} buffer(s) of {} bytes",
            config.width,
            config.height,
            if buffers.is_double() { 2 } else { 1 },
            buffers.capacity()
        );

        Ok(Self {
            config,
            bounds,
            dirty: DirtyRegions::new(bounds),
            pass: DirtyRegions::new(bounds),
            controls: Vec::new(),
            next_id: 0,
            buffers,
            signal,
            palette: None,
            flush,
            touch: NoTouch,
            dispatcher: TouchDispatcher::new(),
            state: State::Idle,
            cursor: None,
            deferred: None,
        })
    }
}

impl<'a, F: FlushTarget, T: TouchSource> Screen<'a, F, T> {
    /// Replace the touch source
    pub fn with_touch<U: TouchSource>(self, touch: U) -> Screen<'a, F, U> {
        Screen {
            config: self.config,
            bounds: self.bounds,
            dirty: self.dirty,
            pass: self.pass,
            controls: self.controls,
            next_id: self.next_id,
            buffers: self.buffers,
            signal: self.signal,
            palette: self.palette,
            flush: self.flush,
            touch,
            dispatcher: self.dispatcher,
            state: self.state,
            cursor: self.cursor,
            deferred: self.deferred,
        }
    }

    /// Set the RGB888 palette used by indexed formats
    pub fn with_palette(mut self, palette: &'a [u32]) -> Self {
        self.palette = Some(palette);
        self
    }

    /// Register a control on top of the existing ones
    ///
    /// The control's area is marked for redraw. Fails with
    /// [`Error::InvalidState`] if the control is already registered (or
    /// currently borrowed) and with [`Error::OutOfMemory`] when the control
    /// table is full.
    pub fn register(
        &mut self,
        control: &'a RefCell<dyn Control + 'a>,
    ) -> Result<ControlId, Error> {
        if self.controls.is_full() {
            return Err(Error::OutOfMemory);
        }
        let mut guard = control.try_borrow_mut().map_err(|_| Error::InvalidState)?;
        if guard.base().is_attached() {
            return Err(Error::InvalidState);
        }
        if guard.visible() {
            self.dirty.invalidate(guard.bounds())?;
        }
        guard.base_mut().attach();
        drop(guard);

        let id = self.allocate_id();
        self.controls
            .push(Registered {
                id,
                control,
                touched: false,
            })
            .map_err(|_| Error::OutOfMemory)?;
        debug!("control {} registered", id.raw());
        Ok(id)
    }

    /// Remove a control
    ///
    /// Its area is marked for redraw. A pending `on_after_paint` for the
    /// current pass and an active touch capture are completed first.
    pub fn unregister(&mut self, id: ControlId) -> Result<(), Error> {
        let index = self.index_of(id)?;
        let entry = &self.controls[index];
        let mut control = borrow(entry.control)?;

        collect(control.base_mut(), &mut self.dirty)?;
        if control.visible() {
            self.dirty.invalidate(control.bounds())?;
        }

        if self.dispatcher.release(id) {
            control.on_release();
        }
        if entry.touched {
            control.on_after_paint();
        }
        control.base_mut().detach();
        drop(control);

        self.controls.remove(index);
        debug!("control {} unregistered", id.raw());
        Ok(())
    }

    /// Mark a screen rectangle for redraw
    pub fn invalidate(&mut self, rect: Rect) -> Result<(), Error> {
        self.dirty.invalidate(rect)
    }

    /// Mark the whole screen for redraw
    pub fn invalidate_all(&mut self) {
        self.dirty.invalidate_all();
    }

    /// Mark a registered control for redraw right away
    ///
    /// Also picks up any damage the control recorded since the last update.
    pub fn invalidate_control(&mut self, id: ControlId) -> Result<(), Error> {
        let index = self.index_of(id)?;
        let mut control = borrow(self.controls[index].control)?;
        collect(control.base_mut(), &mut self.dirty)?;
        if control.visible() {
            self.dirty.invalidate(control.bounds())?;
        }
        Ok(())
    }

    /// Advance rendering
    ///
    /// Polls touch input once, then renders one chunk (`full == false`) or
    /// keeps rendering until the screen is up to date or a chunk has to
    /// wait for a free buffer (`full == true`). Returns the resulting state.
    ///
    /// Control damage that does not fit into a full dirty set stays with the
    /// control and is picked up once rendering has made room. The call only
    /// fails with [`Error::OutOfMemory`] if it still does not fit after that.
    pub fn update(&mut self, full: bool) -> Result<State, Error> {
        let resumed = self.resume_deferred()?;
        self.poll_touch();
        if self.config.format.is_indexed() && self.palette.is_none() {
            return Err(Error::NoPalette);
        }

        if self.cursor.is_none() && self.deferred.is_none() {
            self.after_paint();
        }
        let mut collected = self.collect_damage();

        if self.deferred.is_some() || (resumed && !full) {
            return Ok(self.state);
        }

        loop {
            let state = self.step()?;
            if collected.is_err() {
                collected = self.collect_damage();
            }
            let done = match state {
                State::AwaitingBuffer => true,
                State::Idle => !full || self.dirty.is_empty(),
                _ => !full,
            };
            if done {
                return collected.map(|()| state);
            }
        }
    }

    /// Report that the last flushed buffer has been transferred
    ///
    /// Same as calling [`FlushSignal::complete`] on the shared signal.
    pub fn flush_complete(&self) {
        self.signal.complete();
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Check if nothing is being rendered or waiting to be rendered
    pub fn is_idle(&self) -> bool {
        self.state == State::Idle && self.dirty.is_empty() && self.pass.is_empty()
    }

    /// Invalidations waiting for the next pass
    pub fn dirty(&self) -> &DirtyRegions {
        &self.dirty
    }

    /// Control currently holding touch capture
    pub fn captured(&self) -> Option<ControlId> {
        self.dispatcher.captured()
    }

    pub fn config(&self) -> &ScreenConfig {
        &self.config
    }

    /// Number of registered controls
    pub fn control_count(&self) -> usize {
        self.controls.len()
    }

    pub fn flush_target(&self) -> &F {
        &self.flush
    }

    pub fn flush_target_mut(&mut self) -> &mut F {
        &mut self.flush
    }

    pub fn touch_source_mut(&mut self) -> &mut T {
        &mut self.touch
    }

    /// Change the background fill value and redraw everything
    pub fn set_background(&mut self, background: u32) -> Result<(), Error> {
        if background & !self.config.format.value_mask() != 0 {
            return Err(Error::InvalidArgument);
        }
        self.config.background = background;
        self.dirty.invalidate_all();
        Ok(())
    }

    fn allocate_id(&mut self) -> ControlId {
        loop {
            let id = ControlId(self.next_id);
            self.next_id = self.next_id.wrapping_add(1);
            if !self.controls.iter().any(|e| e.id == id) {
                return id;
            }
        }
    }

    fn index_of(&self, id: ControlId) -> Result<usize, Error> {
        self.controls
            .iter()
            .position(|e| e.id == id)
            .ok_or(Error::InvalidArgument)
    }

    fn poll_touch(&mut self) {
        let mut points = [Point::zero(); MAX_TOUCH_POINTS];
        let count = self.touch.read(&mut points).min(MAX_TOUCH_POINTS);
        // Nothing to release and nothing pressed
        if count == 0 && self.dispatcher.captured().is_none() {
            return;
        }
        self.dispatcher.dispatch(&self.controls, &points[..count]);
    }

    /// Move damage recorded by the controls into the dirty set
    fn collect_damage(&mut self) -> Result<(), Error> {
        for entry in self.controls.iter() {
            // A control borrowed by the application keeps its damage for later
            if let Ok(mut control) = entry.control.try_borrow_mut() {
                collect(control.base_mut(), &mut self.dirty)?;
            }
        }
        Ok(())
    }

    /// Flush a parked chunk once the other buffer is free
    fn resume_deferred(&mut self) -> Result<bool, Error> {
        let Some(deferred) = self.deferred else {
            return Ok(false);
        };
        if self.signal.is_busy(self.buffers.other_index()) {
            return Ok(false);
        }
        self.deferred = None;
        trace!("resuming deferred flush of slot {}", deferred.slot);
        self.dispatch(deferred.slot, deferred.area, deferred.len);
        if let Some(cursor) = self.cursor {
            self.finish_chunk(cursor)?;
        } else {
            self.state = State::Idle;
        }
        Ok(true)
    }

    /// Render and flush one chunk
    fn step(&mut self) -> Result<State, Error> {
        let cursor = match self.cursor {
            Some(cursor) => cursor,
            None => {
                if self.pass.is_empty() {
                    if self.dirty.is_empty() {
                        self.state = State::Idle;
                        return Ok(State::Idle);
                    }
                    self.begin_pass()?;
                }
                self.state = State::Selecting;
                let cursor = self.select(0)?;
                self.cursor = Some(cursor);
                cursor
            }
        };
        self.state = State::Chunking;

        match self.config.mode {
            UpdateMode::Partial => self.step_partial(cursor),
            UpdateMode::Direct => self.step_direct(cursor),
        }
    }

    fn step_partial(&mut self, cursor: ChunkCursor) -> Result<State, Error> {
        let chunk = cursor.chunk();
        let slot = self.buffers.write_index();
        let len = self.render(slot, chunk, chunk)?;

        if self.buffers.is_double() && self.signal.is_busy(self.buffers.other_index()) {
            debug!("chunk deferred, slot {} still in flight", self.buffers.other_index());
            self.deferred = Some(DeferredFlush {
                slot,
                area: chunk,
                len,
            });
            self.state = State::AwaitingBuffer;
            return Ok(State::AwaitingBuffer);
        }

        self.dispatch(slot, chunk, len);
        self.finish_chunk(cursor)
    }

    /// Render a whole dirty region, flushing once per control intersection
    ///
    /// A region that shows background somewhere is flushed once as a whole.
    fn step_direct(&mut self, cursor: ChunkCursor) -> Result<State, Error> {
        let region = cursor.area;
        let mut areas: Vec<Rect, MAX_CONTROLS> = Vec::new();
        for entry in self.controls.iter() {
            let control = borrow(entry.control)?;
            if !control.visible() {
                continue;
            }
            let Some(overlap) = control.bounds().intersection(&region) else {
                continue;
            };
            let overlap = overlap
                .align_outward(self.config.h_align, self.config.v_align)
                .intersection(&region)
                .unwrap_or(overlap);
            if !areas.contains(&overlap) {
                areas.push(overlap).map_err(|_| Error::OutOfMemory)?;
            }
        }
        if !covers(region, &areas) {
            areas.clear();
            areas.push(region).map_err(|_| Error::OutOfMemory)?;
        }

        for area in areas {
            let len = self.render(0, area, area)?;
            self.dispatch(0, area, len);
        }
        self.finish_chunk(cursor)
    }

    /// Snapshot the dirty set for a new pass
    ///
    /// Fails with [`Error::InvalidState`] while a control from the previous
    /// pass is still owed its `on_after_paint`.
    fn begin_pass(&mut self) -> Result<(), Error> {
        if !self.after_paint() {
            return Err(Error::InvalidState);
        }
        mem::swap(&mut self.pass, &mut self.dirty);
        debug!(
            "render pass: {} region(s), {} px",
            self.pass.len(),
            self.pass.area()
        );
        Ok(())
    }

    /// Prepare the cursor for a dirty region of the current pass
    fn select(&self, region: usize) -> Result<ChunkCursor, Error> {
        let dirty = self.pass.regions()[region];
        let area = dirty
            .align_outward(self.config.h_align, self.config.v_align)
            .intersection(&self.bounds)
            .unwrap_or(dirty);

        let lines = match self.config.mode {
            UpdateMode::Partial => {
                let stride = self.config.format.stride(area.width());
                let v_align = self.config.v_align as usize;
                let lines = self.buffers.capacity() / stride;
                let lines = lines - lines % v_align;
                if lines == 0 {
                    return Err(Error::OutOfMemory);
                }
                (lines as u32).min(area.height())
            }
            UpdateMode::Direct => area.height(),
        };

        Ok(ChunkCursor {
            region,
            area,
            line: 0,
            lines,
        })
    }

    /// Paint `area` into the buffer in `slot`, which represents `target`
    ///
    /// Both rectangles are in screen coordinates. Returns the number of
    /// buffer bytes covering `target`.
    fn render(&mut self, slot: usize, target: Rect, area: Rect) -> Result<usize, Error> {
        let format = self.config.format;
        let width = target.width() as u16;
        let height = target.height() as u16;
        let len = format.buffer_len(width as u32, height as u32);
        let (origin_x, origin_y) = (target.x1() as i32, target.y1() as i32);

        let buffer = self.buffers.get_mut(slot);
        let mut surface = Surface::new(&mut buffer[..len], width, height, format)?
            .with_palette(self.palette);
        let mut chunk = surface.view(0, 0, area.offset(-origin_x, -origin_y));
        chunk.clear(self.config.background);

        for entry in self.controls.iter_mut() {
            let mut control = borrow(entry.control)?;
            if !control.visible() {
                continue;
            }
            let bounds = control.bounds();
            let Some(overlap) = bounds.intersection(&area) else {
                continue;
            };
            if !entry.touched {
                control.on_before_paint();
                entry.touched = true;
            }

            let (x, y) = (bounds.x1() as i32, bounds.y1() as i32);
            let clip = overlap.offset(-x, -y);
            let mut view = chunk.view(x - origin_x, y - origin_y, clip);
            control.on_paint(&mut view, clip);
        }

        Ok(len)
    }

    /// Hand a rendered buffer to the flush target
    fn dispatch(&mut self, slot: usize, area: Rect, len: usize) {
        trace!(
            "flush slot {}: ({}, {})-({}, {}), {} bytes",
            slot,
            area.x1(),
            area.y1(),
            area.x2(),
            area.y2(),
            len
        );
        self.signal.begin(slot);
        self.flush.flush(area, &self.buffers.get(slot)[..len]);

        if self.config.mode == UpdateMode::Partial && self.buffers.is_double() {
            self.buffers.swap();
        } else {
            while self.signal.is_busy(slot) {
                self.flush.wait();
            }
        }
    }

    /// Advance past a flushed chunk
    fn finish_chunk(&mut self, cursor: ChunkCursor) -> Result<State, Error> {
        if let Some(next) = cursor.advance() {
            self.cursor = Some(next);
            self.state = State::Chunking;
            return Ok(State::Chunking);
        }

        let region = cursor.region + 1;
        if region < self.pass.len() {
            self.cursor = Some(self.select(region)?);
            self.state = State::Selecting;
            return Ok(State::Selecting);
        }

        self.finish_pass();
        Ok(self.state)
    }

    /// Call `on_after_paint` on every control painted in the last pass
    ///
    /// A control borrowed elsewhere keeps its mark and is retried on the
    /// next update. Returns whether every call was made.
    fn after_paint(&mut self) -> bool {
        let mut done = true;
        for entry in self.controls.iter_mut().filter(|e| e.touched) {
            match entry.control.try_borrow_mut() {
                Ok(mut control) => {
                    entry.touched = false;
                    control.on_after_paint();
                }
                Err(_) => {
                    warn!("control {} busy, on_after_paint postponed", entry.id.raw());
                    done = false;
                }
            }
        }
        done
    }

    fn finish_pass(&mut self) {
        self.after_paint();
        self.pass.validate_all();
        self.cursor = None;
        self.state = if self.dirty.is_empty() {
            State::Idle
        } else {
            State::Selecting
        };
        debug!("render pass finished");
    }
}

fn borrow<'c, 'd>(
    control: &'c RefCell<dyn Control + 'd>,
) -> Result<RefMut<'c, dyn Control + 'd>, Error> {
    control.try_borrow_mut().map_err(|_| Error::InvalidState)
}

/// Check that every pixel of `region` lies in one of `areas`
fn covers(region: Rect, areas: &[Rect]) -> bool {
    (region.y1()..=region.y2()).all(|y| {
        let mut x = region.x1();
        loop {
            let reach = areas
                .iter()
                .filter(|a| a.contains_point(Point::new(x, y)))
                .map(|a| a.x2())
                .max();
            match reach {
                None => return false,
                Some(x2) if x2 >= region.x2() => return true,
                Some(x2) => x = x2 + 1,
            }
        }
    })
}

/// Move a control's pending damage into `dirty`
///
/// Damage that does not fit stays with the control.
fn collect(base: &mut ControlBase, dirty: &mut DirtyRegions) -> Result<(), Error> {
    while let Some(rect) = base.peek_damage() {
        dirty.invalidate(rect)?;
        base.pop_damage();
    }
    Ok(())
}
