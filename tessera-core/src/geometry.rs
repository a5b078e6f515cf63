//! Screen geometry
//!
//! Points and rectangles in signed 16-bit screen coordinates. Rectangles use
//! inclusive corners, so a rectangle always covers at least one pixel and
//! "empty" results are expressed as `Option<Rect>`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point in screen or control-local space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

impl Point {
    /// Create a new point
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    /// The origin
    pub const fn zero() -> Self {
        Self { x: 0, y: 0 }
    }

    /// Move the point by the given deltas, saturating at the coordinate range
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: clamp_coord(self.x as i32 + dx),
            y: clamp_coord(self.y as i32 + dy),
        }
    }
}

/// Axis-aligned rectangle with inclusive corners
///
/// Invariant: `x1 <= x2` and `y1 <= y2`. Constructors normalize swapped
/// corners so the invariant always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    x1: i16,
    y1: i16,
    x2: i16,
    y2: i16,
}

impl Rect {
    /// Create a rectangle from two corners (inclusive)
    pub const fn new(x1: i16, y1: i16, x2: i16, y2: i16) -> Self {
        let (x1, x2) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let (y1, y2) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        Self { x1, y1, x2, y2 }
    }

    /// Create a rectangle from its top-left corner and size
    ///
    /// Returns `None` for a zero-sized rectangle.
    pub fn from_xywh(x: i16, y: i16, width: u16, height: u16) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            x1: x,
            y1: y,
            x2: clamp_coord(x as i32 + width as i32 - 1),
            y2: clamp_coord(y as i32 + height as i32 - 1),
        })
    }

    /// Rectangle anchored at the origin with the given size
    pub fn from_size(width: u16, height: u16) -> Option<Self> {
        Self::from_xywh(0, 0, width, height)
    }

    pub const fn x1(&self) -> i16 {
        self.x1
    }

    pub const fn y1(&self) -> i16 {
        self.y1
    }

    pub const fn x2(&self) -> i16 {
        self.x2
    }

    pub const fn y2(&self) -> i16 {
        self.y2
    }

    /// Top-left corner
    pub const fn top_left(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    /// Bottom-right corner (inclusive)
    pub const fn bottom_right(&self) -> Point {
        Point::new(self.x2, self.y2)
    }

    /// Width in pixels
    pub const fn width(&self) -> u32 {
        (self.x2 as i32 - self.x1 as i32 + 1) as u32
    }

    /// Height in pixels
    pub const fn height(&self) -> u32 {
        (self.y2 as i32 - self.y1 as i32 + 1) as u32
    }

    /// Number of pixels covered
    pub const fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Check whether the point lies inside the rectangle
    pub const fn contains_point(&self, point: Point) -> bool {
        point.x >= self.x1 && point.x <= self.x2 && point.y >= self.y1 && point.y <= self.y2
    }

    /// Check whether `other` lies entirely inside this rectangle
    pub const fn contains(&self, other: &Rect) -> bool {
        other.x1 >= self.x1 && other.x2 <= self.x2 && other.y1 >= self.y1 && other.y2 <= self.y2
    }

    /// Check whether the two rectangles share at least one pixel
    pub const fn intersects(&self, other: &Rect) -> bool {
        self.x1 <= other.x2 && other.x1 <= self.x2 && self.y1 <= other.y2 && other.y1 <= self.y2
    }

    /// Overlapping area of the two rectangles, if any
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        Some(Rect {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        })
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    /// Move the rectangle, saturating at the coordinate range
    pub fn offset(&self, dx: i32, dy: i32) -> Rect {
        Rect {
            x1: clamp_coord(self.x1 as i32 + dx),
            y1: clamp_coord(self.y1 as i32 + dy),
            x2: clamp_coord(self.x2 as i32 + dx),
            y2: clamp_coord(self.y2 as i32 + dy),
        }
    }

    /// Grow the rectangle outward to multiples of the given granularity
    ///
    /// The left/top edges round down and the right/bottom edges round up, so
    /// the result always contains the original. A granularity of 0 or 1 is a
    /// no-op on that axis.
    pub fn align_outward(&self, h: u16, v: u16) -> Rect {
        let (x1, x2) = align_span(self.x1, self.x2, h);
        let (y1, y2) = align_span(self.y1, self.y2, v);
        Rect { x1, y1, x2, y2 }
    }
}

impl From<Rect> for embedded_graphics::primitives::Rectangle {
    fn from(rect: Rect) -> Self {
        embedded_graphics::primitives::Rectangle::new(
            embedded_graphics::geometry::Point::new(rect.x1 as i32, rect.y1 as i32),
            embedded_graphics::geometry::Size::new(rect.width(), rect.height()),
        )
    }
}

impl From<Point> for embedded_graphics::geometry::Point {
    fn from(point: Point) -> Self {
        embedded_graphics::geometry::Point::new(point.x as i32, point.y as i32)
    }
}

fn align_span(start: i16, end: i16, granularity: u16) -> (i16, i16) {
    if granularity <= 1 {
        return (start, end);
    }
    let g = granularity as i32;
    let aligned_start = (start as i32).div_euclid(g) * g;
    let aligned_end = ((end as i32 + 1) + g - 1).div_euclid(g) * g - 1;
    (clamp_coord(aligned_start), clamp_coord(aligned_end))
}

pub(crate) fn clamp_coord(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}
