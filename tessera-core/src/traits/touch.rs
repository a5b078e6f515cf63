//! Touch input boundary

use crate::geometry::Point;

/// Maximum number of simultaneous touch points delivered to controls
pub const MAX_TOUCH_POINTS: usize = 2;

/// Source of touch reports in screen coordinates
pub trait TouchSource {
    /// Fill `points` with the currently pressed points
    ///
    /// Returns how many entries were written; 0 means nothing is pressed.
    fn read(&mut self, points: &mut [Point]) -> usize;
}

impl<T: TouchSource + ?Sized> TouchSource for &mut T {
    fn read(&mut self, points: &mut [Point]) -> usize {
        (**self).read(points)
    }
}

/// Touch source for screens without touch input
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTouch;

impl TouchSource for NoTouch {
    fn read(&mut self, _points: &mut [Point]) -> usize {
        0
    }
}

/// Adapter turning a closure into a [`TouchSource`]
pub struct TouchFn<F>(pub F);

impl<F> TouchSource for TouchFn<F>
where
    F: FnMut(&mut [Point]) -> usize,
{
    fn read(&mut self, points: &mut [Point]) -> usize {
        (self.0)(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_touch_reports_nothing() {
        let mut points = [Point::new(1, 1); MAX_TOUCH_POINTS];
        assert_eq!(NoTouch.read(&mut points), 0);
    }

    #[test]
    fn test_closure_source() {
        let mut source = TouchFn(|points: &mut [Point]| -> usize {
            points[0] = Point::new(3, 4);
            1
        });
        let mut points = [Point::zero(); MAX_TOUCH_POINTS];
        assert_eq!((&mut source).read(&mut points), 1);
        assert_eq!(points[0], Point::new(3, 4));
    }
}
