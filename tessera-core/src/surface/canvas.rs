//! `embedded-graphics` adapter
//!
//! Lets widget code draw into a [`Surface`] with any `embedded-graphics`
//! color type whose raw bit depth matches the surface format.

use core::convert::Infallible;
use core::marker::PhantomData;

use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::{Dimensions, Point as EgPoint};
use embedded_graphics::pixelcolor::raw::RawData;
use embedded_graphics::pixelcolor::{IntoStorage, PixelColor};
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::Pixel;

use super::Surface;
use crate::error::Error;
use crate::geometry::{Point, Rect};

/// Typed `DrawTarget` over a surface view
pub struct Canvas<'s, 'b, C> {
    surface: &'s mut Surface<'b>,
    _color: PhantomData<C>,
}

impl<'s, 'b, C> Canvas<'s, 'b, C>
where
    C: PixelColor + IntoStorage,
    <C as IntoStorage>::Storage: Into<u32>,
{
    /// Wrap a surface
    ///
    /// Fails with [`Error::InvalidFormat`] if `C` does not have the surface's
    /// bit depth.
    pub fn new(surface: &'s mut Surface<'b>) -> Result<Self, Error> {
        if <C::Raw as RawData>::BITS_PER_PIXEL != surface.format().bits_per_pixel() as usize {
            return Err(Error::InvalidFormat);
        }
        Ok(Self {
            surface,
            _color: PhantomData,
        })
    }

    /// Access the wrapped surface
    pub fn surface(&mut self) -> &mut Surface<'b> {
        self.surface
    }
}

impl<C> Dimensions for Canvas<'_, '_, C> {
    fn bounding_box(&self) -> Rectangle {
        self.surface
            .bounds()
            .map(Rectangle::from)
            .unwrap_or_else(Rectangle::zero)
    }
}

impl<C> DrawTarget for Canvas<'_, '_, C>
where
    C: PixelColor + IntoStorage,
    <C as IntoStorage>::Storage: Into<u32>,
{
    type Color = C;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some(point) = to_local(point) {
                self.surface.set_pixel(point, color.into_storage().into());
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        if let Some(rect) = to_rect(area) {
            self.surface.fill_rect(rect, color.into_storage().into());
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.surface.clear(color.into_storage().into());
        Ok(())
    }
}

fn to_local(point: EgPoint) -> Option<Point> {
    Some(Point::new(
        i16::try_from(point.x).ok()?,
        i16::try_from(point.y).ok()?,
    ))
}

fn to_rect(area: &Rectangle) -> Option<Rect> {
    let width = u16::try_from(area.size.width).ok()?;
    let height = u16::try_from(area.size.height).ok()?;
    let origin = to_local(area.top_left)?;
    Rect::from_xywh(origin.x, origin.y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::surface::PixelFormat;
    use embedded_graphics::pixelcolor::{BinaryColor, Rgb565};
    use embedded_graphics::prelude::*;
    use embedded_graphics::primitives::{Line, PrimitiveStyle};

    #[test]
    fn test_rejects_mismatched_depth() {
        let mut buf = [0u8; 8];
        let mut surface = Surface::new(&mut buf, 2, 2, PixelFormat::Rgb565).unwrap();
        assert!(Canvas::<BinaryColor>::new(&mut surface).is_err());
        assert!(Canvas::<Rgb565>::new(&mut surface).is_ok());
    }

    #[test]
    fn test_draws_primitives_into_view() {
        let mut buf = [0u8; 4 * 4 * 2];
        let mut surface = Surface::new(&mut buf, 4, 4, PixelFormat::Rgb565).unwrap();
        let mut view = surface.view(1, 1, Rect::new(0, 0, 2, 2));
        let mut canvas = Canvas::<Rgb565>::new(&mut view).unwrap();

        assert_eq!(
            canvas.bounding_box(),
            Rectangle::new(EgPoint::new(0, 0), Size::new(3, 3))
        );

        Rectangle::new(EgPoint::new(0, 0), Size::new(10, 10))
            .into_styled(PrimitiveStyle::with_fill(Rgb565::BLUE))
            .draw(&mut canvas)
            .unwrap();
        Line::new(EgPoint::new(0, 0), EgPoint::new(2, 0))
            .into_styled(PrimitiveStyle::with_stroke(Rgb565::RED, 1))
            .draw(&mut canvas)
            .unwrap();

        let red = Rgb565::RED.into_storage() as u32;
        let blue = Rgb565::BLUE.into_storage() as u32;
        assert_eq!(view.pixel(Point::new(1, 0)), Some(red));
        assert_eq!(view.pixel(Point::new(2, 2)), Some(blue));
        drop(view);
        // Outside the view nothing was touched
        assert_eq!(surface.pixel(Point::new(0, 0)), Some(0));
        assert_eq!(surface.pixel(Point::new(0, 3)), Some(0));
        assert_eq!(surface.pixel(Point::new(3, 0)), Some(0));
        assert_eq!(surface.pixel(Point::new(1, 1)), Some(red));
    }
}
