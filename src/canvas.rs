//! RGB frame buffer for the 64×64 panel.
//!
//! The canvas is owned by one render call while it is drawn, then moved into
//! the pixel codec. It implements the `embedded-graphics` [`DrawTarget`] trait
//! so glyphs and icons are composited as plain pixel iterators.

use core::convert::Infallible;
use embedded_graphics::{pixelcolor::Rgb888, prelude::*};

/// Panel dimensions
pub const CANVAS_WIDTH: u32 = 64;
pub const CANVAS_HEIGHT: u32 = 64;

/// Row-major RGB pixel buffer, origin top-left.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgb888>,
}

impl Canvas {
    /// A canvas of arbitrary size filled with `background`.
    pub fn new(width: u32, height: u32, background: Rgb888) -> Self {
        Self {
            width,
            height,
            pixels: vec![background; (width * height) as usize],
        }
    }

    /// A canvas at the panel's resolution.
    pub fn panel(background: Rgb888) -> Self {
        Self::new(CANVAS_WIDTH, CANVAS_HEIGHT, background)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Set one pixel. Coordinates outside the canvas are clipped.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgb888) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        let index = (y as u32 * self.width + x as u32) as usize;
        self.pixels[index] = color;
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb888> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    /// All pixels, top-to-bottom then left-to-right.
    pub fn pixels(&self) -> &[Rgb888] {
        &self.pixels
    }

    /// One row of pixels, or `None` below the last row.
    pub fn row(&self, y: u32) -> Option<&[Rgb888]> {
        if y >= self.height {
            return None;
        }
        let start = (y * self.width) as usize;
        self.pixels.get(start..start + self.width as usize)
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.pixels.fill(color);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_canvas_is_filled() {
        let canvas = Canvas::panel(Rgb888::new(20, 20, 20));
        assert_eq!(canvas.pixels().len(), 64 * 64);
        assert!(canvas.pixels().iter().all(|&p| p == Rgb888::new(20, 20, 20)));
    }

    #[test]
    fn test_set_pixel_clips_out_of_bounds() {
        let mut canvas = Canvas::panel(Rgb888::BLACK);
        canvas.set_pixel(-1, 0, Rgb888::WHITE);
        canvas.set_pixel(0, 64, Rgb888::WHITE);
        canvas.set_pixel(64, 3, Rgb888::WHITE);
        assert!(canvas.pixels().iter().all(|&p| p == Rgb888::BLACK));

        canvas.set_pixel(63, 63, Rgb888::WHITE);
        assert_eq!(canvas.pixel(63, 63), Some(Rgb888::WHITE));
        assert_eq!(canvas.pixel(64, 0), None);
    }

    #[test]
    fn test_draw_target_clear_and_draw() {
        let mut canvas = Canvas::panel(Rgb888::BLACK);
        canvas.clear(Rgb888::RED).ok();
        Pixel(Point::new(2, 1), Rgb888::GREEN).draw(&mut canvas).ok();

        assert_eq!(canvas.pixel(0, 0), Some(Rgb888::RED));
        assert_eq!(canvas.pixel(2, 1), Some(Rgb888::GREEN));
        assert_eq!(canvas.row(1).unwrap()[2], Rgb888::GREEN);
    }

    #[test]
    fn test_row_out_of_range_is_none() {
        let canvas = Canvas::new(4, 2, Rgb888::BLACK);
        assert_eq!(canvas.row(1).map(<[Rgb888]>::len), Some(4));
        assert_eq!(canvas.row(2), None);
        assert_eq!(canvas.row(u32::MAX / 4), None);
    }
}
