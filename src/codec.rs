//! # Pixel Codec
//!
//! Converts a finished canvas into the frame format the panel expects:
//! pixels in row-major order (top-to-bottom, left-to-right), three bytes per
//! pixel in R, G, B order, no alpha and no padding, then standard base64.
//!
//! A 64×64 frame is always 12 288 raw bytes and 16 384 base64 characters.

use crate::canvas::{Canvas, CANVAS_HEIGHT, CANVAS_WIDTH};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use embedded_graphics::prelude::RgbColor;

/// Raw frame size in bytes.
pub const FRAME_BYTES: usize = (CANVAS_WIDTH * CANVAS_HEIGHT * 3) as usize;

/// A base64-encoded frame, ready to embed in a draw command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPayload(String);

impl RenderedPayload {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Flatten a canvas into RGB bytes.
///
/// # Panics
/// If the canvas is not exactly the panel's resolution. Only the render
/// engine produces canvases, so a mismatch is a bug, not bad input.
pub fn raw_bytes(canvas: &Canvas) -> Vec<u8> {
    assert!(
        canvas.width() == CANVAS_WIDTH && canvas.height() == CANVAS_HEIGHT,
        "panel frames must be {}x{}, got {}x{}",
        CANVAS_WIDTH,
        CANVAS_HEIGHT,
        canvas.width(),
        canvas.height()
    );

    let mut bytes = Vec::with_capacity(FRAME_BYTES);
    for pixel in canvas.pixels() {
        bytes.extend_from_slice(&[pixel.r(), pixel.g(), pixel.b()]);
    }
    bytes
}

/// Encode a finished canvas for the device. Takes ownership: the canvas is
/// not drawn on after this point.
///
/// # Example
/// ```
/// use embedded_graphics::{pixelcolor::Rgb888, prelude::*};
/// use tube_countdown_lib::{canvas::Canvas, codec};
///
/// let payload = codec::encode(Canvas::panel(Rgb888::BLACK));
/// assert_eq!(payload.as_str().len(), 16_384);
/// ```
pub fn encode(canvas: Canvas) -> RenderedPayload {
    RenderedPayload(STANDARD.encode(raw_bytes(&canvas)))
}
