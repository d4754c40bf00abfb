//! # Terminal Preview
//!
//! Renders a finished canvas as ASCII art so a frame can be checked without
//! a panel on the network. Background pixels print as spaces and anything
//! else as `#`, one text line per pixel row.

use crate::canvas::Canvas;
use embedded_graphics::pixelcolor::Rgb888;

/// ASCII art for `canvas`, treating `background` as blank.
pub fn render_ascii(canvas: &Canvas, background: Rgb888) -> String {
    let mut out = String::with_capacity(((canvas.width() + 1) * canvas.height()) as usize);
    for y in 0..canvas.height() {
        let line: String = canvas
            .row(y)
            .unwrap_or_default()
            .iter()
            .map(|&p| if p == background { ' ' } else { '#' })
            .collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Print a framed preview to stdout.
pub fn draw_ascii(canvas: &Canvas, background: Rgb888) {
    let border = "-".repeat(canvas.width() as usize);
    println!("+{border}+");
    for line in render_ascii(canvas, background).lines() {
        println!("|{:<width$}|", line, width = canvas.width() as usize);
    }
    println!("+{border}+");
}
