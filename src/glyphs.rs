//! # Glyph Atlas
//!
//! A closed, fixed-height pixel font and the handful of icons the board
//! draws. Text is upper-cased before lookup; the atlas defines letters,
//! digits, space and a few punctuation marks.
//!
//! ## Metrics
//!
//! - Every glyph is [`GLYPH_HEIGHT`] pixels tall; widths vary from 1 to 5
//! - One pixel of spacing between characters, none after the last one,
//!   so `width(text) = Σ glyph widths + (N − 1)`
//!
//! ## Unknown Characters
//!
//! A character outside the atlas is a hard [`RenderError::UnrenderableGlyph`].
//! Nothing is drawn for that call: every glyph is resolved before the first
//! pixel is written.

use crate::canvas::Canvas;
use embedded_graphics::{pixelcolor::Rgb888, prelude::*};
use thiserror::Error;

/// Height of every text glyph in pixels.
pub const GLYPH_HEIGHT: i32 = 5;

/// Horizontal gap between adjacent glyphs.
pub const GLYPH_SPACING: i32 = 1;

/// Errors raised while laying out text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The text contains a character the atlas does not define
    #[error("no glyph for {ch:?} in {text:?}")]
    UnrenderableGlyph { ch: char, text: String },
}

/// One monochrome glyph. Bit `width - 1` of each row is the leftmost pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub width: u8,
    pub rows: [u8; GLYPH_HEIGHT as usize],
}

impl Glyph {
    const fn new(width: u8, rows: [u8; GLYPH_HEIGHT as usize]) -> Self {
        Self { width, rows }
    }

    /// True when the pixel at (`x`, `y`) inside the glyph is lit.
    pub fn is_set(&self, x: u8, y: usize) -> bool {
        x < self.width && (self.rows[y] >> (self.width - 1 - x)) & 1 == 1
    }

    /// Lit pixels as offsets from the glyph's top-left corner.
    fn lit(&self) -> impl Iterator<Item = Point> + '_ {
        (0..GLYPH_HEIGHT as usize).flat_map(move |y| {
            (0..self.width)
                .filter(move |&x| self.is_set(x, y))
                .map(move |x| Point::new(x as i32, y as i32))
        })
    }
}

/// Look up the glyph for an (already upper-cased) character.
pub fn glyph(ch: char) -> Option<&'static Glyph> {
    FONT.iter().find(|(c, _)| *c == ch).map(|(_, g)| g)
}

/// Resolve every character of `text`, upper-casing first.
fn resolve(text: &str) -> Result<Vec<&'static Glyph>, RenderError> {
    text.chars()
        .flat_map(char::to_uppercase)
        .map(|ch| {
            glyph(ch).ok_or_else(|| RenderError::UnrenderableGlyph {
                ch,
                text: text.to_string(),
            })
        })
        .collect()
}

/// Rendered width of `text` in pixels.
///
/// # Example
/// ```
/// use tube_countdown_lib::glyphs::text_width;
///
/// // "A" is 3 wide, "I" is 1 wide, plus one gap
/// assert_eq!(text_width("ai").unwrap(), 5);
/// assert_eq!(text_width("").unwrap(), 0);
/// ```
pub fn text_width(text: &str) -> Result<i32, RenderError> {
    Ok(advance(&resolve(text)?))
}

fn advance(glyphs: &[&Glyph]) -> i32 {
    let widths: i32 = glyphs.iter().map(|g| g.width as i32).sum();
    let gaps = (glyphs.len() as i32 - 1).max(0) * GLYPH_SPACING;
    widths + gaps
}

/// Draw `text` with its top-left corner at `origin`. Returns the drawn width.
pub fn draw_text(
    canvas: &mut Canvas,
    origin: Point,
    text: &str,
    color: Rgb888,
) -> Result<i32, RenderError> {
    let glyphs = resolve(text)?;

    let mut cursor = origin;
    for g in &glyphs {
        let pixels = g.lit().map(|offset| Pixel(cursor + offset, color));
        canvas.draw_iter(pixels).ok();
        cursor.x += g.width as i32 + GLYPH_SPACING;
    }

    Ok(advance(&glyphs))
}

/// A small multi-colour bitmap. Each row is a string of palette characters;
/// `.` is transparent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Icon {
    pub rows: &'static [&'static str],
}

impl Icon {
    pub fn width(&self) -> i32 {
        self.rows.first().map_or(0, |row| row.len() as i32)
    }

    pub fn height(&self) -> i32 {
        self.rows.len() as i32
    }

    /// Composite the icon's opaque pixels at `origin`.
    pub fn draw(&self, canvas: &mut Canvas, origin: Point) {
        let pixels = self.rows.iter().enumerate().flat_map(move |(y, row)| {
            row.chars().enumerate().filter_map(move |(x, code)| {
                palette(code).map(|color| Pixel(origin + Point::new(x as i32, y as i32), color))
            })
        });
        canvas.draw_iter(pixels).ok();
    }
}

fn palette(code: char) -> Option<Rgb888> {
    match code {
        'R' => Some(Rgb888::new(220, 36, 31)),
        'B' => Some(Rgb888::new(0, 25, 168)),
        'O' => Some(Rgb888::new(238, 118, 35)),
        'W' => Some(Rgb888::new(255, 255, 255)),
        'Y' => Some(Rgb888::new(255, 211, 0)),
        'G' => Some(Rgb888::new(150, 150, 150)),
        _ => None,
    }
}

/// Underground roundel for the header.
pub const UNDERGROUND_ROUNDEL: Icon = Icon {
    rows: &[
        "..RRRRR..",
        ".R.....R.",
        "R.......R",
        "BBBBBBBBB",
        "R.......R",
        ".R.....R.",
        "..RRRRR..",
    ],
};

/// Surface-rail roundel for the header.
pub const SURFACE_ROUNDEL: Icon = Icon {
    rows: &[
        "..OOOOO..",
        ".O.....O.",
        "O.......O",
        "BBBBBBBBB",
        "O.......O",
        ".O.....O.",
        "..OOOOO..",
    ],
};

/// Badge for services running via Charing Cross.
pub const CROSS_BADGE: Icon = Icon {
    rows: &[".W.", "WWW", ".W."],
};

/// Badge for services running via Bank.
pub const COIN_BADGE: Icon = Icon {
    rows: &[".Y.", "Y.Y", ".Y."],
};

/// Shown above the "service closed" message.
pub const NO_SERVICE: Icon = Icon {
    rows: &[
        ".GGGGGGGGGGG.",
        "GG.........GG",
        "G.WWW...WWW.G",
        "G.WWW...WWW.G",
        "G...........G",
        "GGGGGGGGGGGGG",
        ".G.........G.",
    ],
};

const FONT: &[(char, Glyph)] = &[
    (' ', Glyph::new(2, [0b00, 0b00, 0b00, 0b00, 0b00])),
    ('.', Glyph::new(1, [0, 0, 0, 0, 1])),
    ('\'', Glyph::new(1, [1, 1, 0, 0, 0])),
    ('-', Glyph::new(3, [0b000, 0b000, 0b111, 0b000, 0b000])),
    ('0', Glyph::new(3, [0b111, 0b101, 0b101, 0b101, 0b111])),
    ('1', Glyph::new(3, [0b010, 0b110, 0b010, 0b010, 0b111])),
    ('2', Glyph::new(3, [0b110, 0b001, 0b010, 0b100, 0b111])),
    ('3', Glyph::new(3, [0b110, 0b001, 0b010, 0b001, 0b110])),
    ('4', Glyph::new(3, [0b101, 0b101, 0b111, 0b001, 0b001])),
    ('5', Glyph::new(3, [0b111, 0b100, 0b110, 0b001, 0b110])),
    ('6', Glyph::new(3, [0b011, 0b100, 0b111, 0b101, 0b111])),
    ('7', Glyph::new(3, [0b111, 0b001, 0b010, 0b010, 0b010])),
    ('8', Glyph::new(3, [0b111, 0b101, 0b111, 0b101, 0b111])),
    ('9', Glyph::new(3, [0b111, 0b101, 0b111, 0b001, 0b110])),
    ('A', Glyph::new(3, [0b010, 0b101, 0b111, 0b101, 0b101])),
    ('B', Glyph::new(3, [0b110, 0b101, 0b110, 0b101, 0b110])),
    ('C', Glyph::new(3, [0b011, 0b100, 0b100, 0b100, 0b011])),
    ('D', Glyph::new(3, [0b110, 0b101, 0b101, 0b101, 0b110])),
    ('E', Glyph::new(3, [0b111, 0b100, 0b110, 0b100, 0b111])),
    ('F', Glyph::new(3, [0b111, 0b100, 0b110, 0b100, 0b100])),
    ('G', Glyph::new(3, [0b011, 0b100, 0b101, 0b101, 0b011])),
    ('H', Glyph::new(3, [0b101, 0b101, 0b111, 0b101, 0b101])),
    ('I', Glyph::new(1, [1, 1, 1, 1, 1])),
    ('J', Glyph::new(3, [0b001, 0b001, 0b001, 0b101, 0b010])),
    ('K', Glyph::new(3, [0b101, 0b101, 0b110, 0b101, 0b101])),
    ('L', Glyph::new(3, [0b100, 0b100, 0b100, 0b100, 0b111])),
    ('M', Glyph::new(5, [0b10001, 0b11011, 0b10101, 0b10001, 0b10001])),
    ('N', Glyph::new(4, [0b1001, 0b1101, 0b1011, 0b1001, 0b1001])),
    ('O', Glyph::new(3, [0b010, 0b101, 0b101, 0b101, 0b010])),
    ('P', Glyph::new(3, [0b110, 0b101, 0b110, 0b100, 0b100])),
    ('Q', Glyph::new(4, [0b0110, 0b1001, 0b1001, 0b1010, 0b0101])),
    ('R', Glyph::new(3, [0b110, 0b101, 0b110, 0b101, 0b101])),
    ('S', Glyph::new(3, [0b011, 0b100, 0b010, 0b001, 0b110])),
    ('T', Glyph::new(3, [0b111, 0b010, 0b010, 0b010, 0b010])),
    ('U', Glyph::new(3, [0b101, 0b101, 0b101, 0b101, 0b111])),
    ('V', Glyph::new(3, [0b101, 0b101, 0b101, 0b101, 0b010])),
    ('W', Glyph::new(5, [0b10001, 0b10001, 0b10101, 0b11011, 0b10001])),
    ('X', Glyph::new(3, [0b101, 0b101, 0b010, 0b101, 0b101])),
    ('Y', Glyph::new(3, [0b101, 0b101, 0b010, 0b010, 0b010])),
    ('Z', Glyph::new(3, [0b111, 0b001, 0b010, 0b100, 0b111])),
];
