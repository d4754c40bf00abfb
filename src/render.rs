//! # Render Engine
//!
//! Lays out one arrivals frame on the 64×64 canvas in a single pass.
//!
//! ## Layout
//!
//! ```text
//!  y=1   [roundel] HEADER          header, centred as one group
//!  y=11  EUSTON .            2     label at x=1, badge, minutes flush right
//!  y=17  MORDEN             11
//!  ...   one row every 6 px
//!  y=53  last row that fits
//! ```
//!
//! - Header: roundel (9×7) at y=1, text at y=2, 2 px between them
//! - Rows start 3 px below the 8 px header and advance by glyph height + 1
//! - After each row the cursor moves down; iteration stops once another
//!   full row would reach the bottom edge. Extra arrivals are dropped.
//! - With no rows at all the frame shows the "service closed" fallback
//!
//! The output depends only on the arguments and the shared registry.

use crate::canvas::{Canvas, CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::glyphs::{
    self, Icon, RenderError, COIN_BADGE, CROSS_BADGE, GLYPH_HEIGHT, NO_SERVICE, SURFACE_ROUNDEL,
    UNDERGROUND_ROUNDEL,
};
use crate::stations::StationRegistry;
use crate::ArrivalRecord;
use embedded_graphics::{pixelcolor::Rgb888, prelude::*};
use std::sync::Arc;
use tracing::{debug, warn};

/// Top edge of the header icon.
pub const HEADER_TOP: i32 = 1;
/// Header icon height plus its top margin.
pub const HEADER_HEIGHT: i32 = HEADER_TOP + 7;
/// Space between the header and the first row.
pub const HEADER_GAP: i32 = 3;
/// Gap between the header icon and the header text.
const HEADER_ICON_GAP: i32 = 2;
/// Glyph height plus one pixel of leading.
pub const ROW_HEIGHT: i32 = GLYPH_HEIGHT + 1;
/// Left edge of destination labels.
const LABEL_X: i32 = 1;
/// Right margin for the minutes column.
const RIGHT_MARGIN: i32 = 1;
/// Characters of `destination_name` used when the destination is unknown.
const FALLBACK_LABEL_LEN: usize = 3;

/// Substring of `towards` → badge drawn after the label. First match wins.
const INTERCHANGE_BADGES: &[(&str, Icon)] = &[("via CX", CROSS_BADGE), ("via Bank", COIN_BADGE)];

const NO_SERVICE_LINES: [&str; 2] = ["Service", "closed"];

/// Colours used for every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub text: Rgb888,
    pub background: Rgb888,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            text: Rgb888::new(255, 211, 0),
            background: Rgb888::new(20, 20, 20),
        }
    }
}

/// Top edge of every arrival row that fits on the panel, in drawing order.
///
/// # Example
/// ```
/// use tube_countdown_lib::render::row_slots;
///
/// assert_eq!(row_slots().len(), 8);
/// assert_eq!(row_slots()[0], 11);
/// ```
pub fn row_slots() -> Vec<i32> {
    let mut slots = Vec::new();
    let mut y = HEADER_HEIGHT + HEADER_GAP;
    loop {
        slots.push(y);
        y += ROW_HEIGHT;
        if y + ROW_HEIGHT >= CANVAS_HEIGHT as i32 {
            break;
        }
    }
    slots
}

/// Badge for a `towards` description, if it names an interchange.
pub fn interchange_badge(towards: &str) -> Option<Icon> {
    INTERCHANGE_BADGES
        .iter()
        .find(|(marker, _)| towards.contains(marker))
        .map(|(_, icon)| *icon)
}

/// Renders arrivals frames.
#[derive(Debug, Clone)]
pub struct Renderer {
    registry: Arc<StationRegistry>,
    theme: Theme,
}

impl Renderer {
    pub fn new(registry: Arc<StationRegistry>, theme: Theme) -> Self {
        Self { registry, theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Render one frame.
    ///
    /// `arrivals` must already be normalized (filtered and sorted).
    ///
    /// # Errors
    /// [`RenderError::UnrenderableGlyph`] if the header or any visible label
    /// contains a character outside the atlas.
    pub fn render(
        &self,
        arrivals: &[ArrivalRecord],
        header_text: &str,
        is_underground: bool,
    ) -> Result<Canvas, RenderError> {
        let mut canvas = Canvas::panel(self.theme.background);

        self.draw_header(&mut canvas, header_text, is_underground)?;

        let mut rows = 0;
        for (arrival, y) in arrivals.iter().zip(row_slots()) {
            self.draw_row(&mut canvas, arrival, y)?;
            rows += 1;
        }

        if rows == 0 {
            self.draw_no_service(&mut canvas, HEADER_HEIGHT + HEADER_GAP)?;
        }

        debug!(
            header = header_text,
            rows,
            dropped = arrivals.len() - rows,
            "frame rendered"
        );

        Ok(canvas)
    }

    fn draw_header(
        &self,
        canvas: &mut Canvas,
        text: &str,
        is_underground: bool,
    ) -> Result<(), RenderError> {
        let icon = if is_underground {
            UNDERGROUND_ROUNDEL
        } else {
            SURFACE_ROUNDEL
        };

        let text_width = glyphs::text_width(text)?;
        let group_width = icon.width() + HEADER_ICON_GAP + text_width;
        let x = (CANVAS_WIDTH as i32 - group_width) / 2;

        icon.draw(canvas, Point::new(x, HEADER_TOP));
        glyphs::draw_text(
            canvas,
            Point::new(x + icon.width() + HEADER_ICON_GAP, HEADER_TOP + 1),
            text,
            self.theme.text,
        )?;
        Ok(())
    }

    fn draw_row(
        &self,
        canvas: &mut Canvas,
        arrival: &ArrivalRecord,
        y: i32,
    ) -> Result<(), RenderError> {
        let label = self.destination_label(arrival);
        let label_width =
            glyphs::draw_text(canvas, Point::new(LABEL_X, y), &label, self.theme.text)?;

        if let Some(badge) = interchange_badge(&arrival.towards) {
            // Badges are 3 px tall; centre them on the 5 px text
            badge.draw(canvas, Point::new(LABEL_X + label_width + 1, y + 1));
        }

        let minutes = arrival.minutes_to_station().to_string();
        let minutes_x = CANVAS_WIDTH as i32 - RIGHT_MARGIN - glyphs::text_width(&minutes)?;
        glyphs::draw_text(canvas, Point::new(minutes_x, y), &minutes, self.theme.text)?;
        Ok(())
    }

    /// Nickname of the destination, or the first letters of its name.
    fn destination_label(&self, arrival: &ArrivalRecord) -> String {
        match self.registry.nickname(&arrival.destination_naptan_id) {
            Some(nickname) => nickname.to_string(),
            None => {
                warn!(
                    destination = %arrival.destination_naptan_id,
                    name = %arrival.destination_name,
                    "arrival is not a listed station"
                );
                arrival
                    .destination_name
                    .chars()
                    .take(FALLBACK_LABEL_LEN)
                    .collect()
            }
        }
    }

    fn draw_no_service(&self, canvas: &mut Canvas, y: i32) -> Result<(), RenderError> {
        let icon_top = y + HEADER_GAP;
        NO_SERVICE.draw(
            canvas,
            Point::new((CANVAS_WIDTH as i32 - NO_SERVICE.width()) / 2, icon_top),
        );

        let text_top = icon_top + NO_SERVICE.height() + HEADER_GAP;
        for (line, text) in NO_SERVICE_LINES.iter().enumerate() {
            let x = (CANVAS_WIDTH as i32 - glyphs::text_width(text)?) / 2;
            let line_y = text_top + line as i32 * ROW_HEIGHT;
            glyphs::draw_text(canvas, Point::new(x, line_y), text, self.theme.text)?;
        }
        Ok(())
    }
}
