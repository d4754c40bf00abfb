//! # Tube Countdown Core Library
//!
//! This library turns a live arrivals feed for one station into a single
//! 64×64 pixel frame for an LED indicator panel, and hands that frame to the
//! panel's HTTP endpoint.
//!
//! ## Pipeline
//!
//! 1. **Fetch**: [`arrivals::ArrivalClient`] pulls raw arrival records for a stop
//! 2. **Normalize**: [`normalizer::Normalizer`] canonicalizes ids, keeps the
//!    requested direction of travel and sorts by time to arrival
//! 3. **Render**: [`render::Renderer`] lays out a header and up to eight rows
//!    on a [`canvas::Canvas`] using the closed [`glyphs`] atlas
//! 4. **Encode**: [`codec::encode`] flattens the canvas to RGB bytes and base64
//! 5. **Push**: [`device::DeviceClient`] POSTs the draw command to the panel
//!
//! [`pipeline::Pipeline`] wires the five steps together for one job.
//!
//! ## Failure Policy
//!
//! - A failed fetch is not an error: the frame shows "service closed" instead
//! - An unknown destination falls back to the first three letters of its name
//! - A character outside the glyph atlas aborts the render
//! - A failed push is returned to the caller, never retried
//!
//! ## Core Types
//!
//! - [`Direction`]: direction of travel as reported by the feed
//! - [`ArrivalRecord`]: one predicted arrival, immutable after normalization

use serde::{Deserialize, Serialize};

// Module declarations
pub mod arrivals;
pub mod canvas;
pub mod codec;
pub mod config;
pub mod device;
pub mod glyphs;
pub mod normalizer;
pub mod pipeline;
pub mod preview;
pub mod render;
pub mod stations;


/// Direction of travel for an arrival.
///
/// Some feeds leave the direction blank for certain routes, which decodes
/// to [`Direction::Unknown`]. The normalizer resolves those through the
/// direction exception table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
    Unknown,
}

impl Direction {
    /// Direction requested by a job (`true` = inbound).
    pub fn requested(inbound: bool) -> Self {
        if inbound {
            Direction::Inbound
        } else {
            Direction::Outbound
        }
    }

    /// Decode the feed's free-form direction string.
    ///
    /// Matching is case-insensitive; empty or unrecognised values are
    /// [`Direction::Unknown`].
    pub fn from_feed(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "inbound" => Direction::Inbound,
            "outbound" => Direction::Outbound,
            _ => Direction::Unknown,
        }
    }
}

/// A single predicted arrival at a station.
///
/// Records are produced fresh on every poll and never persisted.
///
/// # Example
/// ```
/// use tube_countdown_lib::{ArrivalRecord, Direction};
///
/// let arrival = ArrivalRecord {
///     naptan_id: "940GZZLUBZP".to_string(),
///     destination_naptan_id: "940GZZLUMDN".to_string(),
///     destination_name: "Morden Underground Station".to_string(),
///     direction: Direction::Outbound,
///     time_to_station_seconds: 125,
///     platform_name: "Southbound - Platform 2".to_string(),
///     towards: "Morden via Bank".to_string(),
/// };
///
/// assert_eq!(arrival.minutes_to_station(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrivalRecord {
    /// Stop the prediction is for
    pub naptan_id: String,
    /// Stop the vehicle terminates at
    pub destination_naptan_id: String,
    /// Display name of the terminating stop
    pub destination_name: String,
    /// Direction of travel as reported by the feed
    pub direction: Direction,
    /// Seconds until the vehicle reaches `naptan_id`
    pub time_to_station_seconds: u32,
    pub platform_name: String,
    /// Free-text routing hint, e.g. "Edgware via CX"
    pub towards: String,
}

impl ArrivalRecord {
    /// Whole minutes to arrival, rounded down.
    pub fn minutes_to_station(&self) -> u32 {
        self.time_to_station_seconds / 60
    }
}
