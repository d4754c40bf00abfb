//! # Arrival Source
//!
//! Fetches live arrival predictions for one stop from the TfL Unified API:
//!
//! ```text
//! GET {base_url}/StopPoint/{naptan_id}/Arrivals[?app_key=...]
//! ```
//!
//! ## Decoding
//!
//! The API omits fields rather than sending nulls, so every field of the
//! wire type is optional. Each record is decoded and converted on its own:
//! a record with a badly typed field, or without a stop id, destination id
//! or time to station, is skipped with a warning instead of failing the
//! whole poll. Free-text fields default to
//! empty strings.
//!
//! ## Error Handling
//!
//! Any failure comes back as [`SourceError`]. Callers treat it as "no
//! arrivals" so the panel still gets a frame.

use crate::config::ApiConfig;
use crate::{ArrivalRecord, Direction};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while fetching arrivals.
#[derive(Error, Debug)]
pub enum SourceError {
    /// HTTP request failed (network, timeout, or protocol error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with a non-success status
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Body was not a JSON array of arrivals
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One arrival as the API sends it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireArrival {
    pub naptan_id: Option<String>,
    pub destination_naptan_id: Option<String>,
    pub destination_name: Option<String>,
    pub direction: Option<String>,
    pub time_to_station: Option<i64>,
    pub platform_name: Option<String>,
    pub towards: Option<String>,
}

impl WireArrival {
    /// Convert to a domain record. Returns the name of the first missing or
    /// invalid field on failure.
    pub fn into_record(self) -> Result<ArrivalRecord, &'static str> {
        let naptan_id = self.naptan_id.ok_or("naptanId")?;
        let destination_naptan_id = self.destination_naptan_id.ok_or("destinationNaptanId")?;
        let time_to_station_seconds = self
            .time_to_station
            .and_then(|secs| u32::try_from(secs).ok())
            .ok_or("timeToStation")?;

        Ok(ArrivalRecord {
            naptan_id,
            destination_naptan_id,
            destination_name: self.destination_name.unwrap_or_default(),
            direction: Direction::from_feed(self.direction.as_deref().unwrap_or_default()),
            time_to_station_seconds,
            platform_name: self.platform_name.unwrap_or_default(),
            towards: self.towards.unwrap_or_default(),
        })
    }
}

/// Decode a response body, skipping malformed records.
///
/// # Example
/// ```
/// use tube_countdown_lib::arrivals::parse_arrivals;
///
/// let body = r#"[
///     {"naptanId": "940GZZLUBZP", "destinationNaptanId": "940GZZLUMDN",
///      "direction": "outbound", "timeToStation": 125},
///     {"naptanId": "940GZZLUBZP"}
/// ]"#;
///
/// let arrivals = parse_arrivals(body).unwrap();
/// assert_eq!(arrivals.len(), 1);
/// ```
pub fn parse_arrivals(body: &str) -> Result<Vec<ArrivalRecord>, SourceError> {
    // Decode element by element so one badly typed record is skipped alone
    let elements: Vec<Value> = serde_json::from_str(body)?;
    let received = elements.len();

    let records: Vec<ArrivalRecord> = elements
        .into_iter()
        .filter_map(|element| {
            let arrival = match serde_json::from_value::<WireArrival>(element) {
                Ok(arrival) => arrival,
                Err(e) => {
                    warn!(error = %e, "skipping arrival that does not decode");
                    return None;
                }
            };
            match arrival.into_record() {
                Ok(record) => Some(record),
                Err(field) => {
                    warn!(field, "skipping arrival with missing or invalid field");
                    None
                }
            }
        })
        .collect();

    debug!(received, decoded = records.len(), "arrivals decoded");
    Ok(records)
}

/// HTTP client for the arrivals API.
#[derive(Debug, Clone)]
pub struct ArrivalClient {
    http: reqwest::Client,
    base_url: String,
    app_key: Option<String>,
}

impl ArrivalClient {
    pub fn new(config: &ApiConfig) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            app_key: config.app_key.clone(),
        })
    }

    /// Unordered, unfiltered arrivals for `station_id`.
    pub async fn fetch(&self, station_id: &str) -> Result<Vec<ArrivalRecord>, SourceError> {
        let url = format!("{}/StopPoint/{}/Arrivals", self.base_url, station_id);

        let mut request = self.http.get(&url);
        if let Some(key) = &self.app_key {
            request = request.query(&[("app_key", key)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let body = response.text().await?;
        parse_arrivals(&body)
    }
}
