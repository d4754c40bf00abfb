//! # Pipeline
//!
//! One invocation for one job: fetch → normalize → render → encode → push.
//!
//! [`FrameComposer`] holds the pure part (normalize and render) so it can be
//! exercised without any network. [`Pipeline`] adds the two HTTP clients.
//!
//! A failed fetch is logged and treated as an empty feed; the panel then
//! shows the "service closed" frame rather than a stale one. A render error
//! or a failed push is returned to the caller.

use crate::arrivals::{ArrivalClient, SourceError};
use crate::canvas::Canvas;
use crate::codec;
use crate::config::Config;
use crate::device::{frame_id_now, DeviceClient, TransportFailure};
use crate::glyphs::RenderError;
use crate::normalizer::Normalizer;
use crate::render::{Renderer, Theme};
use crate::stations::{DirectionExceptionTable, Station, StationRegistry};
use crate::ArrivalRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that end an invocation.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The job names a station the registry does not know
    #[error("unknown station: {0}")]
    UnknownStation(String),

    /// The frame could not be laid out
    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    /// The panel did not accept the frame
    #[error(transparent)]
    Transport(#[from] TransportFailure),

    /// An HTTP client could not be built
    #[error("client setup failed: {0}")]
    Client(String),
}

/// What to show: one station, one direction of travel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub station_id: String,
    pub inbound: bool,
    /// Seconds after the start of a run before this job is processed
    #[serde(default)]
    pub delay_secs: u64,
}

impl Job {
    pub fn new(station_id: &str, inbound: bool) -> Self {
        Self {
            station_id: station_id.to_string(),
            inbound,
            delay_secs: 0,
        }
    }

    pub fn with_delay(mut self, secs: u64) -> Self {
        self.delay_secs = secs;
        self
    }
}

/// Normalizes and renders arrivals for a job. No I/O.
#[derive(Debug, Clone)]
pub struct FrameComposer {
    registry: Arc<StationRegistry>,
    normalizer: Normalizer,
    renderer: Renderer,
}

impl FrameComposer {
    pub fn new(
        registry: Arc<StationRegistry>,
        exceptions: Arc<DirectionExceptionTable>,
        theme: Theme,
    ) -> Self {
        Self {
            normalizer: Normalizer::new(registry.clone(), exceptions),
            renderer: Renderer::new(registry.clone(), theme),
            registry,
        }
    }

    /// The station a job refers to, resolving alternate ids.
    pub fn station(&self, job: &Job) -> Result<&Station, PipelineError> {
        self.registry
            .get(&job.station_id)
            .ok_or_else(|| PipelineError::UnknownStation(job.station_id.clone()))
    }

    /// Build the frame for `station` from a fetch result.
    pub fn compose(
        &self,
        station: &Station,
        inbound: bool,
        fetched: Result<Vec<ArrivalRecord>, SourceError>,
    ) -> Result<Canvas, RenderError> {
        let raw = fetched.unwrap_or_else(|e| {
            warn!(station = %station.station_id, error = %e, "arrivals unavailable, showing no service");
            Vec::new()
        });

        let arrivals = self.normalizer.normalize(raw, station, inbound);
        self.renderer
            .render(&arrivals, &station.nickname, station.is_underground)
    }
}

/// Runs jobs end to end.
#[derive(Debug, Clone)]
pub struct Pipeline {
    composer: FrameComposer,
    source: ArrivalClient,
    device: DeviceClient,
}

impl Pipeline {
    pub fn new(
        config: &Config,
        registry: Arc<StationRegistry>,
        exceptions: Arc<DirectionExceptionTable>,
    ) -> Result<Self, PipelineError> {
        let source =
            ArrivalClient::new(&config.api).map_err(|e| PipelineError::Client(e.to_string()))?;
        let device =
            DeviceClient::new(&config.device).map_err(|e| PipelineError::Client(e.to_string()))?;

        Ok(Self {
            composer: FrameComposer::new(registry, exceptions, config.display.theme()),
            source,
            device,
        })
    }

    /// Fetch and render a job's frame without pushing it.
    pub async fn render_job(&self, job: &Job) -> Result<Canvas, PipelineError> {
        let station = self.composer.station(job)?;
        let fetched = self.source.fetch(&station.station_id).await;
        Ok(self.composer.compose(station, job.inbound, fetched)?)
    }

    /// Fetch, render, encode and push one frame. Returns the panel's reply.
    pub async fn run(&self, job: &Job) -> Result<Value, PipelineError> {
        let canvas = self.render_job(job).await?;
        let payload = codec::encode(canvas);
        let reply = self.device.push(&payload, frame_id_now()).await?;

        info!(station = %job.station_id, inbound = job.inbound, "frame pushed");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stations::{BELSIZE_PARK, HAMPSTEAD_HEATH};
    use crate::Direction;

    fn composer() -> FrameComposer {
        FrameComposer::new(
            Arc::new(StationRegistry::builtin().unwrap()),
            Arc::new(DirectionExceptionTable::builtin()),
            Theme::default(),
        )
    }

    #[test]
    fn test_job_resolves_alias_and_rejects_unknown() {
        let composer = composer();
        let station = composer.station(&Job::new(BELSIZE_PARK, true)).unwrap();
        assert_eq!(station.nickname, "belsize");

        let err = composer.station(&Job::new("940GZZLUXXX", true)).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownStation(id) if id == "940GZZLUXXX"));
    }

    #[test]
    fn test_failed_fetch_matches_empty_feed() {
        let composer = composer();
        let station = composer.station(&Job::new(HAMPSTEAD_HEATH, false)).unwrap();

        let failed = composer
            .compose(
                station,
                false,
                Err(SourceError::Status {
                    status: 503,
                    body: String::new(),
                }),
            )
            .unwrap();
        let empty = composer.compose(station, false, Ok(Vec::new())).unwrap();
        assert_eq!(failed, empty);
    }

    #[test]
    fn test_compose_filters_before_rendering() {
        let composer = composer();
        let station = composer.station(&Job::new(BELSIZE_PARK, true)).unwrap();
        let wrong_way = ArrivalRecord {
            naptan_id: BELSIZE_PARK.to_string(),
            destination_naptan_id: "940GZZLUMDN".to_string(),
            destination_name: "Morden Underground Station".to_string(),
            direction: Direction::Outbound,
            time_to_station_seconds: 60,
            platform_name: "Southbound - Platform 2".to_string(),
            towards: "Morden via Bank".to_string(),
        };

        let filtered = composer
            .compose(station, true, Ok(vec![wrong_way]))
            .unwrap();
        let empty = composer.compose(station, true, Ok(Vec::new())).unwrap();
        assert_eq!(filtered, empty);
    }

    #[test]
    fn test_job_deserializes_queue_message() {
        let job: Job = serde_json::from_str(r#"{"station_id": "910GHMPSTDH", "inbound": true}"#)
            .unwrap();
        assert_eq!(job, Job::new(HAMPSTEAD_HEATH, true));
    }

    #[tokio::test]
    async fn test_unreachable_device_is_reported() {
        let mut config = Config::default();
        config.api.base_url = "http://127.0.0.1:9".to_string();
        config.api.timeout_secs = 1;
        config.device.url = "http://127.0.0.1:9/post".to_string();
        config.device.timeout_secs = 1;

        let pipeline = Pipeline::new(
            &config,
            Arc::new(StationRegistry::builtin().unwrap()),
            Arc::new(DirectionExceptionTable::builtin()),
        )
        .unwrap();

        // The fetch failure degrades to a frame; the push failure does not
        let job = Job::new(BELSIZE_PARK, true);
        assert!(pipeline.render_job(&job).await.is_ok());
        assert!(matches!(
            pipeline.run(&job).await,
            Err(PipelineError::Transport(_))
        ));
    }
}
