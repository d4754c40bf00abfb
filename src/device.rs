//! # Display Transport
//!
//! POSTs a finished frame to the panel's HTTP endpoint as a single-frame
//! animation draw command:
//!
//! ```json
//! {"Command": "Draw/SendHttpGif", "PicNum": 1, "PicWidth": 64, "PicOffset": 0,
//!  "PicID": 1760700000, "PicSpeed": 0, "PicData": "FBQU..."}
//! ```
//!
//! Every failure, including a 200 reply whose `error_code` is non-zero, is
//! returned as a [`TransportFailure`]. Nothing is retried here.

use crate::canvas::CANVAS_WIDTH;
use crate::codec::RenderedPayload;
use crate::config::DeviceConfig;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Draw command identifier understood by the panel
pub const DRAW_COMMAND: &str = "Draw/SendHttpGif";

/// A failed push: the HTTP status if a response arrived, and why.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("device push failed ({}): {reason}", describe_status(.status))]
pub struct TransportFailure {
    pub status: Option<u16>,
    pub reason: String,
}

fn describe_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "no response".to_string(),
    }
}

impl TransportFailure {
    fn new(status: Option<u16>, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for TransportFailure {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.status().map(|s| s.as_u16()), err.to_string())
    }
}

/// JSON body of a draw command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DrawCommand<'a> {
    pub command: &'a str,
    pub pic_num: u32,
    pub pic_width: u32,
    pub pic_offset: u32,
    #[serde(rename = "PicID")]
    pub pic_id: i64,
    pub pic_speed: u32,
    pub pic_data: &'a str,
}

impl<'a> DrawCommand<'a> {
    /// A one-frame draw command. `frame_id` must increase between pushes.
    pub fn single_frame(payload: &'a RenderedPayload, frame_id: i64) -> Self {
        Self {
            command: DRAW_COMMAND,
            pic_num: 1,
            pic_width: CANVAS_WIDTH,
            pic_offset: 0,
            pic_id: frame_id,
            pic_speed: 0,
            pic_data: payload.as_str(),
        }
    }
}

/// Frame id derived from the wall clock (unix seconds).
pub fn frame_id_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// HTTP client for the panel.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
    url: String,
}

impl DeviceClient {
    pub fn new(config: &DeviceConfig) -> Result<Self, TransportFailure> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            url: config.url.clone(),
        })
    }

    /// Send one frame. Returns the panel's JSON reply on success.
    pub async fn push(
        &self,
        payload: &RenderedPayload,
        frame_id: i64,
    ) -> Result<Value, TransportFailure> {
        let command = DrawCommand::single_frame(payload, frame_id);
        let response = self.http.post(&self.url).json(&command).send().await?;

        let status = response.status();
        if !status.is_success() {
            let reason = status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string());
            return Err(TransportFailure::new(Some(status.as_u16()), reason));
        }

        // The device answered; keep its status if the body is not JSON
        let reply: Value = response.json().await.map_err(|e| {
            TransportFailure::new(Some(status.as_u16()), format!("unreadable reply: {e}"))
        })?;
        check_reply(status.as_u16(), reply)
    }
}

/// The panel answers 200 even when it rejects a command; a non-zero
/// `error_code` marks the rejection.
fn check_reply(status: u16, reply: Value) -> Result<Value, TransportFailure> {
    match reply.get("error_code").and_then(Value::as_i64) {
        Some(code) if code != 0 => Err(TransportFailure::new(
            Some(status),
            format!("device error_code {code}"),
        )),
        _ => {
            debug!(%reply, "frame accepted");
            Ok(reply)
        }
    }
}
