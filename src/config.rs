//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! countdown-config.toml file. It covers the arrivals API, the panel's
//! endpoint, display colours and the list of jobs one run processes.
//!
//! Station data is compiled in and deliberately not configurable.
//!
//! ## Environment Overrides
//!
//! Applied after the file is read, so secrets can stay out of the file:
//! - `PIXOO_URL` replaces `device.url`
//! - `TFL_APP_KEY` replaces `api.app_key`

use crate::pipeline::Job;
use crate::render::Theme;
use crate::stations::{BELSIZE_PARK, HAMPSTEAD_HEATH};
use embedded_graphics::pixelcolor::Rgb888;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Default configuration file, relative to the working directory
pub const CONFIG_FILE: &str = "countdown-config.toml";

/// Application configuration loaded from countdown-config.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Arrivals API settings
    pub api: ApiConfig,
    /// Panel endpoint settings
    pub device: DeviceConfig,
    /// Frame colours
    pub display: DisplayConfig,
    /// Stations to show, in order
    pub jobs: Vec<Job>,
}

/// Arrivals API configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API root, without trailing slash
    pub base_url: String,
    /// Optional application key sent as the `app_key` query parameter
    pub app_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Panel endpoint configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// URL the draw command is POSTed to
    pub url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Display colours as `[r, g, b]`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub text_color: [u8; 3],
    pub background_color: [u8; 3],
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.tfl.gov.uk".to_string(),
            app_key: None,
            timeout_secs: 5,
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            url: "http://pixoo.local/post".to_string(),
            timeout_secs: 5,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            text_color: [255, 211, 0],
            background_color: [20, 20, 20],
        }
    }
}

impl DisplayConfig {
    /// Colours for the render engine.
    pub fn theme(&self) -> Theme {
        let [r, g, b] = self.text_color;
        let [br, bg, bb] = self.background_color;
        Theme {
            text: Rgb888::new(r, g, b),
            background: Rgb888::new(br, bg, bb),
        }
    }
}

/// Jobs used when the file does not list any: two stations alternating
/// every 15 seconds over one minute.
pub fn default_jobs() -> Vec<Job> {
    vec![
        Job::new(BELSIZE_PARK, true),
        Job::new(HAMPSTEAD_HEATH, false).with_delay(15),
        Job::new(BELSIZE_PARK, true).with_delay(30),
        Job::new(HAMPSTEAD_HEATH, false).with_delay(45),
    ]
}

impl Config {
    /// Load configuration from countdown-config.toml, then apply environment
    /// overrides. Falls back to defaults if the file is missing or invalid.
    pub fn load() -> Self {
        let mut config = Self::load_from_path(CONFIG_FILE);
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let mut config = match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), jobs = config.jobs.len(), "loaded configuration");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no config file found, using defaults");
                Self::default()
            }
        };

        if config.jobs.is_empty() {
            config.jobs = default_jobs();
        }
        config
    }

    /// Apply `PIXOO_URL` and `TFL_APP_KEY` from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PIXOO_URL").filter(|v| !v.is_empty()) {
            self.device.url = url;
        }
        if let Some(key) = lookup("TFL_APP_KEY").filter(|v| !v.is_empty()) {
            self.api.app_key = Some(key);
        }
    }

    /// Save current configuration to countdown-config.toml
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to_path(CONFIG_FILE)
    }

    /// Save current configuration to the given path
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }
}
