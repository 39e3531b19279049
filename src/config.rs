use anyhow::Result;
use serde::Deserialize;

use crate::api::LonLat;
use crate::audio::DEFAULT_CODEC_PREFERENCE;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub map: MapConfig,
    pub audio: AudioConfig,
    pub location: LocationConfig,
}

#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    /// Backend base URL, e.g. `http://localhost:8000/api`
    pub base_url: String,
    /// Route uploads through the tourist planner by default
    #[serde(default)]
    pub tourist_mode: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    /// Default center, `[lon, lat]`
    pub center: LonLat,
    /// Zoom when no route is known at mount time
    pub zoom: u8,
    /// Zoom when mounting onto an already known route
    pub route_zoom: u8,
    /// Map engine API key
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    /// Ordered codec preference list, lossless first
    #[serde(default = "default_codec_preference")]
    pub preferred_codecs: Vec<String>,
    pub sample_rate: u32,
    pub channels: u16,
}

#[derive(Debug, Deserialize)]
pub struct LocationConfig {
    /// Static position reported at startup; both unset skips the report
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

fn default_codec_preference() -> Vec<String> {
    DEFAULT_CODEC_PREFERENCE
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
