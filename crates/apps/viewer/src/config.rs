use std::time::Duration;

use gateway::{DEFAULT_API_BASE, GatewayError, HttpGateway};
use layers::{EdgePadding, FitBoundsOptions};
use serde::{Deserialize, Serialize};

use crate::basemap::default_basemap;
use crate::error::ConfigError;

/// How the viewport is fitted to a table's extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    pub padding_px: f64,
    pub duration_ms: u32,
    pub max_zoom: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            padding_px: 50.0,
            duration_ms: 1500,
            max_zoom: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Root of the metadata API, without the `/api` suffix.
    pub api_base: String,
    /// Root for vector tile URLs; `api_base` when unset.
    pub tile_base: Option<String>,
    pub request_timeout_secs: u64,
    pub fit: FitConfig,
    pub source_min_zoom: u8,
    pub source_max_zoom: u8,
    pub basemap: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            tile_base: None,
            request_timeout_secs: 30,
            fit: FitConfig::default(),
            source_min_zoom: 0,
            source_max_zoom: 22,
            basemap: default_basemap().name.to_string(),
        }
    }
}

pub const ENV_API_BASE: &str = "TILES_API_BASE";
pub const ENV_TILE_BASE: &str = "TILES_TILE_BASE";
pub const ENV_TIMEOUT_SECS: &str = "TILES_TIMEOUT_SECS";
pub const ENV_BASEMAP: &str = "TILES_BASEMAP";

impl ViewerConfig {
    /// Defaults overridden by `TILES_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(v) = non_empty(lookup(ENV_API_BASE)) {
            cfg.api_base = v;
        }
        if let Some(v) = non_empty(lookup(ENV_TILE_BASE)) {
            cfg.tile_base = Some(v);
        }
        if let Some(v) = non_empty(lookup(ENV_TIMEOUT_SECS)) {
            cfg.request_timeout_secs = v.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_TIMEOUT_SECS,
                value: v.clone(),
            })?;
        }
        if let Some(v) = non_empty(lookup(ENV_BASEMAP)) {
            cfg.basemap = v;
        }
        Ok(cfg)
    }

    /// Parse a JSON config document; missing keys keep their defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(|e| ConfigError::Json(e.to_string()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn fit_options(&self) -> FitBoundsOptions {
        FitBoundsOptions {
            padding: EdgePadding::uniform(self.fit.padding_px),
            duration_ms: self.fit.duration_ms,
            max_zoom: self.fit.max_zoom,
        }
    }

    pub fn http_gateway(&self) -> Result<HttpGateway, GatewayError> {
        HttpGateway::with_timeout(
            &self.api_base,
            self.tile_base.as_deref(),
            self.request_timeout(),
        )
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
