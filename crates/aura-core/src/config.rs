//! Runtime configuration.
//!
//! All values are tuning knobs. The defaults are what the wall ships with;
//! a JSON file can override any subset of them and the CLI overrides the
//! file.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, ProviderPriority, Result};

/// Listening window for the top-artists query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Period {
    #[serde(rename = "7day")]
    Week,
    #[default]
    #[serde(rename = "1month")]
    Month,
    #[serde(rename = "3month")]
    Quarter,
    #[serde(rename = "6month")]
    HalfYear,
    #[serde(rename = "12month")]
    Year,
    #[serde(rename = "overall")]
    Overall,
}

impl Period {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Week => "7day",
            Self::Month => "1month",
            Self::Quarter => "3month",
            Self::HalfYear => "6month",
            Self::Year => "12month",
            Self::Overall => "overall",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "7day" | "week" => Ok(Self::Week),
            "1month" | "month" => Ok(Self::Month),
            "3month" => Ok(Self::Quarter),
            "6month" => Ok(Self::HalfYear),
            "12month" | "year" => Ok(Self::Year),
            "overall" => Ok(Self::Overall),
            other => Err(Error::InvalidArgument(format!("unknown period {other:?}"))),
        }
    }
}

/// Aura configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base URL of the credential-hiding API proxy.
    pub proxy_base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Listening window for top artists.
    pub period: Period,
    /// Number of artists on the wall.
    pub limit: u32,
    /// Image provider preference, primary first.
    pub priority: ProviderPriority,
    /// Rendered tile edge in pixels.
    pub tile_size: u32,
    /// Smallest acceptable image edge in pixels.
    pub image_floor: u32,
    /// Refresh the progressive color every this many resolved artists.
    pub progressive_every: usize,
    /// Delay before auto-rotation starts, in milliseconds.
    pub rotation_delay_ms: u64,
    /// Interval between auto-rotation steps, in milliseconds.
    pub rotation_interval_ms: u64,
    /// Never auto-rotate.
    pub reduced_motion: bool,
    /// Average relative luminance above which an overlay is treated as light.
    pub luminance_threshold: f64,
    /// Top edge of the overlay region as a fraction of image height.
    pub overlay_top: f64,
    /// Saturation the color starts from before any data arrives.
    pub neutral_saturation: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy_base_url: "http://localhost:3000".to_string(),
            request_timeout_secs: 15,
            period: Period::default(),
            limit: 12,
            priority: ProviderPriority::default(),
            tile_size: 300,
            image_floor: 300,
            progressive_every: 3,
            rotation_delay_ms: 3_000,
            rotation_interval_ms: 6_000,
            reduced_motion: false,
            luminance_threshold: 0.55,
            overlay_top: 0.7,
            neutral_saturation: 18.0,
        }
    }
}

impl Config {
    /// Default location of the config file.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "aura", "Aura").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load the default config file if it exists, otherwise the defaults.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Check values that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(Error::Config("limit must be at least 1".into()));
        }
        if self.rotation_interval_ms == 0 {
            return Err(Error::Config("rotation interval must be non-zero".into()));
        }
        if self.progressive_every == 0 {
            return Err(Error::Config("progressive cadence must be non-zero".into()));
        }
        if !(0.0..1.0).contains(&self.overlay_top) {
            return Err(Error::Config("overlay_top must be within [0, 1)".into()));
        }
        if self.proxy_base_url.trim().is_empty() {
            return Err(Error::Config("proxy base URL is empty".into()));
        }
        Ok(())
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub const fn rotation_delay(&self) -> Duration {
        Duration::from_millis(self.rotation_delay_ms)
    }

    pub const fn rotation_interval(&self) -> Duration {
        Duration::from_millis(self.rotation_interval_ms)
    }

    pub fn with_proxy(mut self, base_url: impl Into<String>) -> Self {
        self.proxy_base_url = base_url.into();
        self
    }

    pub fn with_priority(mut self, priority: ProviderPriority) -> Self {
        self.priority = priority;
        self
    }

    pub const fn with_reduced_motion(mut self, reduced_motion: bool) -> Self {
        self.reduced_motion = reduced_motion;
        self
    }
}
