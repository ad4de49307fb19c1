//! Persisted monitor settings.
//!
//! Loads settings from config.json next to the executable. Values the user
//! types (change threshold, delay) are kept as text, the way they were entered,
//! and parsed when monitoring starts.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::capture::Region;

/// Text that disables capture-and-notify while still counting changes.
pub const DISABLED_SENTINEL: &str = "-";

/// Delay used when the configured one cannot be parsed.
pub const DEFAULT_DELAY_SECS: f64 = 3.0;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Please enter a valid number or '-' to disable (got {0:?})")]
pub struct InvalidThreshold(pub String);

/// Number of confirmed changes that triggers a capture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeThreshold {
    /// Count changes forever, never capture.
    Disabled,
    /// Capture once the change count reaches this value. Values <= 1 fire on the first change.
    Count(i64),
}

impl ChangeThreshold {
    /// Returns true if `change_count` satisfies the threshold.
    pub fn is_reached(&self, change_count: u32) -> bool {
        match self {
            ChangeThreshold::Disabled => false,
            ChangeThreshold::Count(n) => i64::from(change_count) >= *n,
        }
    }
}

impl FromStr for ChangeThreshold {
    type Err = InvalidThreshold;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed == DISABLED_SENTINEL {
            return Ok(ChangeThreshold::Disabled);
        }
        trimmed
            .parse::<i64>()
            .map(ChangeThreshold::Count)
            .map_err(|_| InvalidThreshold(s.to_string()))
    }
}

impl fmt::Display for ChangeThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeThreshold::Disabled => write!(f, "{}", DISABLED_SENTINEL),
            ChangeThreshold::Count(n) => write!(f, "{}", n),
        }
    }
}

/// Parses a delay in seconds, falling back to `DEFAULT_DELAY_SECS`.
pub fn parse_delay(s: &str) -> Duration {
    match s.trim().parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Duration::from_secs_f64(secs),
        _ => {
            warn!("Invalid delay {:?}, using {}s", s, DEFAULT_DELAY_SECS);
            Duration::from_secs_f64(DEFAULT_DELAY_SECS)
        }
    }
}

/// Complete monitor configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Webhook the full-screen capture is posted to
    #[serde(default)]
    pub webhook: String,
    /// Change threshold as typed: an integer, or "-" to disable
    #[serde(default = "default_changes", deserialize_with = "text_or_number")]
    pub changes: String,
    /// Seconds to wait between the threshold firing and the capture
    #[serde(default = "default_delay", deserialize_with = "text_or_number")]
    pub delay: String,
    /// Monitored zone as [x1, y1, x2, y2]
    #[serde(default, deserialize_with = "lenient_zone")]
    pub zone: Option<Region>,
    /// Also write each dispatched capture to the screenshots directory
    #[serde(default)]
    pub keep_screenshots: bool,
}

fn default_changes() -> String {
    "5".to_string()
}

fn default_delay() -> String {
    "3".to_string()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            webhook: String::new(),
            changes: default_changes(),
            delay: default_delay(),
            zone: None,
            keep_screenshots: false,
        }
    }
}

/// Accepts `"5"` as well as `5` so hand-edited files keep working.
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(s) => s,
        TextOrNumber::Number(n) => n.to_string(),
    })
}

/// An unusable saved zone is dropped instead of rejecting the whole file.
fn lenient_zone<'de, D>(deserializer: D) -> Result<Option<Region>, D::Error>
where
    D: Deserializer<'de>,
{
    let corners: Option<[i32; 4]> = Option::deserialize(deserializer)?;
    Ok(corners.and_then(|c| match Region::try_from(c) {
        Ok(region) => Some(region),
        Err(e) => {
            warn!("Ignoring saved zone {:?}: {}", c, e);
            None
        }
    }))
}

impl MonitorConfig {
    pub fn threshold(&self) -> Result<ChangeThreshold, InvalidThreshold> {
        self.changes.parse()
    }

    pub fn delay(&self) -> Duration {
        parse_delay(&self.delay)
    }

    /// Loads configuration from `path` or returns defaults.
    pub fn load_from(path: &Path) -> Self {
        info!("Looking for config at: {}", path.display());

        if !path.exists() {
            info!("config.json not found. Using default config.");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    info!("Config loaded from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to parse config.json: {}. Using defaults.", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read config.json: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Writes the configuration as pretty JSON.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Config saved to {}", path.display());
        Ok(())
    }
}
