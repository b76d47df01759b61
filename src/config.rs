// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub playback: PlaybackConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the channel/quote API, without the trailing `/api`.
    pub base_url: String,
    /// How long cached channel/video listings stay valid.
    pub cache_ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Cadence of the near-end detection poll.
    pub coarse_poll_ms: u64,
    /// Cadence of the progress-display poll.
    pub fine_poll_ms: u64,
    /// Advance to the next video when this close to the end, in seconds.
    /// Pre-empts the player's own end-of-file screen.
    pub early_advance_threshold_secs: f64,
    pub default_volume: i64,
    pub seek_step_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// How often the stock quote banner refreshes.
    pub stock_refresh_seconds: u64,
    /// Transport control bar hides after this many seconds of inactivity.
    pub controls_hide_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            cache_ttl_seconds: 3600,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            coarse_poll_ms: 500,
            fine_poll_ms: 100,
            early_advance_threshold_secs: 3.0,
            default_volume: 80,
            seek_step_secs: 10.0,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            stock_refresh_seconds: 30,
            controls_hide_seconds: 5,
        }
    }
}

impl PlaybackConfig {
    pub fn coarse_poll(&self) -> Duration {
        Duration::from_millis(self.coarse_poll_ms)
    }

    pub fn fine_poll(&self) -> Duration {
        Duration::from_millis(self.fine_poll_ms)
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("tickertv").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Config {
        if path.as_ref().exists() {
            Self::load(&path).unwrap_or_else(|e| {
                tracing::warn!("Could not load config file, using defaults: {}", e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize config to TOML")?;

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.playback.coarse_poll_ms, 500);
        assert_eq!(config.playback.fine_poll_ms, 100);
        assert_eq!(config.playback.early_advance_threshold_secs, 3.0);
        assert!((0..=100).contains(&config.playback.default_volume));
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [api]
            base_url = "http://example.com:9000"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "http://example.com:9000");
        assert_eq!(config.api.cache_ttl_seconds, 3600);
        assert_eq!(config.playback.fine_poll_ms, 100);
    }

    #[test]
    fn test_round_trip() {
        let mut config = Config::default();
        config.playback.default_volume = 55;
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.playback.default_volume, 55);
    }
}
