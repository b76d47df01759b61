// SPDX-License-Identifier: MIT

use crate::cache::{CacheManager, CacheMetadata};
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// One ticker's channel entry. Channels are ordered by `channel_number`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub channel_number: u32,
    pub ticker: String,
    pub company_name: String,
}

/// Provenance classification of a video's source channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrustTier {
    #[serde(rename = "Official Company")]
    OfficialCompany,
    #[serde(rename = "Professional News")]
    ProfessionalNews,
    #[serde(rename = "Vetted Expert")]
    VettedExpert,
    #[serde(rename = "Community")]
    #[serde(other)]
    Community,
}

impl std::fmt::Display for TrustTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrustTier::OfficialCompany => write!(f, "Official Company"),
            TrustTier::ProfessionalNews => write!(f, "Professional News"),
            TrustTier::VettedExpert => write!(f, "Vetted Expert"),
            TrustTier::Community => write!(f, "Community"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    /// Opaque external media identifier, unique within its channel.
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub source: String,
    pub trust_tier: TrustTier,
    pub stock_ticker: String,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub channel_title: Option<String>,
}

/// Point-in-time quote for a ticker. Refreshed on a fixed cadence, read-only
/// for the playback side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSnapshot {
    pub ticker: String,
    pub current_price: f64,
    pub change: f64,
    pub percent_change: f64,
    #[serde(default)]
    pub high: f64,
    #[serde(default)]
    pub low: f64,
    #[serde(default)]
    pub open: f64,
    #[serde(default)]
    pub previous_close: f64,
}

impl StockSnapshot {
    pub fn is_up(&self) -> bool {
        self.change >= 0.0
    }
}

/// HTTP client for the channel/quote API, with a disk cache for the listings
/// that never change mid-session.
pub struct TickerApi {
    client: Client,
    base_url: String,
    cache: CacheManager,
    cache_ttl: Duration,
}

impl TickerApi {
    pub fn new(base_url: &str, cache_ttl: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = base_url.trim_end_matches('/').to_string();
        let cache = CacheManager::new(&base_url)?;

        Ok(Self {
            client,
            base_url,
            cache,
            cache_ttl,
        })
    }

    pub fn http(&self) -> &Client {
        &self.client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Idempotent server-side seed of the channel lineup. A failure here is
    /// not fatal; the channel list endpoint reports its own errors.
    pub async fn init_channels(&self) -> Result<()> {
        let url = format!("{}/api/init-channels", self.base_url);
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;
        debug!("init-channels returned {}", response.status());
        Ok(())
    }

    /// All channels, ordered by channel number.
    pub async fn get_channels(&mut self) -> Result<Vec<Channel>> {
        if let Some(cached) = self.cache.get_cached::<Vec<Channel>>("channels").await {
            debug!("Using {} cached channels", cached.len());
            return Ok(cached);
        }

        let url = format!("{}/api/channels", self.base_url);
        let mut channels: Vec<Channel> = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch channels from {}", url))?
            .error_for_status()
            .context("Channel listing request failed")?
            .json()
            .await
            .context("Failed to parse channel listing")?;

        channels.sort_by_key(|c| c.channel_number);

        let metadata = CacheMetadata::new(self.base_url.clone(), self.cache_ttl.as_secs());
        if let Err(e) = self.cache.store_cache("channels", &channels, metadata).await {
            warn!("Failed to cache channel listing: {}", e);
        }

        Ok(channels)
    }

    /// The ordered video queue for one ticker. Cached on disk so revisiting a
    /// channel within the TTL never waits on the network.
    pub async fn get_videos(&mut self, ticker: &str) -> Result<Vec<Video>> {
        let ticker = ticker.to_uppercase();
        let cache_key = format!("videos_{}", ticker);

        if let Some(cached) = self.cache.get_cached::<Vec<Video>>(&cache_key).await {
            debug!("Using {} cached videos for {}", cached.len(), ticker);
            return Ok(cached);
        }

        let url = format!("{}/api/channels/{}/videos", self.base_url, ticker);
        let videos: Vec<Video> = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch videos for {}", ticker))?
            .error_for_status()
            .with_context(|| format!("Video listing request for {} failed", ticker))?
            .json()
            .await
            .with_context(|| format!("Failed to parse video listing for {}", ticker))?;

        let metadata = CacheMetadata::new(self.base_url.clone(), self.cache_ttl.as_secs());
        if let Err(e) = self.cache.store_cache(&cache_key, &videos, metadata).await {
            warn!("Failed to cache videos for {}: {}", ticker, e);
        }

        Ok(videos)
    }

    /// Live quote for a ticker. Quotes are never cached.
    pub async fn get_stock(&self, ticker: &str) -> Result<StockSnapshot> {
        fetch_stock(&self.client, &self.base_url, ticker).await
    }

    pub async fn clear_cache(&self) -> Result<()> {
        self.cache.clear_all().await
    }
}

/// Free-standing quote fetch, shared by [`TickerApi::get_stock`] and the
/// background refresh tasks spawned by the TUI.
pub async fn fetch_stock(client: &Client, base_url: &str, ticker: &str) -> Result<StockSnapshot> {
    let ticker = ticker.to_uppercase();
    let url = format!("{}/api/stock/{}", base_url, ticker);
    let snapshot: StockSnapshot = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch quote for {}", ticker))?
        .error_for_status()
        .with_context(|| format!("Quote request for {} failed", ticker))?
        .json()
        .await
        .with_context(|| format!("Failed to parse quote for {}", ticker))?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_deserializes_api_shape() {
        let json = r#"{
            "id": "5b1f7d3e",
            "channelNumber": 5,
            "ticker": "NVDA",
            "companyName": "NVIDIA Corporation",
            "created_at": "2025-01-01T00:00:00"
        }"#;
        let channel: Channel = serde_json::from_str(json).unwrap();
        assert_eq!(channel.channel_number, 5);
        assert_eq!(channel.ticker, "NVDA");
    }

    #[test]
    fn test_video_trust_tier_labels() {
        let json = r#"{
            "id": "v1",
            "videoId": "dQw4w9WgXcQ",
            "title": "Q3 earnings call",
            "description": "",
            "thumbnail": "https://example.com/t.jpg",
            "source": "YouTube",
            "trustTier": "Professional News",
            "stockTicker": "AAPL",
            "channelTitle": "Bloomberg Television"
        }"#;
        let video: Video = serde_json::from_str(json).unwrap();
        assert_eq!(video.trust_tier, TrustTier::ProfessionalNews);
        assert_eq!(video.video_id, "dQw4w9WgXcQ");
    }

    #[test]
    fn test_unknown_trust_tier_falls_back_to_community() {
        let json = r#"{
            "id": "v2",
            "videoId": "abc",
            "title": "t",
            "description": "",
            "thumbnail": "",
            "source": "YouTube",
            "trustTier": "Totally Made Up",
            "stockTicker": "TSLA"
        }"#;
        let video: Video = serde_json::from_str(json).unwrap();
        assert_eq!(video.trust_tier, TrustTier::Community);
    }

    #[test]
    fn test_stock_snapshot_deserializes() {
        let json = r#"{
            "ticker": "AAPL",
            "currentPrice": 213.5,
            "change": -1.2,
            "percentChange": -0.56,
            "high": 215.0,
            "low": 210.3,
            "open": 214.1,
            "previousClose": 214.7,
            "timestamp": "2025-01-01T00:00:00"
        }"#;
        let snapshot: StockSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.ticker, "AAPL");
        assert!(!snapshot.is_up());
    }
}
