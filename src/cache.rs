// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs as async_fs;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub created_at: u64,
    pub ttl_seconds: u64,
    pub api_base_url: String,
}

impl CacheMetadata {
    pub fn new(api_base_url: String, ttl_seconds: u64) -> Self {
        Self {
            created_at: unix_now(),
            ttl_seconds,
            api_base_url,
        }
    }

    pub fn is_expired(&self) -> bool {
        unix_now() > self.created_at + self.ttl_seconds
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub metadata: CacheMetadata,
    pub data: T,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Disk cache for channel and video listings, keyed by API base URL so
/// pointing the app at a different server never serves stale data.
#[derive(Debug)]
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(api_base_url: &str) -> Result<Self> {
        let mut hasher = Sha256::new();
        hasher.update(api_base_url.as_bytes());
        let hash = format!("{:x}", hasher.finalize());

        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine cache directory"))?
            .join("tickertv")
            .join(&hash[..16]);

        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir).with_context(|| {
                format!("Failed to create cache directory: {}", cache_dir.display())
            })?;
        }

        Ok(Self { cache_dir })
    }

    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    /// Returns the cached value for `key`, or `None` when missing, expired,
    /// or unreadable. Cache problems are never surfaced as errors; the caller
    /// falls back to the network.
    pub async fn get_cached<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let path = self.cache_path(key);
        if !path.exists() {
            return None;
        }

        let content = match async_fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                debug!("Failed to read cache file {}: {}", path.display(), e);
                return None;
            }
        };

        let cached: CachedData<T> = match serde_json::from_str(&content) {
            Ok(cached) => cached,
            Err(e) => {
                debug!("Discarding unparsable cache entry {}: {}", key, e);
                let _ = async_fs::remove_file(&path).await;
                return None;
            }
        };

        if cached.metadata.is_expired() {
            debug!("Cache entry {} expired", key);
            let _ = async_fs::remove_file(&path).await;
            return None;
        }

        Some(cached.data)
    }

    pub async fn store_cache<T>(&self, key: &str, data: &T, metadata: CacheMetadata) -> Result<()>
    where
        T: Serialize,
    {
        #[derive(Serialize)]
        struct CachedDataRef<'a, T> {
            metadata: &'a CacheMetadata,
            data: &'a T,
        }

        let path = self.cache_path(key);
        let cached = CachedDataRef {
            metadata: &metadata,
            data,
        };
        let content = serde_json::to_string(&cached)
            .with_context(|| format!("Failed to serialize cache entry {}", key))?;

        async_fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write cache file: {}", path.display()))?;

        Ok(())
    }

    pub async fn clear_all(&self) -> Result<()> {
        let mut entries = async_fs::read_dir(&self.cache_dir)
            .await
            .with_context(|| format!("Failed to read cache dir: {}", self.cache_dir.display()))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && let Err(e) = async_fs::remove_file(&path).await
            {
                warn!("Failed to remove cache file {}: {}", path.display(), e);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_metadata_is_not_expired() {
        let metadata = CacheMetadata::new("http://localhost:8000".to_string(), 3600);
        assert!(!metadata.is_expired());
    }

    #[test]
    fn test_old_metadata_is_expired() {
        let metadata = CacheMetadata {
            created_at: 0,
            ttl_seconds: 60,
            api_base_url: "http://localhost:8000".to_string(),
        };
        assert!(metadata.is_expired());
    }
}
