//! Caching layer for live feed responses.
//!
//! Every kiosk polls its stop every few seconds, and several kiosks may
//! show the same stop. Live responses are kept for a short TTL so those
//! polls share one upstream request. Only successful fetches are cached;
//! a failure is retried on the next request.
//!
//! Reconciliation is never cached: each request re-merges whatever feeds
//! it gets.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache as MokaCache;

use crate::domain::{ParsedFeed, StopId};
use crate::feed::{FeedError, LiveSource};

/// Cached live feed entry.
type FeedEntry = Arc<ParsedFeed>;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries. Zero disables caching.
    pub ttl: Duration,

    /// Maximum number of cached stops.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5),
            max_capacity: 256,
        }
    }
}

/// Live source with caching.
pub struct CachedLiveSource {
    source: LiveSource,
    cache: Option<MokaCache<StopId, FeedEntry>>,
}

impl CachedLiveSource {
    /// Create a new cached source.
    pub fn new(source: LiveSource, config: &CacheConfig) -> Self {
        let cache = (!config.ttl.is_zero()).then(|| {
            MokaCache::builder()
                .time_to_live(config.ttl)
                .max_capacity(config.max_capacity)
                .build()
        });

        Self { source, cache }
    }

    /// Fetch live departures, using the cache if available.
    pub async fn fetch(
        &self,
        stop_id: &StopId,
        now: DateTime<Utc>,
    ) -> Result<FeedEntry, FeedError> {
        let Some(cache) = &self.cache else {
            return Ok(Arc::new(self.source.fetch(stop_id, now).await?));
        };

        if let Some(cached) = cache.get(stop_id).await {
            tracing::trace!(stop_id = %stop_id, "live feed cache hit");
            return Ok(cached);
        }

        let entry = Arc::new(self.source.fetch(stop_id, now).await?);
        cache.insert(stop_id.clone(), entry.clone()).await;

        Ok(entry)
    }

    /// Number of cached stops.
    pub fn cache_entry_count(&self) -> u64 {
        self.cache.as_ref().map_or(0, |c| c.entry_count())
    }

    /// Drop all cached entries.
    pub fn invalidate_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
    }
}
