//! # Cache Module
//!
//! Best-effort memo of resolver results, keyed by the identifier the user
//! submitted (URL or search query).
//!
//! Writes are fire-and-forget: callers never learn whether an entry was
//! stored, overwritten or dropped, and a miss simply means the resolver is
//! asked again.
//!
//! ## Configuration
//!
//! ```env
//! CACHE_SIZE=1000             # Maximum number of cached identifiers
//! CACHE_TTL=3600              # Time-to-live in seconds (1 hour)
//! ```

pub mod ttl_cache;

use std::time::Duration;
use tokio::{runtime::Handle, task::JoinHandle, time::interval};
use tracing::{debug, info, warn};

use crate::audio::track::LoadedItem;
use crate::config::Config;
use ttl_cache::{CacheMetrics, TtlCache};

/// Cada cuánto se purgan las entradas vencidas (5 minutos).
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Identifier → resolved item cache shared by every load request.
#[derive(Debug, Clone)]
pub struct ResolutionCache {
    inner: TtlCache<String, LoadedItem>,
}

impl ResolutionCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: TtlCache::new(capacity, Some(ttl)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cache_size, config.cache_ttl())
    }

    /// Stores the item under `identifier`. Never reports failure.
    pub fn put(&self, identifier: &str, item: LoadedItem) {
        debug!("💾 Cacheando resultado para `{}`", identifier);
        self.inner.insert(identifier.to_string(), item);
    }

    pub fn get(&self, identifier: &str) -> Option<LoadedItem> {
        self.inner.get(&identifier.to_string())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.inner.metrics()
    }

    /// Performs cache maintenance by removing expired entries.
    pub fn cleanup_old_entries(&self) -> usize {
        let removed = self.inner.cleanup_expired();
        if removed > 0 {
            info!("🧹 Cache cleanup: removed {} expired entries", removed);
        }
        removed
    }

    /// Lanza la limpieza periódica en el runtime actual.
    ///
    /// Devuelve `None` fuera de un runtime de tokio.
    pub fn start_cleanup_task(&self, every: Duration) -> Option<JoinHandle<()>> {
        let Ok(runtime) = Handle::try_current() else {
            warn!("⚠️ Sin runtime de tokio, limpieza del caché desactivada");
            return None;
        };

        let cache = self.clone();
        let every = every.max(Duration::from_millis(1));

        Some(runtime.spawn(async move {
            let mut cleanup_interval = interval(every);
            loop {
                cleanup_interval.tick().await;
                cache.cleanup_old_entries();
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::track;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cleanup_removes_expired_entries() {
        let cache = ResolutionCache::new(10, Duration::from_millis(10));
        cache.put("song", LoadedItem::Track(track("song", 60)));
        assert_eq!(cache.cleanup_old_entries(), 0);

        std::thread::sleep(Duration::from_millis(30));

        assert_eq!(cache.cleanup_old_entries(), 1);
        assert!(cache.is_empty());
        assert_eq!(cache.metrics().expired_removals, 1);
    }

    #[tokio::test]
    async fn test_cleanup_task_purges_in_background() {
        let cache = ResolutionCache::new(10, Duration::from_millis(20));
        cache.put("song", LoadedItem::Track(track("song", 60)));

        let task = cache
            .start_cleanup_task(Duration::from_millis(10))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        task.abort();

        assert!(cache.is_empty());
        assert_eq!(cache.metrics().expired_removals, 1);
    }

    #[test]
    fn test_cleanup_task_needs_a_runtime() {
        let cache = ResolutionCache::new(10, Duration::from_secs(60));
        assert!(cache.start_cleanup_task(CLEANUP_INTERVAL).is_none());
    }
}
