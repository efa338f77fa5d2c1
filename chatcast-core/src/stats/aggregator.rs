use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::memory::MemoryStore;
use super::redis::RedisStore;
use super::store::{NoopStore, StatsStore};
use crate::config::{RedisConfig, StatsBackend, StatsConfig};
use crate::error::Result;
use crate::models::{ChannelStats, ChatAuthor};

// keep the rate-limit map from growing without bound on busy channels
const RATE_MAP_PRUNE_THRESHOLD: usize = 4096;

/// Wraps a stats store with per-author rate limiting, a short-lived snapshot
/// cache, and (for the shared backend) a periodic idle-author sweep.
pub struct StatsAggregator {
    store: Arc<dyn StatsStore>,
    rate_limit: Duration,
    cache_ttl: Duration,
    last_seen: Mutex<HashMap<String, Instant>>,
    cached: Mutex<Option<(Instant, ChannelStats)>>,
    sweep_task: Mutex<Option<JoinHandle<()>>>,
}

impl StatsAggregator {
    /// Build an aggregator for `channel` from configuration.
    ///
    /// Never fails: if the shared backend is unreachable the aggregator logs
    /// the degradation and falls back to the in-memory store.
    pub async fn connect(
        channel: &str,
        stats_cfg: &StatsConfig,
        redis_cfg: &RedisConfig,
    ) -> Arc<Self> {
        let mut shared = false;
        let store: Arc<dyn StatsStore> = if !stats_cfg.enabled {
            Arc::new(NoopStore)
        } else {
            match stats_cfg.backend {
                StatsBackend::Memory => Arc::new(MemoryStore::new()),
                StatsBackend::Redis => {
                    match RedisStore::connect(redis_cfg, stats_cfg, channel).await {
                        Ok(store) => {
                            shared = true;
                            Arc::new(store)
                        }
                        Err(err) => {
                            tracing::warn!(
                                channel = %channel,
                                error = %err,
                                "Shared stats backend unreachable, falling back to in-memory store"
                            );
                            Arc::new(MemoryStore::new())
                        }
                    }
                }
            }
        };

        let aggregator = Arc::new(Self::from_store(store, stats_cfg));
        if shared {
            aggregator.spawn_sweep(Duration::from_secs(stats_cfg.sweep_interval_seconds));
        }
        aggregator
    }

    /// Build directly over a store. Used by `connect` and by tests that
    /// script the backend.
    #[must_use]
    pub fn from_store(store: Arc<dyn StatsStore>, stats_cfg: &StatsConfig) -> Self {
        Self {
            store,
            rate_limit: Duration::from_millis(stats_cfg.rate_limit_ms),
            cache_ttl: Duration::from_secs(stats_cfg.cache_ttl_seconds),
            last_seen: Mutex::new(HashMap::new()),
            cached: Mutex::new(None),
            sweep_task: Mutex::new(None),
        }
    }

    fn spawn_sweep(self: &Arc<Self>, interval: Duration) {
        let store = self.store.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick fires immediately; nothing to sweep yet
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match store.evict_idle().await {
                    Ok(0) => {}
                    Ok(evicted) => tracing::debug!(evicted, "Idle author sweep complete"),
                    Err(err) => tracing::warn!(error = %err, "Idle author sweep failed"),
                }
            }
        });
        *self.sweep_task.lock() = Some(handle);
    }

    /// Record one message from `author`.
    ///
    /// Returns `Ok(None)` when the author is inside the rate-limit window
    /// (the message is not counted and no stats update should be emitted);
    /// otherwise the refreshed snapshot.
    pub async fn record_author_activity(
        &self,
        author: &ChatAuthor,
    ) -> Result<Option<ChannelStats>> {
        if !self.rate_limit.is_zero() {
            let now = Instant::now();
            let mut seen = self.last_seen.lock();
            if let Some(last) = seen.get(&author.id) {
                if now.duration_since(*last) < self.rate_limit {
                    return Ok(None);
                }
            }
            seen.insert(author.id.clone(), now);
            if seen.len() > RATE_MAP_PRUNE_THRESHOLD {
                let window = self.rate_limit;
                seen.retain(|_, last| now.duration_since(*last) < window);
            }
        }

        self.store.record(author).await?;
        self.cached.lock().take();

        let stats = self.store.fetch().await?;
        *self.cached.lock() = Some((Instant::now(), stats.clone()));
        Ok(Some(stats))
    }

    /// Current aggregate state, served from the cache within its TTL.
    pub async fn snapshot(&self) -> Result<ChannelStats> {
        if let Some((at, stats)) = self.cached.lock().as_ref() {
            if at.elapsed() < self.cache_ttl {
                return Ok(stats.clone());
            }
        }

        let stats = self.store.fetch().await?;
        *self.cached.lock() = Some((Instant::now(), stats.clone()));
        Ok(stats)
    }

    /// Clear all counters for the channel.
    pub async fn reset(&self) -> Result<()> {
        self.store.reset().await?;
        self.cached.lock().take();
        self.last_seen.lock().clear();
        Ok(())
    }

    /// Release backend resources. Idempotent.
    pub async fn cleanup(&self) -> Result<()> {
        if let Some(handle) = self.sweep_task.lock().take() {
            handle.abort();
        }
        self.cached.lock().take();
        self.last_seen.lock().clear();
        self.store.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthorRoles;
    use tokio::time::advance;

    fn author(id: &str) -> ChatAuthor {
        ChatAuthor {
            id: id.to_string(),
            username: id.to_string(),
            display_name: id.to_string(),
            avatar_url: None,
            roles: AuthorRoles::default(),
            badges: vec![],
        }
    }

    fn memory_aggregator() -> StatsAggregator {
        StatsAggregator::from_store(Arc::new(MemoryStore::new()), &StatsConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_suppresses_rapid_updates() {
        let agg = memory_aggregator();

        let first = agg.record_author_activity(&author("u1")).await.expect("record");
        assert!(first.is_some());
        assert_eq!(first.expect("stats").total_messages, 1);

        // inside the 100ms window: no-op
        let second = agg.record_author_activity(&author("u1")).await.expect("record");
        assert!(second.is_none());

        let stats = agg.snapshot().await.expect("snapshot");
        assert_eq!(stats.total_messages, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_window_expires() {
        let agg = memory_aggregator();

        agg.record_author_activity(&author("u1")).await.expect("record");
        advance(Duration::from_millis(101)).await;
        let after = agg.record_author_activity(&author("u1")).await.expect("record");
        assert_eq!(after.expect("stats").total_messages, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_is_per_author() {
        let agg = memory_aggregator();

        assert!(agg
            .record_author_activity(&author("u1"))
            .await
            .expect("record")
            .is_some());
        assert!(agg
            .record_author_activity(&author("u2"))
            .await
            .expect("record")
            .is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_cache_serves_repeat_reads() {
        let store = Arc::new(MemoryStore::new());
        let agg = StatsAggregator::from_store(store.clone(), &StatsConfig::default());

        agg.record_author_activity(&author("u1")).await.expect("record");
        let first = agg.snapshot().await.expect("snapshot");

        // mutate the store behind the cache; within TTL the stale copy wins
        store.record(&author("u2")).await.expect("record");
        let second = agg.snapshot().await.expect("snapshot");
        assert_eq!(first, second);

        // past the TTL the backend is consulted again
        advance(Duration::from_secs(6)).await;
        let third = agg.snapshot().await.expect("snapshot");
        assert_eq!(third.total_messages, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_invalidates_snapshot_cache() {
        let agg = memory_aggregator();

        agg.record_author_activity(&author("u1")).await.expect("record");
        let before = agg.snapshot().await.expect("snapshot");
        assert_eq!(before.total_messages, 1);

        advance(Duration::from_millis(200)).await;
        agg.record_author_activity(&author("u2")).await.expect("record");

        // still inside the original cache TTL, but the write refreshed it
        let after = agg.snapshot().await.expect("snapshot");
        assert_eq!(after.total_messages, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_counters_and_cache() {
        let agg = memory_aggregator();

        agg.record_author_activity(&author("u1")).await.expect("record");
        agg.reset().await.expect("reset");

        let stats = agg.snapshot().await.expect("snapshot");
        assert_eq!(stats.total_messages, 0);
        assert!(stats.unique_users.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_shared_backend_falls_back_to_memory() {
        let stats_cfg = StatsConfig {
            backend: StatsBackend::Redis,
            ..StatsConfig::default()
        };
        let redis_cfg = RedisConfig {
            // nothing listens here
            url: "redis://127.0.0.1:1".to_string(),
            connect_timeout_seconds: 1,
            ..RedisConfig::default()
        };

        let agg = StatsAggregator::connect("fallback_channel", &stats_cfg, &redis_cfg).await;

        // counters still function on the local store
        let stats = agg
            .record_author_activity(&author("u1"))
            .await
            .expect("record")
            .expect("stats");
        assert_eq!(stats.total_messages, 1);
        assert_eq!(agg.snapshot().await.expect("snapshot").total_messages, 1);
    }

    #[tokio::test]
    async fn test_disabled_stats_use_noop_store() {
        let stats_cfg = StatsConfig {
            enabled: false,
            backend: StatsBackend::Redis,
            ..StatsConfig::default()
        };

        let agg =
            StatsAggregator::connect("disabled_channel", &stats_cfg, &RedisConfig::default()).await;

        let stats = agg
            .record_author_activity(&author("u1"))
            .await
            .expect("record")
            .expect("stats");
        assert_eq!(stats.total_messages, 0);
        assert!(stats.unique_users.is_empty());
    }
}
