use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ChannelStats, ChatAuthor};

/// Backend contract for per-channel chat counters.
///
/// Implementations must tolerate concurrent callers; the aggregator performs
/// rate limiting and caching above this layer.
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Record one message from `author`: increments the channel total and the
    /// author's count, and refreshes the author's profile fields.
    async fn record(&self, author: &ChatAuthor) -> Result<()>;

    /// Read the current aggregate state.
    async fn fetch(&self) -> Result<ChannelStats>;

    /// Clear all counters for the channel.
    async fn reset(&self) -> Result<()>;

    /// Release backend resources. Idempotent.
    async fn close(&self) -> Result<()>;

    /// Evict authors inactive longer than the backend's idle TTL.
    /// Returns the number evicted. Local backends have nothing to sweep.
    async fn evict_idle(&self) -> Result<u64> {
        Ok(0)
    }
}

/// Store used when stats collection is disabled: every counter stays zero
/// and no backend traffic occurs.
pub struct NoopStore;

#[async_trait]
impl StatsStore for NoopStore {
    async fn record(&self, _author: &ChatAuthor) -> Result<()> {
        Ok(())
    }

    async fn fetch(&self) -> Result<ChannelStats> {
        Ok(ChannelStats::default())
    }

    async fn reset(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthorRoles;

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

    #[tokio::test]
    async fn test_noop_store_counts_nothing() {
        let store = NoopStore;
        store.record(&author("a")).await.expect("record");
        store.record(&author("b")).await.expect("record");

        let stats = store.fetch().await.expect("fetch");
        assert_eq!(stats.total_messages, 0);
        assert!(stats.unique_users.is_empty());
    }
}
