use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::Mutex;

use super::store::StatsStore;
use crate::error::Result;
use crate::models::{ChannelStats, ChatAuthor, UserStat};

/// In-process store. Unbounded by design: capacity discipline applies to the
/// shared backend only.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    total_messages: u64,
    // insertion order keeps snapshots deterministic
    users: IndexMap<String, UserStat>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatsStore for MemoryStore {
    async fn record(&self, author: &ChatAuthor) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.total_messages += 1;

        let entry = inner
            .users
            .entry(author.id.clone())
            .or_insert_with(|| UserStat {
                id: author.id.clone(),
                username: author.username.clone(),
                display_name: author.display_name.clone(),
                avatar_url: author.avatar_url.clone(),
                roles: author.roles,
                message_count: 0,
            });
        entry.message_count += 1;
        entry.username = author.username.clone();
        entry.display_name = author.display_name.clone();
        entry.avatar_url = author.avatar_url.clone();
        entry.roles = author.roles;
        Ok(())
    }

    async fn fetch(&self) -> Result<ChannelStats> {
        let inner = self.inner.lock();
        Ok(ChannelStats {
            total_messages: inner.total_messages,
            unique_users: inner.users.values().cloned().collect(),
        })
    }

    async fn reset(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.total_messages = 0;
        inner.users.clear();
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.reset().await
    }
}
