//! Shared Redis-backed stats store.
//!
//! Key layout (all under the configured prefix):
//! - `stats:{channel}` — hash with `total_messages`
//! - `stats:{channel}:users:{author_id}` — per-author hash
//! - `stats:{channel}:activity` — sorted set of author ids scored by last
//!   activity (ms since epoch), used for oldest-first eviction and idle sweeps
//!
//! All keys expire 24h after the last write, so a dead channel leaves nothing
//! behind even if the sweep never runs.

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

use super::store::StatsStore;
use crate::config::{RedisConfig, StatsConfig};
use crate::error::{Error, Result};
use crate::models::{AuthorRoles, ChannelStats, ChatAuthor, UserStat};

pub struct RedisStore {
    conn: ConnectionManager,
    key_prefix: String,
    channel: String,
    max_tracked_authors: u64,
    idle_ttl: Duration,
}

impl RedisStore {
    /// Connect to the shared backend with a bounded timeout.
    ///
    /// Failures here are surfaced to the aggregator, which falls back to the
    /// in-memory store.
    pub async fn connect(
        redis_cfg: &RedisConfig,
        stats_cfg: &StatsConfig,
        channel: &str,
    ) -> Result<Self> {
        let client = redis::Client::open(redis_cfg.url.as_str())?;
        let connect = client.get_connection_manager();
        let timeout = Duration::from_secs(redis_cfg.connect_timeout_seconds);
        let conn = tokio::time::timeout(timeout, connect)
            .await
            .map_err(|_| {
                Error::Internal(format!(
                    "redis connect timed out after {}s",
                    redis_cfg.connect_timeout_seconds
                ))
            })??;

        Ok(Self {
            conn,
            key_prefix: redis_cfg.key_prefix.clone(),
            channel: channel.to_string(),
            max_tracked_authors: stats_cfg.max_tracked_authors,
            idle_ttl: Duration::from_secs(stats_cfg.idle_author_ttl_seconds),
        })
    }

    fn stats_key(&self) -> String {
        format!("{}stats:{}", self.key_prefix, self.channel)
    }

    fn user_key(&self, author_id: &str) -> String {
        format!("{}stats:{}:users:{}", self.key_prefix, self.channel, author_id)
    }

    fn activity_key(&self) -> String {
        format!("{}stats:{}:activity", self.key_prefix, self.channel)
    }

    /// Evict oldest-by-activity authors until the tracked count is back under
    /// the ceiling.
    async fn enforce_capacity(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let tracked: u64 = conn.zcard(self.activity_key()).await?;
        if tracked <= self.max_tracked_authors {
            return Ok(());
        }

        let excess = tracked - self.max_tracked_authors;
        let evicted: Vec<(String, f64)> = conn
            .zpopmin(self.activity_key(), excess as isize)
            .await?;
        if evicted.is_empty() {
            return Ok(());
        }

        let keys: Vec<String> = evicted.iter().map(|(id, _)| self.user_key(id)).collect();
        let _: () = conn.del(keys).await?;
        tracing::debug!(
            channel = %self.channel,
            evicted = evicted.len(),
            "Evicted oldest authors over capacity ceiling"
        );
        Ok(())
    }

    async fn fetch_user(&self, author_id: &str) -> Result<Option<UserStat>> {
        let mut conn = self.conn.clone();
        let fields: std::collections::HashMap<String, String> =
            conn.hgetall(self.user_key(author_id)).await?;
        if fields.is_empty() {
            return Ok(None);
        }

        let roles: AuthorRoles = fields
            .get("roles")
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();
        let avatar_url = fields
            .get("avatar_url")
            .filter(|url| !url.is_empty())
            .cloned();

        Ok(Some(UserStat {
            id: author_id.to_string(),
            username: fields.get("username").cloned().unwrap_or_default(),
            display_name: fields.get("display_name").cloned().unwrap_or_default(),
            avatar_url,
            roles,
            message_count: fields
                .get("message_count")
                .and_then(|count| count.parse().ok())
                .unwrap_or(0),
        }))
    }
}

#[async_trait]
impl StatsStore for RedisStore {
    async fn record(&self, author: &ChatAuthor) -> Result<()> {
        let mut conn = self.conn.clone();
        let stats_key = self.stats_key();
        let user_key = self.user_key(&author.id);
        let activity_key = self.activity_key();
        let now_ms = Utc::now().timestamp_millis();
        let ttl = self.idle_ttl.as_secs() as i64;
        let roles = serde_json::to_string(&author.roles)?;

        let mut pipe = redis::pipe();
        pipe.atomic()
            .hincr(&stats_key, "total_messages", 1)
            .hincr(&user_key, "message_count", 1)
            .hset_multiple(
                &user_key,
                &[
                    ("username", author.username.clone()),
                    ("display_name", author.display_name.clone()),
                    ("avatar_url", author.avatar_url.clone().unwrap_or_default()),
                    ("roles", roles),
                ],
            )
            .zadd(&activity_key, &author.id, now_ms)
            .expire(&stats_key, ttl)
            .expire(&user_key, ttl)
            .expire(&activity_key, ttl);
        let _: () = pipe.query_async(&mut conn).await?;

        self.enforce_capacity().await
    }

    async fn fetch(&self) -> Result<ChannelStats> {
        let mut conn = self.conn.clone();
        let total_messages: Option<u64> = conn.hget(self.stats_key(), "total_messages").await?;
        let author_ids: Vec<String> = conn.zrange(self.activity_key(), 0, -1).await?;

        let mut unique_users = Vec::with_capacity(author_ids.len());
        for id in &author_ids {
            // an author can expire between the zrange and the hgetall
            if let Some(user) = self.fetch_user(id).await? {
                unique_users.push(user);
            }
        }

        Ok(ChannelStats {
            total_messages: total_messages.unwrap_or(0),
            unique_users,
        })
    }

    async fn reset(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let author_ids: Vec<String> = conn.zrange(self.activity_key(), 0, -1).await?;

        let mut keys: Vec<String> = author_ids.iter().map(|id| self.user_key(id)).collect();
        keys.push(self.stats_key());
        keys.push(self.activity_key());
        let _: () = conn.del(keys).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        // ConnectionManager connections are pooled and closed on drop
        Ok(())
    }

    async fn evict_idle(&self) -> Result<u64> {
        let mut conn = self.conn.clone();
        let cutoff = Utc::now().timestamp_millis() - self.idle_ttl.as_millis() as i64;
        let idle_ids: Vec<String> = conn
            .zrangebyscore(self.activity_key(), "-inf", cutoff)
            .await?;
        if idle_ids.is_empty() {
            return Ok(0);
        }

        let keys: Vec<String> = idle_ids.iter().map(|id| self.user_key(id)).collect();
        let _: () = conn.del(keys).await?;
        let _: () = conn
            .zrembyscore(self.activity_key(), "-inf", cutoff)
            .await?;

        tracing::debug!(
            channel = %self.channel,
            evicted = idle_ids.len(),
            "Swept idle authors"
        );
        Ok(idle_ids.len() as u64)
    }
}
