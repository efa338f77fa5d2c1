//! Constructs platform handlers for the registry.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use chatcast_core::config::{RedisConfig, StatsConfig};
use chatcast_core::handler::{ChannelHandler, HandlerFactory};
use chatcast_core::models::{ChannelKey, IdentifierKind, Platform};
use chatcast_core::stats::StatsAggregator;
use chatcast_core::{Error, Result};

use crate::tiktok::TiktokHandler;
use crate::twitch::TwitchHandler;
use crate::youtube::YoutubeHandler;

// the scraping endpoints refuse default library user agents
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds one handler per channel, each with its own stats aggregator.
pub struct PlatformHandlerFactory {
    http: reqwest::Client,
    stats_cfg: StatsConfig,
    redis_cfg: RedisConfig,
}

impl PlatformHandlerFactory {
    pub fn new(stats_cfg: StatsConfig, redis_cfg: RedisConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|err| Error::Internal(format!("http client build failed: {err}")))?;
        Ok(Self {
            http,
            stats_cfg,
            redis_cfg,
        })
    }
}

#[async_trait]
impl HandlerFactory for PlatformHandlerFactory {
    async fn create(
        &self,
        key: &ChannelKey,
        identifier_kind: IdentifierKind,
    ) -> Result<Arc<dyn ChannelHandler>> {
        let stats =
            StatsAggregator::connect(&key.to_string(), &self.stats_cfg, &self.redis_cfg).await;

        // identifier kinds only disambiguate YouTube lookups; the other
        // platforms address channels by username alone
        Ok(match key.platform {
            Platform::Youtube => Arc::new(YoutubeHandler::new(
                &key.identifier,
                identifier_kind,
                self.http.clone(),
                stats,
            )),
            Platform::Tiktok => Arc::new(TiktokHandler::new(
                &key.identifier,
                self.http.clone(),
                stats,
            )),
            Platform::Twitch => Arc::new(TwitchHandler::new(&key.identifier, stats)),
        })
    }
}
