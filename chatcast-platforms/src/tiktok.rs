//! TikTok LIVE chat via the webcast polling API.
//!
//! The adapter resolves the user's current room id from their live page,
//! confirms through the webcast room info endpoint that the room is actually
//! live (status 2), then polls the message feed with a moving cursor. A room
//! status other than live at start time reports not-live rather than failing.

use chrono::{TimeZone, Utc};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use uuid::Uuid;

use async_trait::async_trait;
use chatcast_core::handler::{ChannelHandler, StartOutcome};
use chatcast_core::models::{
    AuthorRoles, Badge, BadgeKind, ChannelStats, ChatAuthor, ChatEvent, ElementKind,
    MessageContent, MessageElement, MessageMetadata, Platform,
};
use chatcast_core::stats::StatsAggregator;
use chatcast_core::{Error, Result};

use crate::ingest::{EventPump, EVENT_CHANNEL_CAPACITY};

pub const DEFAULT_BASE_URL: &str = "https://www.tiktok.com";
pub const DEFAULT_WEBCAST_URL: &str = "https://webcast.tiktok.com";
const WEBCAST_AID: &str = "1988";
const POLL_INTERVAL: Duration = Duration::from_millis(1000);
const FAILURE_BACKOFF: Duration = Duration::from_secs(5);
const MAX_CONSECUTIVE_FAILURES: u32 = 5;
// feed polls between room status rechecks
const STATUS_CHECK_EVERY: u32 = 30;

const ROOM_STATUS_LIVE: i64 = 2;

static ROOM_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""roomId":"(\d+)""#).expect("valid regex"));

pub struct TiktokHandler {
    username: String,
    http: reqwest::Client,
    stats: Arc<StatsAggregator>,
    cancel: CancellationToken,
    base_url: String,
    webcast_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct RoomInfoResponse {
    #[serde(default)]
    data: RoomInfo,
}

#[derive(Debug, Default, Deserialize)]
struct RoomInfo {
    #[serde(default)]
    status: i64,
}

#[derive(Debug, Default, Deserialize)]
struct ChatFeedResponse {
    #[serde(default)]
    data: ChatFeed,
}

#[derive(Debug, Default, Deserialize)]
struct ChatFeed {
    #[serde(default)]
    messages: Vec<FeedEnvelope>,
    #[serde(default)]
    cursor: String,
}

#[derive(Debug, Deserialize)]
struct FeedEnvelope {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatMessage {
    #[serde(default)]
    msg_id: String,
    /// Epoch milliseconds.
    #[serde(default)]
    create_time: i64,
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    unique_id: String,
    #[serde(default)]
    nickname: String,
    #[serde(default)]
    profile_picture_url: Option<String>,
    #[serde(default)]
    is_moderator: bool,
    #[serde(default)]
    is_subscriber: bool,
    #[serde(default)]
    user_badges: Vec<UserBadge>,
    #[serde(default)]
    comment: String,
}

#[derive(Debug, Deserialize)]
struct UserBadge {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: Option<String>,
}

impl TiktokHandler {
    #[must_use]
    pub fn new(identifier: &str, http: reqwest::Client, stats: Arc<StatsAggregator>) -> Self {
        Self {
            username: identifier.trim_start_matches('@').to_lowercase(),
            http,
            stats,
            cancel: CancellationToken::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            webcast_url: DEFAULT_WEBCAST_URL.to_string(),
        }
    }

    /// Point both the page and webcast endpoints at one host. Test hook.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        self.base_url.clone_from(&base);
        self.webcast_url = base;
        self
    }

    async fn resolve_room_id(&self) -> Result<String> {
        let url = format!("{}/@{}/live", self.base_url, self.username);
        let html = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| Error::Ingestion(format!("tiktok live page fetch failed: {err}")))?
            .text()
            .await
            .map_err(|err| Error::Ingestion(format!("tiktok live page read failed: {err}")))?;

        ROOM_ID_RE
            .captures(&html)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| Error::NotFound(format!("no live room for @{}", self.username)))
    }
}

async fn fetch_room_status(
    http: &reqwest::Client,
    webcast_url: &str,
    room_id: &str,
) -> Result<i64> {
    let url = format!("{webcast_url}/webcast/room/info/");
    let info = http
        .get(&url)
        .query(&[("aid", WEBCAST_AID), ("room_id", room_id)])
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|err| Error::Ingestion(format!("tiktok room info failed: {err}")))?
        .json::<RoomInfoResponse>()
        .await
        .map_err(|err| Error::Ingestion(format!("tiktok room info decode failed: {err}")))?;
    Ok(info.data.status)
}

#[async_trait]
impl ChannelHandler for TiktokHandler {
    fn platform(&self) -> Platform {
        Platform::Tiktok
    }

    async fn start(&self) -> Result<StartOutcome> {
        let room_id = match self.resolve_room_id().await {
            Ok(room_id) => room_id,
            Err(Error::NotFound(_)) => return Ok(StartOutcome::NotLive),
            Err(err) => return Err(err),
        };
        if fetch_room_status(&self.http, &self.webcast_url, &room_id).await? != ROOM_STATUS_LIVE {
            return Ok(StartOutcome::NotLive);
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let pump = EventPump::new(tx, self.stats.clone());
        let poller = Poller {
            http: self.http.clone(),
            webcast_url: self.webcast_url.clone(),
            room_id,
            cancel: self.cancel.clone(),
        };
        tokio::spawn(async move {
            poller.run(pump).await;
        });

        Ok(StartOutcome::Live(rx))
    }

    async fn cleanup(&self) -> Result<()> {
        self.cancel.cancel();
        self.stats.cleanup().await
    }

    async fn current_stats(&self) -> Result<ChannelStats> {
        self.stats.snapshot().await
    }
}

struct Poller {
    http: reqwest::Client,
    webcast_url: String,
    room_id: String,
    cancel: CancellationToken,
}

impl Poller {
    async fn run(self, pump: EventPump) {
        if !pump.started(self.room_id.clone()).await {
            return;
        }

        let mut cursor = String::new();
        let mut delay = POLL_INTERVAL;
        let mut failures: u32 = 0;
        let mut polls: u32 = 0;

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => return,
                () = tokio::time::sleep(delay) => {}
            }

            polls += 1;
            if polls % STATUS_CHECK_EVERY == 0 {
                match fetch_room_status(&self.http, &self.webcast_url, &self.room_id).await {
                    Ok(ROOM_STATUS_LIVE) => {}
                    Ok(_) => {
                        pump.ended().await;
                        return;
                    }
                    Err(err) => {
                        warn!(room_id = %self.room_id, error = %err, "TikTok status check failed");
                    }
                }
            }

            match self.fetch_feed(&cursor).await {
                Ok(feed) => {
                    failures = 0;
                    delay = POLL_INTERVAL;
                    if !feed.cursor.is_empty() {
                        cursor = feed.cursor;
                    }
                    for envelope in feed.messages {
                        if envelope.kind != "WebcastChatMessage" {
                            continue;
                        }
                        let Ok(message) = serde_json::from_value::<ChatMessage>(envelope.data)
                        else {
                            continue;
                        };
                        if !pump.chat(transform_chat(&message, &self.room_id)).await {
                            return;
                        }
                    }
                }
                Err(err) => {
                    failures += 1;
                    warn!(
                        room_id = %self.room_id,
                        failures,
                        error = %err,
                        "TikTok feed poll failed"
                    );
                    if failures >= MAX_CONSECUTIVE_FAILURES {
                        pump.error(format!("chat feed polling failed: {err}")).await;
                        pump.ended().await;
                        return;
                    }
                    delay = FAILURE_BACKOFF;
                }
            }

            if pump.is_closed() {
                return;
            }
        }
    }

    async fn fetch_feed(&self, cursor: &str) -> Result<ChatFeed> {
        let url = format!("{}/webcast/im/fetch/", self.webcast_url);
        let feed = self
            .http
            .get(&url)
            .query(&[
                ("aid", WEBCAST_AID),
                ("room_id", self.room_id.as_str()),
                ("cursor", cursor),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| Error::Ingestion(format!("tiktok feed fetch failed: {err}")))?
            .json::<ChatFeedResponse>()
            .await
            .map_err(|err| Error::Ingestion(format!("tiktok feed decode failed: {err}")))?;
        Ok(feed.data)
    }
}

fn transform_badges(badges: &[UserBadge]) -> Vec<Badge> {
    badges
        .iter()
        .map(|badge| Badge {
            kind: if badge.kind == "pm_mt_moderator_im" {
                BadgeKind::Moderator
            } else {
                BadgeKind::Custom
            },
            label: badge.name.clone(),
            image_url: badge.url.clone(),
        })
        .collect()
}

fn transform_chat(message: &ChatMessage, room_id: &str) -> ChatEvent {
    let text = message.comment.clone();
    ChatEvent {
        platform: Platform::Tiktok,
        timestamp: Utc
            .timestamp_millis_opt(message.create_time)
            .single()
            .unwrap_or_else(Utc::now),
        message_id: if message.msg_id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            message.msg_id.clone()
        },
        room_id: room_id.to_string(),
        author: ChatAuthor {
            id: message.user_id.clone(),
            username: message.unique_id.clone(),
            display_name: message.nickname.clone(),
            avatar_url: message.profile_picture_url.clone(),
            roles: AuthorRoles {
                // chat payloads carry no broadcaster or verified flags
                broadcaster: false,
                moderator: message.is_moderator,
                subscriber: message.is_subscriber,
                verified: false,
            },
            badges: transform_badges(&message.user_badges),
        },
        content: MessageContent {
            raw: text.clone(),
            formatted: text.clone(),
            sanitized: text.clone(),
            elements: vec![MessageElement {
                kind: ElementKind::Text,
                position: (0, text.chars().count()),
                value: text,
                metadata: None,
            }],
        },
        metadata: MessageMetadata::chat(),
    }
}
