//! YouTube live chat via the public InnerTube endpoint.
//!
//! The adapter scrapes the channel's live page once to discover the API key,
//! the live chat continuation token, and the video id, then polls
//! `youtubei/v1/live_chat/get_live_chat` with successive continuations. A
//! page without a continuation (or marked as a replay) means the channel is
//! not currently live.

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use async_trait::async_trait;
use chatcast_core::handler::{ChannelHandler, StartOutcome};
use chatcast_core::models::{
    AuthorRoles, Badge, BadgeKind, ChannelStats, ChatAuthor, ChatEvent, ElementKind,
    EmoteMetadata, IdentifierKind, MessageContent, MessageElement, MessageKind, MessageMetadata,
    MonetaryData, Platform, Sticker,
};
use chatcast_core::stats::StatsAggregator;
use chatcast_core::{Error, Result};

use crate::ingest::{EventPump, EVENT_CHANNEL_CAPACITY};

pub const DEFAULT_BASE_URL: &str = "https://www.youtube.com";
const INNERTUBE_CLIENT_VERSION: &str = "2.20240731.04.00";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
const FAILURE_BACKOFF: Duration = Duration::from_secs(5);
const MAX_CONSECUTIVE_FAILURES: u32 = 5;

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""INNERTUBE_API_KEY":"([^"]+)""#).expect("valid regex")
});
static CONTINUATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""continuation":"([^"]+)""#).expect("valid regex")
});
static CANONICAL_VIDEO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<link rel="canonical" href="[^"]*[?&]v=([\w-]+)""#).expect("valid regex")
});
static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""videoId":"([^"]+)""#).expect("valid regex")
});

pub struct YoutubeHandler {
    identifier: String,
    kind: IdentifierKind,
    http: reqwest::Client,
    stats: Arc<StatsAggregator>,
    cancel: CancellationToken,
    base_url: String,
}

/// Live chat bootstrap data scraped from the watch page.
#[derive(Debug, PartialEq, Eq)]
enum LivePage {
    Live {
        api_key: String,
        continuation: String,
        video_id: String,
    },
    NotLive,
}

impl YoutubeHandler {
    #[must_use]
    pub fn new(
        identifier: &str,
        kind: IdentifierKind,
        http: reqwest::Client,
        stats: Arc<StatsAggregator>,
    ) -> Self {
        Self {
            identifier: identifier.to_string(),
            kind,
            http,
            stats,
            cancel: CancellationToken::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn live_page_url(&self) -> String {
        match self.kind {
            IdentifierKind::Username => {
                let handle = self.identifier.trim_start_matches('@');
                format!("{}/@{}/live", self.base_url, handle)
            }
            IdentifierKind::ChannelId => {
                format!("{}/channel/{}/live", self.base_url, self.identifier)
            }
            IdentifierKind::LiveId => format!("{}/watch?v={}", self.base_url, self.identifier),
        }
    }
}

#[async_trait]
impl ChannelHandler for YoutubeHandler {
    fn platform(&self) -> Platform {
        Platform::Youtube
    }

    async fn start(&self) -> Result<StartOutcome> {
        let url = self.live_page_url();
        let html = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| Error::Ingestion(format!("youtube live page fetch failed: {err}")))?
            .text()
            .await
            .map_err(|err| Error::Ingestion(format!("youtube live page read failed: {err}")))?;

        let LivePage::Live {
            api_key,
            continuation,
            video_id,
        } = parse_live_page(&html)?
        else {
            return Ok(StartOutcome::NotLive);
        };

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let pump = EventPump::new(tx, self.stats.clone());
        let poller = Poller {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            api_key,
            video_id,
            cancel: self.cancel.clone(),
        };
        tokio::spawn(async move {
            poller.run(pump, continuation).await;
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
    base_url: String,
    api_key: String,
    video_id: String,
    cancel: CancellationToken,
}

impl Poller {
    async fn run(self, pump: EventPump, initial_continuation: String) {
        if !pump.started(self.video_id.clone()).await {
            return;
        }

        let mut continuation = initial_continuation;
        let mut delay = DEFAULT_POLL_INTERVAL;
        let mut failures: u32 = 0;

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => return,
                () = tokio::time::sleep(delay) => {}
            }

            match self.fetch_page(&continuation).await {
                Ok(payload) => {
                    failures = 0;
                    let Some(chat) =
                        payload.pointer("/continuationContents/liveChatContinuation")
                    else {
                        // the live chat is gone; the stream has ended
                        pump.ended().await;
                        return;
                    };

                    for event in extract_chat_events(chat, &self.video_id) {
                        if !pump.chat(event).await {
                            return;
                        }
                    }

                    match next_continuation(chat) {
                        Some((next, timeout)) => {
                            continuation = next;
                            delay = timeout.max(DEFAULT_POLL_INTERVAL);
                        }
                        None => {
                            pump.ended().await;
                            return;
                        }
                    }
                }
                Err(err) => {
                    failures += 1;
                    warn!(
                        video_id = %self.video_id,
                        failures,
                        error = %err,
                        "YouTube live chat poll failed"
                    );
                    if failures >= MAX_CONSECUTIVE_FAILURES {
                        pump.error(format!("live chat polling failed: {err}")).await;
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

    async fn fetch_page(&self, continuation: &str) -> Result<Value> {
        let url = format!(
            "{}/youtubei/v1/live_chat/get_live_chat?key={}&prettyPrint=false",
            self.base_url, self.api_key
        );
        let body = json!({
            "context": {
                "client": {
                    "clientName": "WEB",
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "continuation": continuation,
        });

        let payload = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| Error::Ingestion(format!("get_live_chat request failed: {err}")))?
            .json::<Value>()
            .await
            .map_err(|err| Error::Ingestion(format!("get_live_chat decode failed: {err}")))?;
        Ok(payload)
    }
}

fn parse_live_page(html: &str) -> Result<LivePage> {
    if html.contains(r#""isReplay":true"#) {
        return Ok(LivePage::NotLive);
    }
    let Some(continuation) = CONTINUATION_RE
        .captures(html)
        .map(|caps| caps[1].to_string())
    else {
        return Ok(LivePage::NotLive);
    };

    let api_key = API_KEY_RE
        .captures(html)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| Error::Ingestion("live page had no InnerTube api key".to_string()))?;
    let video_id = CANONICAL_VIDEO_RE
        .captures(html)
        .or_else(|| VIDEO_ID_RE.captures(html))
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| Error::Ingestion("live page had no video id".to_string()))?;

    Ok(LivePage::Live {
        api_key,
        continuation,
        video_id,
    })
}

/// Next continuation token and poll delay from a chat page.
fn next_continuation(chat: &Value) -> Option<(String, Duration)> {
    let continuation = chat.get("continuations")?.as_array()?.first()?;
    for key in [
        "invalidationContinuationData",
        "timedContinuationData",
        "reloadContinuationData",
    ] {
        if let Some(data) = continuation.get(key) {
            let token = data.get("continuation")?.as_str()?.to_string();
            let timeout = data
                .get("timeoutMs")
                .and_then(Value::as_u64)
                .map_or(DEFAULT_POLL_INTERVAL, Duration::from_millis);
            return Some((token, timeout));
        }
    }
    None
}

fn extract_chat_events(chat: &Value, video_id: &str) -> Vec<ChatEvent> {
    let Some(actions) = chat.get("actions").and_then(Value::as_array) else {
        return Vec::new();
    };
    actions
        .iter()
        .filter_map(|action| action.pointer("/addChatItemAction/item"))
        .filter_map(|item| transform_chat_item(item, video_id))
        .collect()
}

fn transform_chat_item(item: &Value, video_id: &str) -> Option<ChatEvent> {
    let (renderer, metadata) = if let Some(renderer) = item.get("liveChatTextMessageRenderer") {
        (renderer, MessageMetadata::chat())
    } else if let Some(renderer) = item.get("liveChatPaidMessageRenderer") {
        (renderer, paid_metadata(renderer, None))
    } else if let Some(renderer) = item.get("liveChatPaidStickerRenderer") {
        let sticker = transform_sticker(renderer);
        (renderer, paid_metadata(renderer, sticker))
    } else {
        // membership events, deletions, pinned banners
        debug!("Skipping unsupported chat item");
        return None;
    };

    let runs = renderer
        .pointer("/message/runs")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let content = transform_runs(runs);
    let (roles, badges) = transform_author_badges(renderer.get("authorBadges"));

    Some(ChatEvent {
        platform: Platform::Youtube,
        timestamp: parse_timestamp_usec(renderer.get("timestampUsec")),
        message_id: renderer
            .get("id")
            .and_then(Value::as_str)
            .map_or_else(|| Uuid::new_v4().to_string(), str::to_string),
        room_id: video_id.to_string(),
        author: ChatAuthor {
            id: renderer
                .get("authorExternalChannelId")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            username: author_name(renderer),
            display_name: author_name(renderer),
            avatar_url: renderer
                .pointer("/authorPhoto/thumbnails")
                .and_then(Value::as_array)
                .and_then(|thumbs| thumbs.last())
                .and_then(|thumb| thumb.get("url"))
                .and_then(Value::as_str)
                .map(str::to_string),
            roles,
            badges,
        },
        content,
        metadata,
    })
}

fn author_name(renderer: &Value) -> String {
    renderer
        .pointer("/authorName/simpleText")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn parse_timestamp_usec(raw: Option<&Value>) -> DateTime<Utc> {
    raw.and_then(Value::as_str)
        .and_then(|usec| usec.parse::<i64>().ok())
        .and_then(|usec| Utc.timestamp_micros(usec).single())
        .unwrap_or_else(Utc::now)
}

/// Build the content forms from InnerTube message runs: `raw` inlines emoji
/// shortcodes as plain text, `formatted` wraps them in colons, `sanitized`
/// keeps text runs only. Element positions are char spans within `raw`.
fn transform_runs(runs: &[Value]) -> MessageContent {
    let mut raw = String::new();
    let mut formatted = String::new();
    let mut sanitized = String::new();
    let mut elements = Vec::with_capacity(runs.len());
    let mut position = 0usize;

    for run in runs {
        if let Some(text) = run.get("text").and_then(Value::as_str) {
            let len = text.chars().count();
            elements.push(MessageElement {
                kind: ElementKind::Text,
                value: text.to_string(),
                position: (position, position + len),
                metadata: None,
            });
            raw.push_str(text);
            formatted.push_str(text);
            sanitized.push_str(text);
            position += len;
        } else if let Some(emoji) = run.get("emoji") {
            let shortcut = emoji
                .pointer("/shortcuts/0")
                .and_then(Value::as_str)
                .map(|s| s.trim_matches(':').to_string());
            let label = emoji
                .pointer("/image/accessibility/accessibilityData/label")
                .and_then(Value::as_str)
                .map(str::to_string);
            let emoji_text = shortcut
                .clone()
                .or_else(|| label.clone())
                .unwrap_or_default();

            let len = emoji_text.chars().count();
            elements.push(MessageElement {
                kind: ElementKind::Emote,
                value: emoji_text.clone(),
                position: (position, position + len),
                metadata: Some(EmoteMetadata {
                    url: emoji
                        .pointer("/image/thumbnails")
                        .and_then(Value::as_array)
                        .and_then(|thumbs| thumbs.last())
                        .and_then(|thumb| thumb.get("url"))
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    alt: label,
                    is_custom: emoji
                        .get("isCustomEmoji")
                        .and_then(Value::as_bool)
                        .unwrap_or(false),
                }),
            });
            raw.push_str(&emoji_text);
            formatted.push(':');
            formatted.push_str(&emoji_text);
            formatted.push(':');
            position += len;
        }
    }

    MessageContent {
        raw,
        formatted,
        sanitized,
        elements,
    }
}

fn transform_author_badges(badges: Option<&Value>) -> (AuthorRoles, Vec<Badge>) {
    let mut roles = AuthorRoles::default();
    let mut out = Vec::new();
    let Some(badges) = badges.and_then(Value::as_array) else {
        return (roles, out);
    };

    for badge in badges {
        let Some(renderer) = badge.get("liveChatAuthorBadgeRenderer") else {
            continue;
        };
        let label = renderer
            .get("tooltip")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match renderer.pointer("/icon/iconType").and_then(Value::as_str) {
            Some("OWNER") => roles.broadcaster = true,
            Some("MODERATOR") => roles.moderator = true,
            Some("VERIFIED") => roles.verified = true,
            _ => {
                // membership badges carry a custom thumbnail instead of an icon
                if let Some(thumbnail) = renderer.get("customThumbnail") {
                    roles.subscriber = true;
                    out.push(Badge {
                        kind: BadgeKind::Custom,
                        label,
                        image_url: thumbnail
                            .pointer("/thumbnails/0/url")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                    });
                }
            }
        }
    }
    (roles, out)
}

fn paid_metadata(renderer: &Value, sticker: Option<Sticker>) -> MessageMetadata {
    let amount = renderer
        .pointer("/purchaseAmountText/simpleText")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let color = renderer
        .get("bodyBackgroundColor")
        .or_else(|| renderer.get("backgroundColor"))
        .and_then(Value::as_u64)
        .map(|argb| format!("#{:06X}", argb & 0x00FF_FFFF));

    MessageMetadata {
        kind: MessageKind::SuperChat,
        monetary: Some(MonetaryData {
            formatted: amount.clone(),
            amount,
            color,
        }),
        sticker,
    }
}

fn transform_sticker(renderer: &Value) -> Option<Sticker> {
    let url = renderer
        .pointer("/sticker/thumbnails")
        .and_then(Value::as_array)
        .and_then(|thumbs| thumbs.last())
        .and_then(|thumb| thumb.get("url"))
        .and_then(Value::as_str)?
        .to_string();
    let alt = renderer
        .pointer("/sticker/accessibility/accessibilityData/label")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(Sticker { url, alt })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatcast_core::config::StatsConfig;
    use chatcast_core::handler::HandlerEvent;
    use chatcast_core::stats::MemoryStore;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn live_page_html(api_key: &str, continuation: &str, video_id: &str) -> String {
        format!(
            r#"<html><link rel="canonical" href="https://www.youtube.com/watch?v={video_id}">
            <script>var cfg = {{"INNERTUBE_API_KEY":"{api_key}","other":1}};
            var data = {{"continuation":"{continuation}"}};</script></html>"#
        )
    }

    fn text_message_item() -> Value {
        json!({
            "liveChatTextMessageRenderer": {
                "id": "msg-1",
                "timestampUsec": "1700000000000000",
                "authorExternalChannelId": "UCabc",
                "authorName": { "simpleText": "Alice" },
                "authorPhoto": { "thumbnails": [
                    { "url": "https://img/small.jpg" },
                    { "url": "https://img/big.jpg" }
                ]},
                "authorBadges": [
                    { "liveChatAuthorBadgeRenderer": {
                        "icon": { "iconType": "MODERATOR" },
                        "tooltip": "Moderator"
                    }},
                    { "liveChatAuthorBadgeRenderer": {
                        "customThumbnail": { "thumbnails": [{ "url": "https://img/member.png" }] },
                        "tooltip": "Member (1 year)"
                    }}
                ],
                "message": { "runs": [
                    { "text": "hello " },
                    { "emoji": {
                        "emojiId": "UCx/abc",
                        "shortcuts": [":wave:"],
                        "isCustomEmoji": true,
                        "image": {
                            "thumbnails": [{ "url": "https://img/wave.png" }],
                            "accessibility": { "accessibilityData": { "label": "wave" } }
                        }
                    }},
                    { "text": " there" }
                ]}
            }
        })
    }

    #[test]
    fn test_parse_live_page_extracts_session() {
        let html = live_page_html("KEY123", "CONT456", "vid789");
        let page = parse_live_page(&html).expect("parse");
        assert_eq!(
            page,
            LivePage::Live {
                api_key: "KEY123".into(),
                continuation: "CONT456".into(),
                video_id: "vid789".into(),
            }
        );
    }

    #[test]
    fn test_page_without_continuation_is_not_live() {
        let html = r#"<html>{"INNERTUBE_API_KEY":"KEY"}</html>"#;
        assert_eq!(parse_live_page(html).expect("parse"), LivePage::NotLive);
    }

    #[test]
    fn test_replay_page_is_not_live() {
        let html = format!(
            r#"{}{}"#,
            live_page_html("KEY", "CONT", "vid"),
            r#"{"isReplay":true}"#
        );
        assert_eq!(parse_live_page(&html).expect("parse"), LivePage::NotLive);
    }

    #[test]
    fn test_transform_runs_positions_and_forms() {
        let item = text_message_item();
        let event = transform_chat_item(&item, "vid789").expect("transform");

        assert_eq!(event.content.raw, "hello wave there");
        assert_eq!(event.content.formatted, "hello :wave: there");
        assert_eq!(event.content.sanitized, "hello  there");

        let elements = &event.content.elements;
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].position, (0, 6));
        assert_eq!(elements[1].kind, ElementKind::Emote);
        assert_eq!(elements[1].position, (6, 10));
        assert_eq!(elements[2].position, (10, 16));
        // spans cover raw contiguously
        assert_eq!(elements[2].position.1, event.content.raw.chars().count());

        let emote = elements[1].metadata.as_ref().expect("emote metadata");
        assert_eq!(emote.url.as_deref(), Some("https://img/wave.png"));
        assert!(emote.is_custom);
    }

    #[test]
    fn test_transform_author_roles_and_badges() {
        let item = text_message_item();
        let event = transform_chat_item(&item, "vid789").expect("transform");

        assert!(event.author.roles.moderator);
        assert!(event.author.roles.subscriber);
        assert!(!event.author.roles.broadcaster);
        assert_eq!(event.author.id, "UCabc");
        assert_eq!(event.author.avatar_url.as_deref(), Some("https://img/big.jpg"));
        assert_eq!(event.author.badges.len(), 1);
        assert_eq!(event.author.badges[0].label, "Member (1 year)");
        assert_eq!(event.timestamp.timestamp(), 1_700_000_000);
        assert_eq!(event.room_id, "vid789");
    }

    #[test]
    fn test_paid_message_metadata() {
        let item = json!({
            "liveChatPaidMessageRenderer": {
                "id": "paid-1",
                "timestampUsec": "1700000000000000",
                "authorExternalChannelId": "UCdef",
                "authorName": { "simpleText": "Bob" },
                "purchaseAmountText": { "simpleText": "$5.00" },
                "bodyBackgroundColor": 4294953512u64,
                "message": { "runs": [ { "text": "take my money" } ] }
            }
        });
        let event = transform_chat_item(&item, "vid").expect("transform");
        assert_eq!(event.metadata.kind, MessageKind::SuperChat);
        let monetary = event.metadata.monetary.expect("monetary");
        assert_eq!(monetary.amount, "$5.00");
        assert_eq!(monetary.color.as_deref(), Some("#FFCA28"));
    }

    #[test]
    fn test_unsupported_items_are_skipped() {
        let item = json!({ "liveChatMembershipItemRenderer": {} });
        assert!(transform_chat_item(&item, "vid").is_none());
    }

    #[test]
    fn test_next_continuation_prefers_invalidation_data() {
        let chat = json!({
            "continuations": [{
                "invalidationContinuationData": {
                    "continuation": "NEXT",
                    "timeoutMs": 2500
                }
            }]
        });
        let (token, timeout) = next_continuation(&chat).expect("continuation");
        assert_eq!(token, "NEXT");
        assert_eq!(timeout, Duration::from_millis(2500));
    }

    fn handler_for(server: &MockServer) -> YoutubeHandler {
        let stats = Arc::new(StatsAggregator::from_store(
            Arc::new(MemoryStore::new()),
            &StatsConfig::default(),
        ));
        YoutubeHandler::new(
            "somechannel",
            IdentifierKind::Username,
            reqwest::Client::new(),
            stats,
        )
        .with_base_url(&server.uri())
    }

    #[tokio::test]
    async fn test_start_polls_and_emits_chat() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/@somechannel/live"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(live_page_html("KEY", "CONT", "vid789")),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/youtubei/v1/live_chat/get_live_chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "continuationContents": {
                    "liveChatContinuation": {
                        "actions": [ { "addChatItemAction": { "item": text_message_item() } } ],
                        "continuations": []
                    }
                }
            })))
            .mount(&server)
            .await;

        let handler = handler_for(&server);
        let StartOutcome::Live(mut rx) = handler.start().await.expect("start") else {
            panic!("expected live outcome");
        };

        match rx.recv().await {
            Some(HandlerEvent::Started { room_id }) => assert_eq!(room_id, "vid789"),
            other => panic!("expected started, got {other:?}"),
        }
        match rx.recv().await {
            Some(HandlerEvent::Chat(event)) => {
                assert_eq!(event.author.display_name, "Alice");
                assert_eq!(event.room_id, "vid789");
            }
            other => panic!("expected chat, got {other:?}"),
        }
        // empty continuations list means the chat closed
        loop {
            match rx.recv().await {
                Some(HandlerEvent::Ended) => break,
                Some(_) => {}
                None => panic!("stream closed without Ended"),
            }
        }

        handler.cleanup().await.expect("cleanup");
    }

    #[tokio::test]
    async fn test_start_reports_not_live() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/@somechannel/live"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<html>{"INNERTUBE_API_KEY":"KEY"}</html>"#),
            )
            .mount(&server)
            .await;

        let handler = handler_for(&server);
        assert!(matches!(
            handler.start().await.expect("start"),
            StartOutcome::NotLive
        ));
    }
}
