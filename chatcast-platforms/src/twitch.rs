//! Twitch chat over the anonymous IRC-over-WebSocket endpoint.
//!
//! No credentials are required for read-only access: the client logs in as a
//! `justinfan` guest, joins the channel, and answers server PINGs. Twitch
//! serves chat for offline channels too, so this adapter never reports
//! not-live.

use chrono::{DateTime, TimeZone, Utc};
use futures_util::{SinkExt, StreamExt};
use rand::RngExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
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

const IRC_WS_URL: &str = "wss://irc-ws.chat.twitch.tv";
const CLIENT_PING_INTERVAL: Duration = Duration::from_secs(60);

type IrcSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TwitchHandler {
    channel_name: String,
    stats: Arc<StatsAggregator>,
    cancel: CancellationToken,
}

impl TwitchHandler {
    #[must_use]
    pub fn new(identifier: &str, stats: Arc<StatsAggregator>) -> Self {
        Self {
            channel_name: identifier.to_lowercase(),
            stats,
            cancel: CancellationToken::new(),
        }
    }

    async fn connect(&self) -> Result<IrcSocket> {
        let (mut socket, _) = connect_async(IRC_WS_URL)
            .await
            .map_err(|err| Error::Ingestion(format!("twitch irc connect failed: {err}")))?;

        let nick = format!("justinfan{}", rand::rng().random_range(10_000..100_000));
        let login = [
            "CAP REQ :twitch.tv/tags twitch.tv/commands".to_string(),
            "PASS SCHMOOPIIE".to_string(),
            format!("NICK {nick}"),
            format!("JOIN #{}", self.channel_name),
        ];
        for line in login {
            socket
                .send(Message::Text(line))
                .await
                .map_err(|err| Error::Ingestion(format!("twitch irc login failed: {err}")))?;
        }
        Ok(socket)
    }
}

#[async_trait]
impl ChannelHandler for TwitchHandler {
    fn platform(&self) -> Platform {
        Platform::Twitch
    }

    async fn start(&self) -> Result<StartOutcome> {
        let socket = self.connect().await?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let pump = EventPump::new(tx, self.stats.clone());
        let channel_name = self.channel_name.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            run_loop(socket, pump, channel_name, cancel).await;
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

async fn run_loop(
    mut socket: IrcSocket,
    pump: EventPump,
    channel_name: String,
    cancel: CancellationToken,
) {
    if !pump.started(channel_name.clone()).await {
        return;
    }

    let mut ping = tokio::time::interval(CLIENT_PING_INTERVAL);
    ping.tick().await;

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                let _ = socket.close(None).await;
                return;
            }
            _ = ping.tick() => {
                if let Err(err) = socket.send(Message::Text("PING".to_string())).await {
                    warn!(channel = %channel_name, error = %err, "Twitch ping failed");
                }
            }
            frame = socket.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        handle_frame(&mut socket, &pump, &text).await;
                        if pump.is_closed() {
                            let _ = socket.close(None).await;
                            return;
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = socket.send(Message::Pong(payload)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(channel = %channel_name, "Twitch irc connection closed");
                        pump.ended().await;
                        return;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        pump.error(format!("twitch irc read failed: {err}")).await;
                        pump.ended().await;
                        return;
                    }
                }
            }
        }
    }
}

async fn handle_frame(socket: &mut IrcSocket, pump: &EventPump, frame: &str) {
    for line in frame.trim().split("\r\n") {
        if line == "PING :tmi.twitch.tv" {
            let _ = socket.send(Message::Text("PONG :tmi.twitch.tv".to_string())).await;
            continue;
        }
        let Some(message) = parse_irc_message(line) else {
            continue;
        };
        if message.command == "PRIVMSG" {
            if let Some(event) = transform_privmsg(&message) {
                pump.chat(event).await;
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct IrcMessage {
    /// Message tags with keys converted to camelCase.
    tags: HashMap<String, String>,
    command: String,
    room_name: String,
    text: String,
}

/// Parse one tagged IRC line into its tag map, command, and trailing text.
///
/// The sections are split structurally rather than on bare `:` because tag
/// values can themselves contain colons (`emotes=25:0-4`).
fn parse_irc_message(line: &str) -> Option<IrcMessage> {
    // @tags :prefix COMMAND #room :trailing
    let (tags_raw, rest) = match line.strip_prefix('@') {
        Some(tagged) => tagged.split_once(' ')?,
        None => ("", line),
    };
    let rest = match rest.strip_prefix(':') {
        Some(prefixed) => prefixed.split_once(' ').map_or("", |(_, rest)| rest),
        None => rest,
    };
    let (command_data, text) = rest.split_once(" :").unwrap_or((rest, ""));

    let mut command_words = command_data.split(' ');
    let command = command_words.next()?.to_string();
    let room_name = command_words.next().unwrap_or_default().to_string();

    let mut tags = HashMap::new();
    for pair in tags_raw.split(';') {
        let mut kv = pair.splitn(2, '=');
        let key = kv.next().unwrap_or_default();
        if key.is_empty() {
            continue;
        }
        let value = kv.next().unwrap_or_default().to_string();
        tags.insert(camel_case_tag(key), value);
    }

    Some(IrcMessage {
        tags,
        command,
        room_name,
        text: text.trim_end().to_string(),
    })
}

/// `tmi-sent-ts` -> `tmiSentTs`.
fn camel_case_tag(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '-' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn transform_badges(badges: &str) -> Vec<Badge> {
    badges
        .split(',')
        .filter(|badge| !badge.is_empty())
        .map(|badge| {
            let name = badge.split('/').next().unwrap_or_default();
            let kind = match name {
                "broadcaster" => BadgeKind::Broadcaster,
                "moderator" => BadgeKind::Moderator,
                "subscriber" => BadgeKind::Subscriber,
                _ => BadgeKind::Custom,
            };
            Badge {
                kind,
                label: name.to_string(),
                // badge images require a separate API call
                image_url: None,
            }
        })
        .collect()
}

fn parse_timestamp(tags: &HashMap<String, String>) -> DateTime<Utc> {
    tags.get("tmiSentTs")
        .and_then(|raw| raw.parse::<i64>().ok())
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or_else(Utc::now)
}

fn transform_privmsg(message: &IrcMessage) -> Option<ChatEvent> {
    if message.text.is_empty() {
        return None;
    }
    let tags = &message.tags;
    let display_name = tags.get("displayName").cloned().unwrap_or_default();
    let badges_raw = tags.get("badges").map(String::as_str).unwrap_or_default();
    let text = message.text.clone();

    Some(ChatEvent {
        platform: Platform::Twitch,
        timestamp: parse_timestamp(tags),
        message_id: tags
            .get("id")
            .cloned()
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        room_id: tags.get("roomId").cloned().unwrap_or_default(),
        author: ChatAuthor {
            id: tags.get("userId").cloned().unwrap_or_default(),
            username: display_name.to_lowercase(),
            display_name,
            // avatars require a separate API call
            avatar_url: None,
            roles: AuthorRoles {
                broadcaster: badges_raw.contains("broadcaster"),
                moderator: tags.get("mod").is_some_and(|v| v == "1"),
                subscriber: tags.get("subscriber").is_some_and(|v| v == "1"),
                verified: false,
            },
            badges: transform_badges(badges_raw),
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
    })
}
