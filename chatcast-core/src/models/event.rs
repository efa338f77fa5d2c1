//! Canonical normalized chat event, shared by every platform adapter.
//!
//! Field names follow the wire format delivered to subscribers, so the
//! structs serialize directly into the `{type:"chat", data:...}` payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::channel::Platform;

/// One normalized inbound chat message. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEvent {
    pub platform: Platform,
    pub timestamp: DateTime<Utc>,
    /// Unique per platform+channel; generated when the source omits one.
    pub message_id: String,
    pub room_id: String,
    pub author: ChatAuthor,
    pub content: MessageContent,
    pub metadata: MessageMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatAuthor {
    pub id: String,
    pub username: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub roles: AuthorRoles,
    pub badges: Vec<Badge>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorRoles {
    pub broadcaster: bool,
    pub moderator: bool,
    pub subscriber: bool,
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    #[serde(rename = "type")]
    pub kind: BadgeKind,
    pub label: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeKind {
    Broadcaster,
    Moderator,
    Subscriber,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageContent {
    /// Plain text with emote shortcodes inlined as written.
    pub raw: String,
    /// Emotes rendered as `:shortcode:`.
    pub formatted: String,
    /// Text runs only, emotes stripped.
    pub sanitized: String,
    pub elements: Vec<MessageElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageElement {
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub value: String,
    /// Character span of this element within `raw`, as `[start, end)`.
    pub position: (usize, usize),
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EmoteMetadata>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Text,
    Emote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmoteMetadata {
    pub url: Option<String>,
    pub alt: Option<String>,
    pub is_custom: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(rename = "monetary_data", skip_serializing_if = "Option::is_none")]
    pub monetary: Option<MonetaryData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sticker: Option<Sticker>,
}

impl MessageMetadata {
    /// Metadata for an ordinary chat message.
    #[must_use]
    pub const fn chat() -> Self {
        Self {
            kind: MessageKind::Chat,
            monetary: None,
            sticker: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Chat,
    SuperChat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonetaryData {
    pub amount: String,
    pub formatted: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sticker {
    pub url: String,
    pub alt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> ChatEvent {
        ChatEvent {
            platform: Platform::Youtube,
            timestamp: Utc::now(),
            message_id: "m1".into(),
            room_id: "r1".into(),
            author: ChatAuthor {
                id: "u1".into(),
                username: "alice".into(),
                display_name: "Alice".into(),
                avatar_url: None,
                roles: AuthorRoles {
                    moderator: true,
                    ..AuthorRoles::default()
                },
                badges: vec![Badge {
                    kind: BadgeKind::Moderator,
                    label: "moderator".into(),
                    image_url: None,
                }],
            },
            content: MessageContent {
                raw: "hi".into(),
                formatted: "hi".into(),
                sanitized: "hi".into(),
                elements: vec![MessageElement {
                    kind: ElementKind::Text,
                    value: "hi".into(),
                    position: (0, 2),
                    metadata: None,
                }],
            },
            metadata: MessageMetadata::chat(),
        }
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(sample_event()).expect("serialize");
        assert_eq!(json["platform"], "youtube");
        assert_eq!(json["message_id"], "m1");
        assert_eq!(json["author"]["display_name"], "Alice");
        assert_eq!(json["author"]["roles"]["moderator"], true);
        assert_eq!(json["author"]["badges"][0]["type"], "moderator");
        assert_eq!(json["content"]["elements"][0]["type"], "text");
        assert_eq!(json["content"]["elements"][0]["position"][1], 2);
        assert_eq!(json["metadata"]["type"], "chat");
        // absent optionals are omitted, not null
        assert!(json["metadata"].get("monetary_data").is_none());
        assert!(json["author"].get("avatar_url").is_none());
    }

    #[test]
    fn test_super_chat_metadata() {
        let metadata = MessageMetadata {
            kind: MessageKind::SuperChat,
            monetary: Some(MonetaryData {
                amount: "$5.00".into(),
                formatted: "$5.00".into(),
                color: Some("#ffca28".into()),
            }),
            sticker: None,
        };
        let json = serde_json::to_value(metadata).expect("serialize");
        assert_eq!(json["type"], "super_chat");
        assert_eq!(json["monetary_data"]["amount"], "$5.00");
    }
}
