//! JSON wire protocol between the gateway and subscriber connections.

use serde::{Deserialize, Serialize};

use super::channel::{IdentifierKind, Platform};
use super::event::ChatEvent;
use super::stats::ChannelStats;

/// Inbound request from a subscriber connection, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    Subscribe {
        identifier: String,
        #[serde(default, alias = "identifierType")]
        identifier_type: IdentifierKind,
        #[serde(default)]
        platform: Platform,
    },
    Unsubscribe,
    GetStats,
}

/// Outbound message to a subscriber connection, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Status {
        status: StatusKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        identifier: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        room_id: Option<String>,
    },
    Chat {
        data: Box<ChatEvent>,
    },
    Stats {
        data: ChannelStats,
    },
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<ErrorCode>,
    },
}

impl ServerMessage {
    #[must_use]
    pub fn error(error: impl Into<String>, code: Option<ErrorCode>) -> Self {
        Self::Error {
            error: error.into(),
            code,
        }
    }

    #[must_use]
    pub const fn status(status: StatusKind) -> Self {
        Self::Status {
            status,
            identifier: None,
            room_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Started,
    Subscribed,
    Unsubscribed,
}

/// Error codes surfaced to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    StreamEnded,
    StreamNotLive,
    StreamNotFound,
    NoActiveChat,
    InvalidMessageType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_parses_with_defaults() {
        let req: ClientRequest =
            serde_json::from_str(r#"{"type":"subscribe","identifier":"somechannel"}"#)
                .expect("parse");
        assert_eq!(
            req,
            ClientRequest::Subscribe {
                identifier: "somechannel".into(),
                identifier_type: IdentifierKind::Username,
                platform: Platform::Youtube,
            }
        );
    }

    #[test]
    fn test_subscribe_accepts_both_identifier_type_spellings() {
        let camel: ClientRequest = serde_json::from_str(
            r#"{"type":"subscribe","identifier":"c","identifierType":"channelId","platform":"youtube"}"#,
        )
        .expect("parse");
        let snake: ClientRequest = serde_json::from_str(
            r#"{"type":"subscribe","identifier":"c","identifier_type":"channelId","platform":"youtube"}"#,
        )
        .expect("parse");
        assert_eq!(camel, snake);
    }

    #[test]
    fn test_unit_requests() {
        assert_eq!(
            serde_json::from_str::<ClientRequest>(r#"{"type":"unsubscribe"}"#).expect("parse"),
            ClientRequest::Unsubscribe
        );
        assert_eq!(
            serde_json::from_str::<ClientRequest>(r#"{"type":"get_stats"}"#).expect("parse"),
            ClientRequest::GetStats
        );
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(serde_json::from_str::<ClientRequest>(r#"{"type":"dance"}"#).is_err());
    }

    #[test]
    fn test_error_wire_shape() {
        let msg = ServerMessage::error("Stream has ended", Some(ErrorCode::StreamEnded));
        let json = serde_json::to_value(msg).expect("serialize");
        assert_eq!(json["type"], "error");
        assert_eq!(json["error"], "Stream has ended");
        assert_eq!(json["code"], "STREAM_ENDED");
    }

    #[test]
    fn test_error_without_code_omits_field() {
        let msg = ServerMessage::error("transient upstream failure", None);
        let json = serde_json::to_value(msg).expect("serialize");
        assert!(json.get("code").is_none());
    }

    #[test]
    fn test_status_wire_shape() {
        let msg = ServerMessage::Status {
            status: StatusKind::Subscribed,
            identifier: Some("somechannel".into()),
            room_id: None,
        };
        let json = serde_json::to_value(msg).expect("serialize");
        assert_eq!(json["type"], "status");
        assert_eq!(json["status"], "subscribed");
        assert_eq!(json["identifier"], "somechannel");
        assert!(json.get("room_id").is_none());
    }

    #[test]
    fn test_all_error_codes_render() {
        for (code, wire) in [
            (ErrorCode::StreamEnded, "STREAM_ENDED"),
            (ErrorCode::StreamNotLive, "STREAM_NOT_LIVE"),
            (ErrorCode::StreamNotFound, "STREAM_NOT_FOUND"),
            (ErrorCode::NoActiveChat, "NO_ACTIVE_CHAT"),
            (ErrorCode::InvalidMessageType, "INVALID_MESSAGE_TYPE"),
        ] {
            assert_eq!(serde_json::to_value(code).expect("serialize"), wire);
        }
    }
}
