use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;

/// Source platform of a live chat channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Tiktok,
    Twitch,
}

impl Platform {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Youtube => "youtube",
            Self::Tiktok => "tiktok",
            Self::Twitch => "twitch",
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::Youtube
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "youtube" => Ok(Self::Youtube),
            "tiktok" => Ok(Self::Tiktok),
            "twitch" => Ok(Self::Twitch),
            other => Err(Error::UnsupportedPlatform(other.to_string())),
        }
    }
}

/// How a subscriber names the channel it wants.
///
/// Only YouTube distinguishes these; other platforms take the identifier
/// as a plain channel name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentifierKind {
    Username,
    ChannelId,
    LiveId,
}

impl Default for IdentifierKind {
    fn default() -> Self {
        Self::Username
    }
}

/// Unique key for one live chat channel: platform + identifier pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelKey {
    pub platform: Platform,
    pub identifier: String,
}

impl ChannelKey {
    #[must_use]
    pub fn new(platform: Platform, identifier: impl Into<String>) -> Self {
        Self {
            platform,
            identifier: identifier.into(),
        }
    }
}

impl std::fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.platform, self.identifier)
    }
}
