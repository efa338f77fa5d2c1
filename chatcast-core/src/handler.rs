//! Channel handler contract implemented by every platform adapter.
//!
//! A handler owns one upstream ingestion session for one channel. Instead of
//! per-subscriber callbacks, `start` hands back a single event stream; the
//! registry consumes it once per session and fans events out to subscribers.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::models::{ChannelKey, ChannelStats, ChatEvent, IdentifierKind, Platform};

/// Lifecycle and content events emitted by a channel handler.
#[derive(Debug)]
pub enum HandlerEvent {
    /// Upstream session established; carries the platform's room/live id.
    Started { room_id: String },
    Chat(Box<ChatEvent>),
    StatsUpdated(ChannelStats),
    /// Recoverable upstream error; does not imply termination.
    Error(String),
    /// Upstream signalled stream termination. Emitted at most once.
    Ended,
}

/// Result of a successful `start` call.
pub enum StartOutcome {
    /// The channel is live; events arrive on the receiver until `Ended`
    /// or `cleanup`.
    Live(mpsc::Receiver<HandlerEvent>),
    /// The channel is confirmed not currently live. Not an error.
    NotLive,
}

#[async_trait]
pub trait ChannelHandler: Send + Sync {
    fn platform(&self) -> Platform;

    /// Establish the upstream ingestion session.
    ///
    /// Errors here are connection/protocol failures; a channel that is simply
    /// offline returns `Ok(StartOutcome::NotLive)`.
    async fn start(&self) -> Result<StartOutcome>;

    /// Stop ingestion and release resources. Idempotent; subsequent calls
    /// are no-ops.
    async fn cleanup(&self) -> Result<()>;

    /// Snapshot from the handler's stats aggregator.
    async fn current_stats(&self) -> Result<ChannelStats>;
}

/// Constructs a handler for a channel key. The registry is generic over this
/// so platform adapters stay out of the core crate.
#[async_trait]
pub trait HandlerFactory: Send + Sync {
    async fn create(
        &self,
        key: &ChannelKey,
        identifier_kind: IdentifierKind,
    ) -> Result<Arc<dyn ChannelHandler>>;
}
