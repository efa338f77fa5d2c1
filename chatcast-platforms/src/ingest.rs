//! Shared plumbing for the adapters' ingestion loops.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

use chatcast_core::handler::HandlerEvent;
use chatcast_core::models::ChatEvent;
use chatcast_core::stats::StatsAggregator;

/// Bound for the per-session handler event channel. The registry drains it
/// continuously; this only absorbs short bursts.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Sends handler events downstream and feeds the stats aggregator as a side
/// effect of every chat message.
///
/// All emit methods return `false` once the receiver is gone, which the
/// ingestion loops treat as their stop signal.
pub struct EventPump {
    tx: mpsc::Sender<HandlerEvent>,
    stats: Arc<StatsAggregator>,
}

impl EventPump {
    #[must_use]
    pub fn new(tx: mpsc::Sender<HandlerEvent>, stats: Arc<StatsAggregator>) -> Self {
        Self { tx, stats }
    }

    pub async fn started(&self, room_id: impl Into<String>) -> bool {
        self.tx
            .send(HandlerEvent::Started {
                room_id: room_id.into(),
            })
            .await
            .is_ok()
    }

    /// Emit one chat event, then a stats update if the aggregator accepted
    /// the message (rate-limited authors produce no update).
    pub async fn chat(&self, event: ChatEvent) -> bool {
        let author = event.author.clone();
        if self.tx.send(HandlerEvent::Chat(Box::new(event))).await.is_err() {
            return false;
        }

        match self.stats.record_author_activity(&author).await {
            Ok(Some(stats)) => self.tx.send(HandlerEvent::StatsUpdated(stats)).await.is_ok(),
            Ok(None) => true,
            Err(err) => {
                // stats are best effort; chat delivery already happened
                warn!(error = %err, "Failed to record author activity");
                true
            }
        }
    }

    pub async fn error(&self, message: impl Into<String>) -> bool {
        self.tx
            .send(HandlerEvent::Error(message.into()))
            .await
            .is_ok()
    }

    pub async fn ended(&self) {
        let _ = self.tx.send(HandlerEvent::Ended).await;
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
