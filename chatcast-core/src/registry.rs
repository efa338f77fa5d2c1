//! Stream registry: the single authority mapping channel keys to live
//! sessions, deduplicating upstream ingestion and fanning events out to
//! subscriber connections.
//!
//! The two invariants everything else hangs off:
//! - session creation is single-flight per key, so concurrent subscribers
//!   never start two upstream sessions for the same channel
//! - teardown removes the session from the map before any asynchronous
//!   cleanup runs, so a second teardown attempt observes the session absent
//!   and becomes a no-op

use dashmap::DashMap;
use futures::future::join_all;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::handler::{ChannelHandler, HandlerEvent, HandlerFactory, StartOutcome};
use crate::models::{
    ChannelKey, ChannelStats, ConnectionId, ErrorCode, IdentifierKind, ServerMessage, StatusKind,
};
use crate::singleflight::{SingleFlight, SingleFlightError};

// log every Nth event dropped on a slow subscriber instead of every one
const DROP_LOG_INTERVAL: u64 = 100;

// a session can be torn down between lookup and join; retry a few times
// before giving up
const SUBSCRIBE_ATTEMPTS: usize = 3;

/// Outbound queue handle for one subscriber connection.
pub type EventSender = mpsc::Sender<ServerMessage>;

#[derive(Clone)]
struct Subscriber {
    connection_id: ConnectionId,
    sender: EventSender,
}

/// Result of a successful subscribe call.
#[derive(Debug, Clone)]
pub struct SubscribeOutcome {
    /// Whether this call created the session (as opposed to joining one).
    pub created: bool,
    /// Platform room/live id, once the upstream session has reported it.
    pub room_id: Option<String>,
}

/// Live runtime state binding one channel to its handler and subscriber set.
pub struct ChannelSession {
    key: ChannelKey,
    handler: Arc<dyn ChannelHandler>,
    subscribers: Mutex<Vec<Subscriber>>,
    room_id: Mutex<Option<String>>,
    // set the moment the subscriber set empties or teardown begins; a
    // session observed closed must not accept new subscribers
    closed: AtomicBool,
    dropped_events: AtomicU64,
}

impl ChannelSession {
    fn new(key: ChannelKey, handler: Arc<dyn ChannelHandler>) -> Self {
        Self {
            key,
            handler,
            subscribers: Mutex::new(Vec::new()),
            room_id: Mutex::new(None),
            closed: AtomicBool::new(false),
            dropped_events: AtomicU64::new(0),
        }
    }

    /// Returns false if the session is already closing; the caller should
    /// retry against a fresh lookup.
    fn add_subscriber(&self, subscriber: Subscriber) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        let mut subscribers = self.subscribers.lock();
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        if !subscribers
            .iter()
            .any(|s| s.connection_id == subscriber.connection_id)
        {
            subscribers.push(subscriber);
        }
        true
    }

    /// Returns true if the subscriber set is now empty. An emptied session
    /// is marked closed under the same lock, so a subscribe landing between
    /// this call and the teardown it triggers fails `add_subscriber` and
    /// retries against a fresh session instead of joining a doomed one.
    fn remove_subscriber(&self, connection_id: &ConnectionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|s| s.connection_id != *connection_id);
        if subscribers.is_empty() {
            self.closed.store(true, Ordering::Release);
            return true;
        }
        false
    }

    fn close_and_take_subscribers(&self) -> Vec<Subscriber> {
        self.closed.store(true, Ordering::Release);
        std::mem::take(&mut *self.subscribers.lock())
    }

    /// Deliver one event to every current subscriber. Slow subscribers drop
    /// the event; closed ones are returned for removal.
    fn broadcast(&self, message: &ServerMessage) -> Vec<ConnectionId> {
        let subscribers = self.subscribers.lock();
        let mut closed = Vec::new();
        for subscriber in subscribers.iter() {
            match subscriber.sender.try_send(message.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    let dropped = self.dropped_events.fetch_add(1, Ordering::Relaxed) + 1;
                    if dropped % DROP_LOG_INTERVAL == 0 {
                        warn!(
                            channel = %self.key,
                            connection_id = %subscriber.connection_id,
                            dropped,
                            "Subscriber too slow, dropping events"
                        );
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    closed.push(subscriber.connection_id.clone());
                }
            }
        }
        closed
    }

    #[must_use]
    pub fn room_id(&self) -> Option<String> {
        self.room_id.lock().clone()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

/// Process-wide registry of live channel sessions.
pub struct StreamRegistry {
    sessions: DashMap<ChannelKey, Arc<ChannelSession>>,
    // connection -> channel association; a connection holds at most one
    connections: DashMap<ConnectionId, ChannelKey>,
    factory: Arc<dyn HandlerFactory>,
    flight: SingleFlight<ChannelKey, Arc<ChannelSession>, Arc<Error>>,
    shutdown_grace: Duration,
}

impl StreamRegistry {
    #[must_use]
    pub fn new(factory: Arc<dyn HandlerFactory>, shutdown_grace: Duration) -> Arc<Self> {
        Arc::new(Self {
            sessions: DashMap::new(),
            connections: DashMap::new(),
            factory,
            flight: SingleFlight::new(),
            shutdown_grace,
        })
    }

    fn session(&self, key: &ChannelKey) -> Option<Arc<ChannelSession>> {
        self.sessions.get(key).map(|entry| entry.value().clone())
    }

    /// Channel the connection is currently associated with, if any.
    #[must_use]
    pub fn association(&self, connection_id: &ConnectionId) -> Option<ChannelKey> {
        self.connections
            .get(connection_id)
            .map(|entry| entry.value().clone())
    }

    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Subscribe a connection to a channel, creating the upstream session if
    /// none exists.
    ///
    /// A connection holds at most one association; subscribing while already
    /// subscribed leaves the previous channel first. Session creation is
    /// single-flight: concurrent callers for an absent key share one creation
    /// attempt and its outcome, success or failure.
    pub async fn subscribe(
        self: &Arc<Self>,
        connection_id: &ConnectionId,
        sender: EventSender,
        key: &ChannelKey,
        identifier_kind: IdentifierKind,
    ) -> Result<SubscribeOutcome> {
        if let Some(previous) = self.association(connection_id) {
            if previous != *key {
                self.unsubscribe(connection_id, &previous).await;
            }
        }

        for _ in 0..SUBSCRIBE_ATTEMPTS {
            let (session, created) = match self.session(key) {
                Some(session) => (session, false),
                None => {
                    let registry = self.clone();
                    // only the single-flight leader polls the future, so
                    // the flag stays unset for followers sharing the result
                    let led = Arc::new(AtomicBool::new(false));
                    let flag = led.clone();
                    let session = self
                        .flight
                        .do_work(key.clone(), async move {
                            flag.store(true, Ordering::Release);
                            registry
                                .create_session(key, identifier_kind)
                                .await
                                .map_err(Arc::new)
                        })
                        .await
                        .map_err(|err| match err {
                            SingleFlightError::LeaderFailed => {
                                Error::Internal("session creation interrupted".to_string())
                            }
                            SingleFlightError::Inner(inner) => inner.clone_outcome(),
                        })?;
                    (session, led.load(Ordering::Acquire))
                }
            };

            let subscriber = Subscriber {
                connection_id: connection_id.clone(),
                sender: sender.clone(),
            };
            if session.add_subscriber(subscriber) {
                self.connections
                    .insert(connection_id.clone(), key.clone());
                info!(
                    channel = %key,
                    connection_id = %connection_id,
                    created,
                    "Connection subscribed"
                );
                return Ok(SubscribeOutcome {
                    created,
                    room_id: session.room_id(),
                });
            }
            // the session closed between lookup and join; finish its
            // teardown now so the retry finds the map entry gone and
            // creates a fresh session
            self.teardown(&session, false).await;
        }

        Err(Error::Internal(format!(
            "session for {key} kept closing during subscribe"
        )))
    }

    /// Create the handler, start ingestion, register the session, and spawn
    /// its fan-out task. Any failure leaves nothing registered.
    async fn create_session(
        self: &Arc<Self>,
        key: &ChannelKey,
        identifier_kind: IdentifierKind,
    ) -> Result<Arc<ChannelSession>> {
        let handler = self.factory.create(key, identifier_kind).await?;

        let events = match handler.start().await {
            Ok(StartOutcome::Live(events)) => events,
            Ok(StartOutcome::NotLive) => {
                // nothing was registered; just stop the handler
                if let Err(err) = handler.cleanup().await {
                    warn!(channel = %key, error = %err, "Cleanup after not-live start failed");
                }
                return Err(Error::StreamNotLive);
            }
            Err(start_err) => {
                // the handler may already hold background work (stats
                // sweep, upstream connection); stop it before surfacing
                // the error
                if let Err(err) = handler.cleanup().await {
                    warn!(channel = %key, error = %err, "Cleanup after failed start failed");
                }
                return Err(start_err);
            }
        };

        let session = Arc::new(ChannelSession::new(key.clone(), handler));
        self.sessions.insert(key.clone(), session.clone());
        info!(channel = %key, "Upstream session started");

        let registry = self.clone();
        let task_session = session.clone();
        tokio::spawn(async move {
            registry.fan_out(task_session, events).await;
        });

        Ok(session)
    }

    /// Per-session event pump: consumes the handler's event stream and
    /// broadcasts to subscribers, in upstream order.
    async fn fan_out(
        self: Arc<Self>,
        session: Arc<ChannelSession>,
        mut events: mpsc::Receiver<HandlerEvent>,
    ) {
        while let Some(event) = events.recv().await {
            let message = match event {
                HandlerEvent::Started { room_id } => {
                    *session.room_id.lock() = Some(room_id.clone());
                    ServerMessage::Status {
                        status: StatusKind::Started,
                        identifier: None,
                        room_id: Some(room_id),
                    }
                }
                HandlerEvent::Chat(event) => ServerMessage::Chat { data: event },
                HandlerEvent::StatsUpdated(stats) => ServerMessage::Stats { data: stats },
                // mid-stream errors are non-fatal notices
                HandlerEvent::Error(error) => ServerMessage::error(error, None),
                HandlerEvent::Ended => {
                    self.teardown(&session, true).await;
                    return;
                }
            };

            for connection_id in session.broadcast(&message) {
                self.drop_connection(&session, &connection_id).await;
            }
        }

        // the handler dropped its event sender without an explicit Ended;
        // treat it the same way
        self.teardown(&session, true).await;
    }

    async fn drop_connection(
        self: &Arc<Self>,
        session: &Arc<ChannelSession>,
        connection_id: &ConnectionId,
    ) {
        debug!(
            channel = %session.key,
            connection_id = %connection_id,
            "Removing disconnected subscriber"
        );
        self.connections
            .remove_if(connection_id, |_, key| *key == session.key);
        if session.remove_subscriber(connection_id) {
            self.teardown(session, false).await;
        }
    }

    /// Remove a connection from a channel. When the last subscriber leaves
    /// the session is torn down in the background; the caller is not blocked
    /// on cleanup completion.
    pub async fn unsubscribe(self: &Arc<Self>, connection_id: &ConnectionId, key: &ChannelKey) {
        self.connections
            .remove_if(connection_id, |_, current| current == key);

        let Some(session) = self.session(key) else {
            return;
        };
        if session.remove_subscriber(connection_id) {
            let registry = self.clone();
            tokio::spawn(async move {
                registry.teardown(&session, false).await;
            });
        }
        info!(channel = %key, connection_id = %connection_id, "Connection unsubscribed");
    }

    /// Handle a dropped connection: leave whichever channel it was
    /// associated with.
    pub async fn disconnect(self: &Arc<Self>, connection_id: &ConnectionId) {
        if let Some(key) = self.association(connection_id) {
            self.unsubscribe(connection_id, &key).await;
        }
    }

    /// Stats snapshot for a channel; `NotFound` if no session exists.
    pub async fn get_stats(&self, key: &ChannelKey) -> Result<ChannelStats> {
        let session = self
            .session(key)
            .ok_or_else(|| Error::NotFound(format!("no active session for {key}")))?;
        session.handler.current_stats().await
    }

    /// Tear a session down at most once.
    ///
    /// Removes it from the map first, then stops the handler; a concurrent
    /// teardown of the same session finds the map entry gone and returns.
    /// The removal is identity-checked, so a stale teardown never takes out
    /// a replacement session registered under the same key. The terminal
    /// notice goes to the connections that were still subscribed at the
    /// moment of removal.
    pub async fn teardown(self: &Arc<Self>, session: &Arc<ChannelSession>, emit_ended: bool) {
        let key = &session.key;
        if self
            .sessions
            .remove_if(key, |_, current| Arc::ptr_eq(current, session))
            .is_none()
        {
            return;
        }

        let subscribers = session.close_and_take_subscribers();
        for subscriber in &subscribers {
            self.connections
                .remove_if(&subscriber.connection_id, |_, current| current == key);
        }

        if emit_ended && !subscribers.is_empty() {
            let notice =
                ServerMessage::error("Stream has ended", Some(ErrorCode::StreamEnded));
            for subscriber in &subscribers {
                let _ = subscriber.sender.try_send(notice.clone());
            }
        }

        if let Err(err) = session.handler.cleanup().await {
            warn!(channel = %key, error = %err, "Handler cleanup failed");
        }
        info!(channel = %key, "Session cleaned up");
    }

    /// Tear down every session, bounded by the shutdown grace period.
    /// In-flight cleanups are abandoned once the grace expires.
    pub async fn shutdown_all(self: &Arc<Self>) {
        let sessions: Vec<Arc<ChannelSession>> = self
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        if sessions.is_empty() {
            return;
        }
        info!(sessions = sessions.len(), "Tearing down all sessions");

        let teardowns = sessions
            .into_iter()
            .map(|session| {
                let registry = self.clone();
                async move {
                    registry.teardown(&session, true).await;
                }
            })
            .collect::<Vec<_>>();

        if tokio::time::timeout(self.shutdown_grace, join_all(teardowns))
            .await
            .is_err()
        {
            warn!(
                grace_seconds = self.shutdown_grace.as_secs(),
                "Shutdown grace expired, abandoning in-flight cleanups"
            );
        }
    }
}
