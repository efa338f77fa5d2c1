//! WebSocket subscriber endpoint.
//!
//! Each connection gets a bounded outbound queue; a writer task drains it to
//! the socket while the read loop dispatches inbound requests against the
//! registry. The registry holds a clone of the queue sender for fan-out, so
//! a slow or dead connection never blocks a session's event stream.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use chatcast_core::models::{
    ChannelKey, ClientRequest, ConnectionId, ErrorCode, ServerMessage, StatusKind,
};
use chatcast_core::registry::StreamRegistry;

/// Outbound queue bound per connection. Events beyond this are dropped by
/// the registry's fan-out rather than buffered without limit.
const OUTBOUND_QUEUE_CAPACITY: usize = 1000;

const MAX_MESSAGE_SIZE: usize = 64 * 1024;

pub async fn websocket_handler(
    State(registry): State<Arc<StreamRegistry>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.max_message_size(MAX_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_socket(socket, registry))
}

async fn handle_socket(socket: WebSocket, registry: Arc<StreamRegistry>) {
    let connection_id = ConnectionId::new();
    debug!(connection_id = %connection_id, "WebSocket connection opened");

    let (outbound_tx, mut outbound_rx) = mpsc::channel::<ServerMessage>(OUTBOUND_QUEUE_CAPACITY);
    let (mut ws_tx, mut ws_rx) = socket.split();

    // writer: drains the outbound queue until every sender clone is gone
    let writer_id = connection_id.clone();
    tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(err) => {
                    warn!(connection_id = %writer_id, error = %err, "Failed to encode message");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    while let Some(frame) = ws_rx.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                handle_request(&registry, &connection_id, &outbound_tx, text.as_str()).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                debug!(connection_id = %connection_id, error = %err, "WebSocket read error");
                break;
            }
        }
    }

    registry.disconnect(&connection_id).await;
    debug!(connection_id = %connection_id, "WebSocket connection closed");
}

/// Dispatch one inbound frame. Replies go through the connection's outbound
/// queue; send failures mean the connection is already gone.
pub(crate) async fn handle_request(
    registry: &Arc<StreamRegistry>,
    connection_id: &ConnectionId,
    outbound: &mpsc::Sender<ServerMessage>,
    text: &str,
) {
    let Ok(request) = serde_json::from_str::<ClientRequest>(text) else {
        let _ = outbound
            .send(ServerMessage::error(
                "Invalid message type",
                Some(ErrorCode::InvalidMessageType),
            ))
            .await;
        return;
    };

    match request {
        ClientRequest::Subscribe {
            identifier,
            identifier_type,
            platform,
        } => {
            let key = ChannelKey::new(platform, identifier.clone());
            match registry
                .subscribe(connection_id, outbound.clone(), &key, identifier_type)
                .await
            {
                Ok(outcome) => {
                    let _ = outbound
                        .send(ServerMessage::Status {
                            status: StatusKind::Subscribed,
                            identifier: Some(identifier),
                            room_id: outcome.room_id,
                        })
                        .await;
                }
                Err(err) => {
                    let _ = outbound
                        .send(ServerMessage::error(err.to_string(), err.code()))
                        .await;
                }
            }
        }
        ClientRequest::Unsubscribe => {
            // acked even when nothing is subscribed; unsubscribe is idempotent
            if let Some(key) = registry.association(connection_id) {
                let _ = outbound
                    .send(ServerMessage::Status {
                        status: StatusKind::Unsubscribed,
                        identifier: Some(key.identifier.clone()),
                        room_id: None,
                    })
                    .await;
                registry.unsubscribe(connection_id, &key).await;
            } else {
                let _ = outbound
                    .send(ServerMessage::status(StatusKind::Unsubscribed))
                    .await;
            }
        }
        ClientRequest::GetStats => {
            let Some(key) = registry.association(connection_id) else {
                let _ = outbound
                    .send(ServerMessage::error(
                        "No active chat subscription",
                        Some(ErrorCode::NoActiveChat),
                    ))
                    .await;
                return;
            };
            match registry.get_stats(&key).await {
                Ok(stats) => {
                    let _ = outbound.send(ServerMessage::Stats { data: stats }).await;
                }
                Err(err) => {
                    let _ = outbound
                        .send(ServerMessage::error(err.to_string(), err.code()))
                        .await;
                }
            }
        }
    }
}
