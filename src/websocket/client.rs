// Per-connection plumbing: exactly two tasks per client. One reads frames
// off the socket and forwards well-formed messages, one drains the send
// channel onto the socket. They share nothing but the split socket halves
// and the channel.

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::services::rate_limit::{RateLimitService, WEBSOCKET_PER_MINUTE};
use crate::services::ServiceError;
use crate::websocket::hub::{ClientCommand, HubHandle, Registration, WsMessage, SEND_BUFFER};

/// Time allowed to write a frame to the peer.
const WRITE_WAIT: Duration = Duration::from_secs(10);
/// Time allowed between inbound frames; pings keep healthy peers inside it.
const PONG_WAIT: Duration = Duration::from_secs(60);
/// Send pings at 9/10 of the pong window.
const PING_PERIOD: Duration = Duration::from_secs(54);
/// Maximum inbound frame size (enforced at upgrade time).
pub const MAX_MESSAGE_SIZE: usize = 512 * 1024;

/// Lookups the chat path needs from the domain layer. Kept behind a trait
/// so the hub machinery has no direct dependency on the services.
#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync {
    async fn surname_by_id(&self, user_id: Uuid) -> Result<String, ServiceError>;

    /// Ok(true) when the named character exists and belongs to the user.
    async fn validate_character_ownership(
        &self,
        character_name: &str,
        user_id: Uuid,
    ) -> Result<bool, ServiceError>;
}

/// Drive one upgraded socket until either side goes away.
pub async fn serve_ws(
    socket: WebSocket,
    hub: HubHandle,
    provider: Arc<dyn ChatProvider>,
    rate_limiter: Arc<RateLimitService>,
    user_id: Uuid,
    jti: String,
) {
    let (sender, receiver) = mpsc::channel::<ClientCommand>(SEND_BUFFER);

    hub.register(Registration {
        user_id,
        jti: jti.clone(),
        sender: sender.clone(),
    });

    let (sink, stream) = socket.split();
    let writer = tokio::spawn(write_pump(sink, receiver));

    read_pump(stream, sender, &hub, provider, rate_limiter, user_id).await;

    hub.unregister(&jti);
    writer.abort();
}

async fn write_pump(
    mut sink: SplitSink<WebSocket, Message>,
    mut receiver: mpsc::Receiver<ClientCommand>,
) {
    let mut ping = tokio::time::interval(PING_PERIOD);
    ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // Swallow the interval's immediate first fire
    ping.tick().await;

    loop {
        tokio::select! {
            command = receiver.recv() => match command {
                Some(ClientCommand::Message(message)) => {
                    let payload = match serde_json::to_string(&message) {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!("Failed to serialize outbound frame: {}", e);
                            continue;
                        }
                    };
                    match timeout(WRITE_WAIT, sink.send(Message::Text(payload.into()))).await {
                        Ok(Ok(())) => {}
                        _ => return,
                    }
                }
                Some(ClientCommand::Close) | None => {
                    let _ = timeout(WRITE_WAIT, sink.send(Message::Close(None))).await;
                    return;
                }
            },
            _ = ping.tick() => {
                match timeout(WRITE_WAIT, sink.send(Message::Ping(Bytes::new()))).await {
                    Ok(Ok(())) => {}
                    _ => return,
                }
            }
        }
    }
}

async fn read_pump(
    mut stream: SplitStream<WebSocket>,
    sender: mpsc::Sender<ClientCommand>,
    hub: &HubHandle,
    provider: Arc<dyn ChatProvider>,
    rate_limiter: Arc<RateLimitService>,
    user_id: Uuid,
) {
    loop {
        let frame = match timeout(PONG_WAIT, stream.next()).await {
            Ok(Some(Ok(frame))) => frame,
            Ok(Some(Err(e))) => {
                debug!("WebSocket read error for {}: {}", user_id, e);
                return;
            }
            Ok(None) => return,
            Err(_) => {
                debug!("WebSocket liveness deadline expired for {}", user_id);
                return;
            }
        };

        match frame {
            Message::Text(text) => {
                handle_inbound(
                    text.as_str(),
                    &sender,
                    hub,
                    provider.as_ref(),
                    rate_limiter.as_ref(),
                    user_id,
                )
                .await;
            }
            Message::Close(_) => return,
            // Any inbound frame (pongs included) restarts the liveness window
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => {}
        }
    }
}

async fn handle_inbound(
    raw: &str,
    sender: &mpsc::Sender<ClientCommand>,
    hub: &HubHandle,
    provider: &dyn ChatProvider,
    rate_limiter: &RateLimitService,
    user_id: Uuid,
) {
    let mut message: WsMessage = match serde_json::from_str(raw) {
        Ok(message) => message,
        Err(e) => {
            debug!("Malformed frame from {}: {}", user_id, e);
            return;
        }
    };

    let result = rate_limiter
        .check(&format!("ws:{}", user_id), WEBSOCKET_PER_MINUTE)
        .await;
    if !result.allowed {
        warn!("WebSocket inbound rate limit exceeded for {}", user_id);
        return;
    }

    match message.kind.as_str() {
        "chat" => {
            // The server controls identity; never trust the client's copy.
            message
                .data
                .insert("user_id".to_string(), json!(user_id.to_string()));

            let surname = match provider.surname_by_id(user_id).await {
                Ok(surname) => surname,
                Err(e) => {
                    debug!("Failed to get surname for user {}: {}", user_id, e);
                    "Unknown User".to_string()
                }
            };
            message.data.insert("surname".to_string(), json!(surname));

            let character_name = message
                .data
                .get("character_name")
                .and_then(|v| v.as_str())
                .filter(|name| !name.is_empty())
                .map(str::to_string);

            if let Some(character_name) = character_name {
                match provider
                    .validate_character_ownership(&character_name, user_id)
                    .await
                {
                    Ok(true) => {}
                    Ok(false) => {
                        reply(sender, WsMessage::error("You don't own that character"));
                        return;
                    }
                    Err(e) => {
                        debug!(
                            "Character ownership check failed for {}: {}",
                            character_name, e
                        );
                        reply(sender, WsMessage::error("Character not found"));
                        return;
                    }
                }
            }

            message.user_id = Some(user_id);
            message.to = Some("all".to_string());
            hub.broadcast(message).await;
        }
        "ping" => {
            reply(sender, WsMessage::pong(chrono::Utc::now().timestamp()));
        }
        "notification" | "system" => {
            warn!(
                "Client {} attempted to send restricted message type: {}",
                user_id, message.kind
            );
        }
        other => {
            debug!("Client {} sent unknown message type: {}", user_id, other);
        }
    }
}

fn reply(sender: &mpsc::Sender<ClientCommand>, message: WsMessage) {
    let _ = sender.try_send(ClientCommand::Message(message));
}
