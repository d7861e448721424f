// WebSocket hub: the registry of live client sessions, keyed by token jti.
//
// Concurrency contract: the hub task exclusively owns both maps and drains
// its three channels in one serial loop. Everything else (handlers, the
// scheduler, login) talks to it through the channel handles — the maps are
// never touched from outside the loop.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Hard cap on simultaneous sockets per user; the oldest is evicted.
pub const MAX_CONNECTIONS_PER_USER: usize = 5;

/// Outgoing per-client buffer; a client that falls this far behind is a
/// slow consumer and gets dropped.
pub const SEND_BUFFER: usize = 256;

const BROADCAST_BUFFER: usize = 256;

/// Wire frame. Inbound frames carry `type` and `data`; outbound frames add
/// `user_id` and/or `to`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl WsMessage {
    pub fn new(kind: &str, data: Map<String, Value>) -> Self {
        Self {
            kind: kind.to_string(),
            user_id: None,
            to: None,
            data,
        }
    }

    pub fn error(message: &str) -> Self {
        let mut data = Map::new();
        data.insert("message".to_string(), json!(message));
        Self::new("error", data)
    }

    pub fn notification(message: &str, severity: &str) -> Self {
        let mut data = Map::new();
        data.insert("message".to_string(), json!(message));
        data.insert("severity".to_string(), json!(severity));
        Self::new("notification", data)
    }

    pub fn system(message: &str) -> Self {
        let mut data = Map::new();
        data.insert("message".to_string(), json!(message));
        Self::new("system", data)
    }

    pub fn pong(timestamp: i64) -> Self {
        let mut data = Map::new();
        data.insert("timestamp".to_string(), json!(timestamp));
        Self::new("pong", data)
    }
}

/// What the hub pushes down a client's send channel. `Close` tells the
/// writer to emit a close frame and exit.
#[derive(Debug)]
pub enum ClientCommand {
    Message(WsMessage),
    Close,
}

pub struct Registration {
    pub user_id: Uuid,
    pub jti: String,
    pub sender: mpsc::Sender<ClientCommand>,
}

pub struct Unregister {
    pub jti: String,
    pub notify: Option<WsMessage>,
}

struct ClientHandle {
    user_id: Uuid,
    sender: mpsc::Sender<ClientCommand>,
}

#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub jti: String,
    pub connected_at: Instant,
}

/// Index of the earliest-connected entry, or None when empty.
pub fn oldest_connection(connections: &[ClientInfo]) -> Option<usize> {
    connections
        .iter()
        .enumerate()
        .min_by_key(|(_, info)| info.connected_at)
        .map(|(idx, _)| idx)
}

pub struct Hub {
    clients: HashMap<String, ClientHandle>,
    user_connections: HashMap<Uuid, Vec<ClientInfo>>,
    register_rx: mpsc::UnboundedReceiver<Registration>,
    unregister_rx: mpsc::UnboundedReceiver<Unregister>,
    broadcast_rx: mpsc::Receiver<WsMessage>,
}

#[derive(Clone)]
pub struct HubHandle {
    register_tx: mpsc::UnboundedSender<Registration>,
    unregister_tx: mpsc::UnboundedSender<Unregister>,
    broadcast_tx: mpsc::Sender<WsMessage>,
}

impl Hub {
    pub fn spawn() -> (HubHandle, JoinHandle<()>) {
        let (register_tx, register_rx) = mpsc::unbounded_channel();
        let (unregister_tx, unregister_rx) = mpsc::unbounded_channel();
        let (broadcast_tx, broadcast_rx) = mpsc::channel(BROADCAST_BUFFER);

        let hub = Hub {
            clients: HashMap::new(),
            user_connections: HashMap::new(),
            register_rx,
            unregister_rx,
            broadcast_rx,
        };

        let handle = HubHandle {
            register_tx,
            unregister_tx,
            broadcast_tx,
        };

        let task = tokio::spawn(hub.run());
        (handle, task)
    }

    async fn run(mut self) {
        info!("WebSocket hub started");
        loop {
            tokio::select! {
                Some(registration) = self.register_rx.recv() => {
                    self.handle_register(registration);
                }
                Some(unregister) = self.unregister_rx.recv() => {
                    self.handle_unregister(unregister);
                }
                Some(message) = self.broadcast_rx.recv() => {
                    self.handle_broadcast(message);
                }
                else => break,
            }
        }
        info!("WebSocket hub stopped");
    }

    fn handle_register(&mut self, registration: Registration) {
        self.enforce_connection_limit(registration.user_id);

        self.user_connections
            .entry(registration.user_id)
            .or_default()
            .push(ClientInfo {
                jti: registration.jti.clone(),
                connected_at: Instant::now(),
            });

        self.clients.insert(
            registration.jti,
            ClientHandle {
                user_id: registration.user_id,
                sender: registration.sender,
            },
        );
    }

    fn enforce_connection_limit(&mut self, user_id: Uuid) {
        let Some(connections) = self.user_connections.get(&user_id) else {
            return;
        };

        if connections.len() < MAX_CONNECTIONS_PER_USER {
            return;
        }

        let Some(oldest) = oldest_connection(connections) else {
            return;
        };
        let evicted_jti = connections[oldest].jti.clone();

        warn!(
            "User {} exceeded connection limit ({}), disconnecting oldest connection",
            user_id, MAX_CONNECTIONS_PER_USER
        );

        self.remove_client(
            &evicted_jti,
            Some(WsMessage::error(
                "Connection limit exceeded. Disconnecting oldest session.",
            )),
        );
    }

    fn handle_unregister(&mut self, unregister: Unregister) {
        self.remove_client(&unregister.jti, unregister.notify);
    }

    fn remove_client(&mut self, jti: &str, notify: Option<WsMessage>) {
        let Some(handle) = self.clients.remove(jti) else {
            return;
        };

        if let Some(message) = notify {
            let _ = handle.sender.try_send(ClientCommand::Message(message));
        }
        let _ = handle.sender.try_send(ClientCommand::Close);

        let now_empty = match self.user_connections.get_mut(&handle.user_id) {
            Some(connections) => {
                connections.retain(|info| info.jti != jti);
                connections.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.user_connections.remove(&handle.user_id);
        }
    }

    fn handle_broadcast(&mut self, message: WsMessage) {
        let mut slow_consumers = Vec::new();

        match message.to.as_deref() {
            Some("all") => {
                for (jti, handle) in &self.clients {
                    if handle
                        .sender
                        .try_send(ClientCommand::Message(message.clone()))
                        .is_err()
                    {
                        slow_consumers.push(jti.clone());
                    }
                }
            }
            Some(target) => {
                if let Ok(target_user) = Uuid::parse_str(target) {
                    for (jti, handle) in &self.clients {
                        if handle.user_id != target_user {
                            continue;
                        }
                        if handle
                            .sender
                            .try_send(ClientCommand::Message(message.clone()))
                            .is_err()
                        {
                            slow_consumers.push(jti.clone());
                        }
                    }
                }
            }
            None => {}
        }

        for jti in slow_consumers {
            debug!("Dropping slow WebSocket consumer {}", jti);
            self.remove_client(&jti, None);
        }
    }
}

impl HubHandle {
    pub fn register(&self, registration: Registration) {
        let _ = self.register_tx.send(registration);
    }

    pub fn unregister(&self, jti: &str) {
        let _ = self.unregister_tx.send(Unregister {
            jti: jti.to_string(),
            notify: None,
        });
    }

    /// Force-disconnect the session holding this jti, with a final error
    /// frame if its buffer has room. Used when a login revokes tokens.
    pub fn disconnect_client_by_token(&self, jti: &str) {
        let _ = self.unregister_tx.send(Unregister {
            jti: jti.to_string(),
            notify: Some(WsMessage::error("Session expired. Please reconnect.")),
        });
    }

    pub async fn broadcast(&self, message: WsMessage) {
        if self.broadcast_tx.send(message).await.is_err() {
            warn!("WebSocket hub is gone; dropping broadcast");
        }
    }

    pub async fn send_to_user(&self, user_id: Uuid, kind: &str, data: Map<String, Value>) {
        let mut message = WsMessage::new(kind, data);
        message.to = Some(user_id.to_string());
        self.broadcast(message).await;
    }

    pub async fn send_to_all(&self, kind: &str, data: Map<String, Value>) {
        let mut message = WsMessage::new(kind, data);
        message.to = Some("all".to_string());
        self.broadcast(message).await;
    }

    pub async fn send_notification_to_user(&self, user_id: Uuid, message: &str, severity: &str) {
        let mut frame = WsMessage::notification(message, severity);
        frame.to = Some(user_id.to_string());
        self.broadcast(frame).await;
    }

    pub async fn send_system_message(&self, message: &str) {
        let mut frame = WsMessage::system(message);
        frame.to = Some("all".to_string());
        self.broadcast(frame).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn oldest_connection_wins_eviction() {
        let base = Instant::now();
        let connections = vec![
            ClientInfo {
                jti: "b".into(),
                connected_at: base + Duration::from_secs(10),
            },
            ClientInfo {
                jti: "a".into(),
                connected_at: base,
            },
            ClientInfo {
                jti: "c".into(),
                connected_at: base + Duration::from_secs(20),
            },
        ];

        assert_eq!(oldest_connection(&connections), Some(1));
        assert_eq!(oldest_connection(&[]), None);
    }

    #[test]
    fn message_shapes_serialize() {
        let error = WsMessage::error("Session expired. Please reconnect.");
        let raw = serde_json::to_value(&error).unwrap();
        assert_eq!(raw["type"], "error");
        assert_eq!(raw["data"]["message"], "Session expired. Please reconnect.");
        assert!(raw.get("user_id").is_none());
        assert!(raw.get("to").is_none());

        let notification = WsMessage::notification("Inventory is full", "warning");
        let raw = serde_json::to_value(&notification).unwrap();
        assert_eq!(raw["type"], "notification");
        assert_eq!(raw["data"]["severity"], "warning");

        let pong = WsMessage::pong(1_700_000_000);
        let raw = serde_json::to_value(&pong).unwrap();
        assert_eq!(raw["data"]["timestamp"], 1_700_000_000);
    }

    #[test]
    fn inbound_chat_frame_parses() {
        let frame: WsMessage = serde_json::from_str(
            r#"{"type":"chat","data":{"message":"hi","character_name":"hero"}}"#,
        )
        .unwrap();
        assert_eq!(frame.kind, "chat");
        assert_eq!(frame.data["character_name"], "hero");
        assert!(frame.to.is_none());
    }
}
