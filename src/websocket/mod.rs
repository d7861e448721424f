pub mod client;
pub mod hub;

pub use client::{serve_ws, ChatProvider, MAX_MESSAGE_SIZE};
pub use hub::{Hub, HubHandle, WsMessage, MAX_CONNECTIONS_PER_USER};
