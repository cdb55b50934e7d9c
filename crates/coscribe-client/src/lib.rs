//! Transport adapter for the coscribe engines.
//!
//! Wraps a bidirectional event channel with named events: messages travel
//! as JSON envelopes tagging the namespace (`text` or `whiteboard`) around
//! the protocol payload. The [`EventChannel`] trait keeps the session
//! wiring independent of the concrete socket, and [`NativeSocket`] backs
//! it with a WebSocket on a background thread.

mod session;
mod socket;

pub use session::Session;
pub use socket::NativeSocket;

use coscribe_core::protocol::{BoardMessage, TextClientMessage, TextServerMessage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("send failed: {0}")]
    Send(String),
    #[error("not connected")]
    NotConnected,
}

/// Connection state of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// An inbound message, tagged with its namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "ns", content = "event", rename_all = "snake_case")]
pub enum ServerEnvelope {
    Text(TextServerMessage),
    Whiteboard(BoardMessage),
}

/// An outbound message, tagged with its namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "ns", content = "event", rename_all = "snake_case")]
pub enum ClientEnvelope {
    Text(TextClientMessage),
    Whiteboard(BoardMessage),
}

/// Events a channel reports when polled.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connected,
    Disconnected,
    /// Transport-level keepalive.
    Ping,
    Message(ServerEnvelope),
    Error { message: String },
}

/// A bidirectional named-event channel.
///
/// Sending is fire-and-forget; inbound traffic is collected and drained
/// with `poll_events`, one handler at a time, so engine state never sees
/// concurrent mutation.
pub trait EventChannel {
    fn send(&mut self, envelope: &ClientEnvelope) -> Result<(), SyncError>;
    fn poll_events(&mut self) -> Vec<ChannelEvent>;
    /// Tear the connection down and establish a fresh one; the server
    /// responds to the new connection with a full snapshot.
    fn reconnect(&mut self) -> Result<(), SyncError>;
    fn state(&self) -> ConnectionState;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_tags_namespace() {
        let envelope = ClientEnvelope::Text(TextClientMessage::CursorMoved {
            position: 4,
            last_mod_id: 7,
        });
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("\"ns\":\"text\""));
        assert!(json.contains("\"type\":\"cursor_moved\""));
    }

    #[test]
    fn test_server_envelope_roundtrip() {
        let envelope = ServerEnvelope::Whiteboard(BoardMessage::Draw {
            id: "draw-ab-1".to_string(),
            d: "M 0 0 L 1 1".to_string(),
        });
        let json = serde_json::to_string(&envelope).unwrap();
        let back: ServerEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn test_unknown_namespace_fails_to_parse() {
        let json = r#"{"ns":"files","event":{"type":"rename"}}"#;
        assert!(serde_json::from_str::<ServerEnvelope>(json).is_err());
    }
}
