//! JSON event envelope spoken over the WebSocket.
//!
//! Every frame is `{"event": "<kebab-case name>", "data": {...}}` with
//! camelCase payload fields. The same enums are used by the server to emit
//! and by the client to parse, so the two cannot drift apart.

use serde::{Deserialize, Serialize};

use crate::domain::{ConnectionId, Coordinates};

/// Free-form message kinds carried by `chat-message` / `room-message`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Chat,
    Sos,
    Anomaly,
}

/// Body of a chat/SOS/anomaly message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBody {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
    pub sender: String,
    /// RFC 3339 timestamp set by the sending client
    pub timestamp: String,
}

/// Roster entry as sent in `room-users`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomUserDto {
    pub connection_id: ConnectionId,
    pub username: String,
}

/// Client-to-server events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_code: String,
        username: String,
        user_id: String,
    },
    #[serde(rename_all = "camelCase")]
    LocationUpdate {
        room_code: String,
        coords: Coordinates,
    },
    #[serde(rename_all = "camelCase")]
    ChatMessage {
        room_code: String,
        message: MessageBody,
    },
    #[serde(rename_all = "camelCase")]
    BatteryStatus {
        room_code: String,
        level: f64,
        charging: bool,
    },
    #[serde(rename_all = "camelCase")]
    LeaveRoom { room_code: String },
}

/// Server-to-client events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    RoomUsers(Vec<RoomUserDto>),
    #[serde(rename_all = "camelCase")]
    UserJoined {
        username: String,
        connection_id: ConnectionId,
    },
    #[serde(rename_all = "camelCase")]
    UserLeft {
        username: String,
        connection_id: ConnectionId,
    },
    #[serde(rename_all = "camelCase")]
    LocationUpdate {
        connection_id: ConnectionId,
        username: String,
        coords: Coordinates,
    },
    #[serde(rename_all = "camelCase")]
    AnomalyAlert {
        #[serde(rename = "type")]
        kind: String,
        connection_id: ConnectionId,
        username: String,
        location: Coordinates,
        /// Rounded to whole meters
        distance: u64,
    },
    #[serde(rename_all = "camelCase")]
    RoomMessage {
        from: ConnectionId,
        message: MessageBody,
    },
    #[serde(rename_all = "camelCase")]
    UserBatteryUpdate {
        connection_id: ConnectionId,
        level: f64,
        charging: bool,
    },
}

impl ServerEvent {
    /// Serialize for the wire. Server events are built from validated local
    /// values, so serialization cannot fail in practice.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("server event serializes")
    }
}
