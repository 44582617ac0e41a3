use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::ConnectionId;

/// Frames a client may send over the socket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    AddUser(String),
    SendMessage(OutgoingMessage),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub sender_id: String,
    pub receiver_id: String,
    pub text: String,
}

/// Frames the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// The whole presence table, user id to connection id.
    GetUsers(HashMap<String, ConnectionId>),
    GetMessage(RelayedMessage),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayedMessage {
    pub sender_id: String,
    pub text: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
}
