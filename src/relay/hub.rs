use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use super::events::{RelayedMessage, ServerEvent};
use super::ConnectionId;

#[derive(Default)]
struct HubState {
    // user id -> live connection
    presence: HashMap<String, ConnectionId>,
    connections: HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>,
}

impl HubState {
    fn broadcast_presence(&self) {
        let event = ServerEvent::GetUsers(self.presence.clone());
        for tx in self.connections.values() {
            // closed receivers are removed on disconnect
            let _ = tx.send(event.clone());
        }
    }
}

/// Presence table and best-effort relay for one process.
///
/// All reads and writes go through one mutex, so each operation sees and
/// leaves a consistent table. Nothing is persisted.
#[derive(Default)]
pub struct RelayHub {
    state: Mutex<HubState>,
}

impl RelayHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a transport connection and returns its id and event stream.
    pub async fn connect(&self) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();

        self.state.lock().await.connections.insert(id, tx);
        (id, rx)
    }

    /// Maps `user_id` to `connection_id`, replacing any previous entry, and
    /// sends the full table to every connection.
    pub async fn announce_presence(&self, user_id: &str, connection_id: ConnectionId) {
        let mut state = self.state.lock().await;
        state.presence.insert(user_id.to_string(), connection_id);
        tracing::debug!("🟢 {} present on {}", user_id, connection_id);
        state.broadcast_presence();
    }

    /// Pushes `text` to the receiver's live connection. Returns `false` when
    /// the receiver is not present; that is not an error.
    pub async fn relay(&self, sender_id: &str, receiver_id: &str, text: &str) -> bool {
        let state = self.state.lock().await;

        let Some(tx) = state
            .presence
            .get(receiver_id)
            .and_then(|conn| state.connections.get(conn))
        else {
            tracing::debug!("📭 {} not present, relay skipped", receiver_id);
            return false;
        };

        let event = ServerEvent::GetMessage(RelayedMessage {
            sender_id: sender_id.to_string(),
            text: text.to_string(),
            timestamp: Utc::now().timestamp_millis(),
        });
        tx.send(event).is_ok()
    }

    /// Forgets the connection and any presence entries pointing at it. The
    /// table is re-broadcast only when an entry was removed.
    pub async fn disconnect(&self, connection_id: ConnectionId) {
        let mut state = self.state.lock().await;
        state.connections.remove(&connection_id);

        let before = state.presence.len();
        state.presence.retain(|_, conn| *conn != connection_id);

        if state.presence.len() != before {
            tracing::debug!("🔴 connection {} left", connection_id);
            state.broadcast_presence();
        }
    }

    pub async fn lookup(&self, user_id: &str) -> Option<ConnectionId> {
        self.state.lock().await.presence.get(user_id).copied()
    }

    pub async fn snapshot(&self) -> HashMap<String, ConnectionId> {
        self.state.lock().await.presence.clone()
    }

    pub async fn connection_count(&self) -> usize {
        self.state.lock().await.connections.len()
    }
}
