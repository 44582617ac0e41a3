use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;

use crate::api::state::AppState;
use crate::relay::{self, ClientEvent, ConnectionId, RelayHub, ServerEvent};

/// GET /ws
pub async fn relay_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: AppState, socket: WebSocket) {
    let hub = state.relay.clone();
    let connection = hub.connect().await;
    let (sender, receiver) = socket.split();
    serve_connection(hub, connection, sender, receiver).await;
}

fn parse_frame(msg: Message) -> Option<ClientEvent> {
    let parsed = match msg {
        Message::Text(text) => serde_json::from_str::<ClientEvent>(&text),
        Message::Binary(bytes) => serde_json::from_slice::<ClientEvent>(&bytes),
        _ => return None,
    };
    // Malformed frames are ignored
    parsed.ok()
}

/// Runs a connection already registered with the hub until either side goes
/// away, then removes it.
pub async fn serve_connection<Tx, Rx, E>(
    hub: Arc<RelayHub>,
    (connection_id, mut events): (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>),
    sender: Tx,
    receiver: Rx,
) where
    Tx: Sink<Message> + Send + 'static,
    Rx: Stream<Item = Result<Message, E>> + Send + 'static,
    E: Send + 'static,
{
    tracing::debug!("🔌 New client connected: {}", connection_id);

    let mut forward_task = tokio::spawn(async move {
        let mut sender = std::pin::pin!(sender);
        while let Some(event) = events.recv().await {
            let Ok(text) = serde_json::to_string(&event) else {
                continue;
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let recv_hub = hub.clone();
    let mut recv_task = tokio::spawn(async move {
        let mut receiver = std::pin::pin!(receiver);
        while let Some(Ok(msg)) = receiver.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
            if let Some(event) = parse_frame(msg) {
                relay::dispatch(&recv_hub, connection_id, event).await;
            }
        }
    });

    tokio::select! {
        _ = &mut forward_task => recv_task.abort(),
        _ = &mut recv_task => forward_task.abort(),
    }

    hub.disconnect(connection_id).await;
    tracing::debug!("🔌 Client disconnected: {}", connection_id);
}
