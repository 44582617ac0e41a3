pub mod events;
pub mod hub;

pub use events::{ClientEvent, OutgoingMessage, RelayedMessage, ServerEvent};
pub use hub::RelayHub;

/// Transport-assigned id of a live socket.
pub type ConnectionId = uuid::Uuid;

/// Applies one client frame to the hub on behalf of `connection_id`.
pub async fn dispatch(hub: &RelayHub, connection_id: ConnectionId, event: ClientEvent) {
    match event {
        ClientEvent::AddUser(user_id) => hub.announce_presence(&user_id, connection_id).await,
        ClientEvent::SendMessage(msg) => {
            hub.relay(&msg.sender_id, &msg.receiver_id, &msg.text).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(raw: &str) -> ClientEvent {
        serde_json::from_str(raw).unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_wire_frames() {
        let hub = RelayHub::new();
        let (alice, mut alice_rx) = hub.connect().await;
        let (bob, mut bob_rx) = hub.connect().await;

        dispatch(&hub, alice, frame(r#"{"event":"addUser","data":"alice"}"#)).await;
        dispatch(&hub, bob, frame(r#"{"event":"addUser","data":"bob"}"#)).await;
        assert_eq!(hub.lookup("alice").await, Some(alice));
        assert_eq!(hub.lookup("bob").await, Some(bob));
        while alice_rx.try_recv().is_ok() {}
        while bob_rx.try_recv().is_ok() {}

        dispatch(
            &hub,
            alice,
            frame(r#"{"event":"sendMessage","data":{"senderId":"alice","receiverId":"bob","text":"hello"}}"#),
        )
        .await;

        match bob_rx.try_recv() {
            Ok(ServerEvent::GetMessage(msg)) => {
                assert_eq!(msg.sender_id, "alice");
                assert_eq!(msg.text, "hello");
            }
            other => panic!("expected a relayed message, got {:?}", other),
        }
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dispatch_to_absent_receiver_sends_nothing() {
        let hub = RelayHub::new();
        let (alice, mut alice_rx) = hub.connect().await;
        dispatch(&hub, alice, frame(r#"{"event":"addUser","data":"alice"}"#)).await;
        while alice_rx.try_recv().is_ok() {}

        dispatch(
            &hub,
            alice,
            frame(r#"{"event":"sendMessage","data":{"senderId":"alice","receiverId":"nobody","text":"?"}}"#),
        )
        .await;

        assert!(alice_rx.try_recv().is_err());
        assert_eq!(hub.snapshot().await.len(), 1);
    }
}
