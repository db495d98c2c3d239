//! WebSocket message pusher.
//!
//! Owns the `UnboundedSender` of every live connection and implements the
//! `MessagePusher` trait over them. Socket creation happens in the UI layer
//! (`ui::handler::websocket`); this type only manages senders and delivery.
//!
//! Unregistering a connection drops its sender, which ends that
//! connection's outbound loop — this is how a superseded connection is
//! force-closed.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel};

#[derive(Default)]
pub struct WebSocketMessagePusher {
    clients: Mutex<HashMap<ConnectionId, PusherChannel>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        clients.insert(connection_id, sender);
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
    }

    async fn unregister(&self, connection_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        clients.remove(connection_id);
        tracing::debug!(
            "Connection '{}' unregistered from MessagePusher",
            connection_id
        );
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let clients = self.clients.lock().await;

        if let Some(sender) = clients.get(connection_id) {
            sender
                .send(content.to_string())
                .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
            Ok(())
        } else {
            Err(MessagePushError::ClientNotFound(connection_id.to_string()))
        }
    }

    async fn broadcast(&self, targets: &[ConnectionId], content: &str) {
        let clients = self.clients.lock().await;

        for target in targets {
            if let Some(sender) = clients.get(target) {
                // Partial send failure is tolerated on broadcast
                if let Err(e) = sender.send(content.to_string()) {
                    tracing::warn!("Failed to push message to connection '{}': {}", target, e);
                }
            } else {
                tracing::warn!("Connection '{}' not found during broadcast, skipping", target);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_push_to_success() {
        // given (precondition):
        let pusher = WebSocketMessagePusher::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = ConnectionId::new();
        pusher.register(conn, tx).await;

        // when (operation):
        let result = pusher.push_to(&conn, "Hello").await;

        // then (expected result):
        assert!(result.is_ok());
        assert_eq!(rx.recv().await, Some("Hello".to_string()));
    }

    #[tokio::test]
    async fn test_push_to_unknown_connection_fails() {
        // given (precondition):
        let pusher = WebSocketMessagePusher::new();
        let conn = ConnectionId::new();

        // when (operation):
        let result = pusher.push_to(&conn, "Hello").await;

        // then (expected result):
        assert!(matches!(
            result.unwrap_err(),
            MessagePushError::ClientNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_targets() {
        // given (precondition):
        let pusher = WebSocketMessagePusher::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        pusher.register(a, tx1).await;
        pusher.register(b, tx2).await;

        // when (operation):
        pusher.broadcast(&[a, b], "Broadcast message").await;

        // then (expected result):
        assert_eq!(rx1.recv().await, Some("Broadcast message".to_string()));
        assert_eq!(rx2.recv().await, Some("Broadcast message".to_string()));
    }

    #[tokio::test]
    async fn test_broadcast_tolerates_missing_targets() {
        // given (precondition):
        let pusher = WebSocketMessagePusher::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let known = ConnectionId::new();
        pusher.register(known, tx).await;

        // when (operation): one target was never registered
        pusher.broadcast(&[known, ConnectionId::new()], "msg").await;

        // then (expected result): the known target still receives
        assert_eq!(rx.recv().await, Some("msg".to_string()));
    }

    #[tokio::test]
    async fn test_unregister_closes_the_outbound_channel() {
        // given (precondition): a registered connection
        let pusher = WebSocketMessagePusher::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = ConnectionId::new();
        pusher.register(conn, tx).await;

        // when (operation): the connection is superseded and unregistered
        pusher.unregister(&conn).await;

        // then (expected result): the receiver observes channel closure,
        // which is what tears the superseded socket down
        assert_eq!(rx.recv().await, None);
    }
}
