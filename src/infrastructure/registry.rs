//! Connection registry: one live connection per user identity.
//!
//! Joining with an identity that already has a connection supersedes the
//! old one; the caller is responsible for force-closing it (by dropping its
//! pusher channel). Unregister is guarded so a stale cleanup from a
//! superseded connection cannot evict the new mapping.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::domain::{ConnectionId, UserId};

#[derive(Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<UserId, ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map the identity to this connection. Returns the superseded
    /// connection if the identity was already registered.
    pub async fn register(
        &self,
        user_id: UserId,
        connection_id: ConnectionId,
    ) -> Option<ConnectionId> {
        let mut connections = self.connections.lock().await;
        let old = connections.insert(user_id, connection_id);
        old.filter(|previous| *previous != connection_id)
    }

    /// Remove the mapping owned by this connection, whatever identity it
    /// carries. A connection that was already superseded removes nothing.
    pub async fn unregister_connection(&self, connection_id: &ConnectionId) -> Option<UserId> {
        let mut connections = self.connections.lock().await;
        let user_id = connections
            .iter()
            .find(|(_, conn)| *conn == connection_id)
            .map(|(user_id, _)| user_id.clone())?;
        connections.remove(&user_id);
        Some(user_id)
    }

    pub async fn connection_for(&self, user_id: &UserId) -> Option<ConnectionId> {
        let connections = self.connections.lock().await;
        connections.get(user_id).copied()
    }

    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_register_new_identity_supersedes_nothing() {
        // given (precondition):
        let registry = ConnectionRegistry::new();

        // when (operation):
        let superseded = registry.register(user("u1"), ConnectionId::new()).await;

        // then (expected result):
        assert_eq!(superseded, None);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_register_same_identity_returns_superseded_connection() {
        // given (precondition):
        let registry = ConnectionRegistry::new();
        let first = ConnectionId::new();
        registry.register(user("u1"), first).await;

        // when (operation):
        let second = ConnectionId::new();
        let superseded = registry.register(user("u1"), second).await;

        // then (expected result): exactly one live connection afterwards
        assert_eq!(superseded, Some(first));
        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.connection_for(&user("u1")).await, Some(second));
    }

    #[tokio::test]
    async fn test_stale_unregister_does_not_evict_new_connection() {
        // given (precondition): u1 reconnected, old connection superseded
        let registry = ConnectionRegistry::new();
        let old = ConnectionId::new();
        let new = ConnectionId::new();
        registry.register(user("u1"), old).await;
        registry.register(user("u1"), new).await;

        // when (operation): the superseded connection's cleanup runs late
        let removed = registry.unregister_connection(&old).await;

        // then (expected result): no-op, the new mapping survives
        assert_eq!(removed, None);
        assert_eq!(registry.connection_for(&user("u1")).await, Some(new));
    }

    #[tokio::test]
    async fn test_unregister_removes_own_mapping() {
        // given (precondition):
        let registry = ConnectionRegistry::new();
        let conn = ConnectionId::new();
        registry.register(user("u1"), conn).await;

        // when (operation):
        let removed = registry.unregister_connection(&conn).await;

        // then (expected result):
        assert_eq!(removed, Some(user("u1")));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_redundant_unregister_is_noop() {
        // given (precondition):
        let registry = ConnectionRegistry::new();
        let conn = ConnectionId::new();

        // when (operation):
        let removed = registry.unregister_connection(&conn).await;

        // then (expected result): no error, nothing removed
        assert_eq!(removed, None);
    }
}
