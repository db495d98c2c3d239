//! Message pusher trait.
//!
//! Abstracts "deliver this payload to that connection" away from the
//! usecase layer. The WebSocket implementation lives in the infrastructure
//! layer; tests use channels or a mock directly.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::sync::mpsc;

use super::error::MessagePushError;
use super::values::ConnectionId;

/// Channel through which serialized events reach one connection's socket
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// Install the sender for a connection. Replacing an existing entry
    /// drops the old sender, which closes the superseded connection's
    /// outbound loop.
    async fn register(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// Remove the sender for a connection. Redundant unregister is a no-op.
    async fn unregister(&self, connection_id: &ConnectionId);

    /// Deliver to a single connection
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// Deliver to every target, tolerating individual failures
    async fn broadcast(&self, targets: &[ConnectionId], content: &str);
}
