//! UseCase: member leaves (disconnect or explicit leave-room).
//!
//! Evicts the connection from the registry, the pusher, and the room state,
//! cancels any pending alert timers, and re-broadcasts the roster to the
//! remaining members. Every step is idempotent, so the cleanup of a
//! superseded connection arriving late is harmless.

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, RoomStore, RoomUser};
use crate::infrastructure::dto::websocket::{RoomUserDto, ServerEvent};
use crate::infrastructure::registry::ConnectionRegistry;
use crate::usecase::alert_expiry::AlertTimers;

pub struct LeaveRoomUseCase {
    registry: Arc<ConnectionRegistry>,
    store: Arc<dyn RoomStore>,
    pusher: Arc<dyn MessagePusher>,
    timers: Arc<AlertTimers>,
}

impl LeaveRoomUseCase {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        store: Arc<dyn RoomStore>,
        pusher: Arc<dyn MessagePusher>,
        timers: Arc<AlertTimers>,
    ) -> Self {
        Self {
            registry,
            store,
            pusher,
            timers,
        }
    }

    /// Full disconnect cleanup: the connection is gone, so its outbound
    /// channel is dropped as well.
    pub async fn execute(&self, connection_id: ConnectionId) {
        self.pusher.unregister(&connection_id).await;
        self.evict(connection_id).await;
    }

    /// Explicit leave-room: the member exits the room but the socket stays
    /// open and can join another room.
    pub async fn execute_keep_connection(&self, connection_id: ConnectionId) {
        self.evict(connection_id).await;
    }

    async fn evict(&self, connection_id: ConnectionId) {
        // Guarded: a superseded connection no longer owns a registry entry
        if let Some(user_id) = self.registry.unregister_connection(&connection_id).await {
            tracing::debug!("Unregistered user '{}' from connection registry", user_id);
        }

        let Some((room, username)) = self.store.leave_connection(&connection_id).await else {
            return;
        };

        self.timers.cancel_member(&room, &connection_id).await;

        let targets = self.store.member_connections(&room).await;
        if targets.is_empty() {
            tracing::info!("User '{}' left room '{}' (room now empty)", username, room);
            return;
        }

        let left_event = ServerEvent::UserLeft {
            username: username.to_string(),
            connection_id,
        };
        self.pusher.broadcast(&targets, &left_event.to_json()).await;

        let roster: Vec<RoomUser> = self.store.roster(&room).await;
        let roster_event = ServerEvent::RoomUsers(
            roster
                .iter()
                .map(|u| RoomUserDto {
                    connection_id: u.connection_id,
                    username: u.username.to_string(),
                })
                .collect(),
        );
        self.pusher.broadcast(&targets, &roster_event.to_json()).await;

        tracing::info!("User '{}' left room '{}'", username, room);
    }
}
