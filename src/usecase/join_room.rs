//! UseCase: member joins a room.
//!
//! Enforces one live connection per identity (a new connection for the same
//! user force-closes the old one), admits the member into the room state,
//! and broadcasts the refreshed roster.

use std::sync::Arc;

use crate::common::time::Clock;
use crate::domain::{
    ConnectionId, MessagePusher, PusherChannel, RoomCode, RoomStore, RoomUser, UserId, Username,
};
use crate::infrastructure::dto::websocket::{RoomUserDto, ServerEvent};
use crate::infrastructure::registry::ConnectionRegistry;

pub struct JoinRoomUseCase {
    registry: Arc<ConnectionRegistry>,
    store: Arc<dyn RoomStore>,
    pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl JoinRoomUseCase {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        store: Arc<dyn RoomStore>,
        pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            store,
            pusher,
            clock,
        }
    }

    /// Execute the join. `sender` is the connection's outbound channel; it
    /// is `None` when the connection is already registered with the pusher
    /// (a re-join moving to another room).
    ///
    /// Returns the roster broadcast to the room.
    pub async fn execute(
        &self,
        room: RoomCode,
        user_id: UserId,
        username: Username,
        connection_id: ConnectionId,
        sender: Option<PusherChannel>,
    ) -> Vec<RoomUser> {
        // Supersession: force-close any previous connection of this identity
        if let Some(old) = self.registry.register(user_id.clone(), connection_id).await {
            tracing::info!(
                "Superseding connection '{}' of user '{}' with '{}'",
                old,
                user_id,
                connection_id
            );
            self.pusher.unregister(&old).await;
            if let Some((old_room, old_name)) = self.store.leave_connection(&old).await {
                self.broadcast_departure(&old_room, &old_name, &old).await;
            }
        }

        if let Some(sender) = sender {
            self.pusher.register(connection_id, sender).await;
        }

        // A connection that joins a second room moves there
        if let Some((previous_room, previous_name)) =
            self.store.leave_connection(&connection_id).await
        {
            if previous_room != room {
                self.broadcast_departure(&previous_room, &previous_name, &connection_id)
                    .await;
            }
        }

        let now = self.clock.now_millis();
        let roster = self
            .store
            .join(room.clone(), user_id, username.clone(), connection_id, now)
            .await;

        let targets = self.store.member_connections(&room).await;

        // Full roster snapshot to everyone, incremental notice to the others
        let roster_event = ServerEvent::RoomUsers(to_dto(&roster));
        self.pusher.broadcast(&targets, &roster_event.to_json()).await;

        let joined_event = ServerEvent::UserJoined {
            username: username.to_string(),
            connection_id,
        };
        let others: Vec<ConnectionId> = targets
            .into_iter()
            .filter(|conn| *conn != connection_id)
            .collect();
        self.pusher.broadcast(&others, &joined_event.to_json()).await;

        tracing::info!("User '{}' joined room '{}'", username, room);
        roster
    }

    async fn broadcast_departure(
        &self,
        room: &RoomCode,
        username: &Username,
        connection_id: &ConnectionId,
    ) {
        let targets = self.store.member_connections(room).await;
        let left_event = ServerEvent::UserLeft {
            username: username.to_string(),
            connection_id: *connection_id,
        };
        self.pusher.broadcast(&targets, &left_event.to_json()).await;

        let roster = self.store.roster(room).await;
        let roster_event = ServerEvent::RoomUsers(to_dto(&roster));
        self.pusher.broadcast(&targets, &roster_event.to_json()).await;
    }
}

fn to_dto(roster: &[RoomUser]) -> Vec<RoomUserDto> {
    roster
        .iter()
        .map(|u| RoomUserDto {
            connection_id: u.connection_id,
            username: u.username.to_string(),
        })
        .collect()
}
