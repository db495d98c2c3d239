//! UseCase: battery reading relay.
//!
//! Advisory telemetry: the level is validated, stored on the member, and
//! fanned out to the other members. The sender already knows its own level,
//! so it is excluded from the broadcast.

use std::sync::Arc;

use crate::common::time::Clock;
use crate::domain::{BatteryStatus, ConnectionId, MessagePusher, RoomCode, RoomStore};
use crate::infrastructure::dto::websocket::ServerEvent;
use crate::usecase::error::BatteryError;

pub struct UpdateBatteryUseCase {
    store: Arc<dyn RoomStore>,
    pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl UpdateBatteryUseCase {
    pub fn new(
        store: Arc<dyn RoomStore>,
        pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            pusher,
            clock,
        }
    }

    pub async fn execute(
        &self,
        room: RoomCode,
        connection_id: ConnectionId,
        level: f64,
        charging: bool,
    ) -> Result<(), BatteryError> {
        if !level.is_finite() || !(0.0..=1.0).contains(&level) {
            return Err(BatteryError::InvalidLevel(level));
        }

        let battery = BatteryStatus {
            level,
            charging,
            observed_at: self.clock.now_millis(),
        };
        self.store
            .set_battery(&room, &connection_id, battery)
            .await
            .map_err(|_| {
                BatteryError::NotAMember(connection_id.to_string(), room.to_string())
            })?;

        let others: Vec<ConnectionId> = self
            .store
            .member_connections(&room)
            .await
            .into_iter()
            .filter(|conn| *conn != connection_id)
            .collect();
        let event = ServerEvent::UserBatteryUpdate {
            connection_id,
            level,
            charging,
        };
        self.pusher.broadcast(&others, &event.to_json()).await;
        Ok(())
    }
}
