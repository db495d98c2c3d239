//! UseCase: chat/SOS/anomaly message relay.
//!
//! The body is relayed verbatim to every member, sender included. An SOS
//! additionally marks the sender stationary for the alert window and arms the
//! auto-clear timer; chat and anomaly kinds are pure relay.

use std::sync::Arc;
use std::time::Duration;

use crate::common::time::Clock;
use crate::domain::{ConnectionId, CoreConfig, MessagePusher, RoomCode, RoomStore};
use crate::infrastructure::dto::websocket::{MessageBody, MessageKind, ServerEvent};
use crate::usecase::alert_expiry::AlertTimers;
use crate::usecase::error::MessageError;

pub struct SendMessageUseCase {
    store: Arc<dyn RoomStore>,
    pusher: Arc<dyn MessagePusher>,
    timers: Arc<AlertTimers>,
    clock: Arc<dyn Clock>,
    config: CoreConfig,
}

impl SendMessageUseCase {
    pub fn new(
        store: Arc<dyn RoomStore>,
        pusher: Arc<dyn MessagePusher>,
        timers: Arc<AlertTimers>,
        clock: Arc<dyn Clock>,
        config: CoreConfig,
    ) -> Self {
        Self {
            store,
            pusher,
            timers,
            clock,
            config,
        }
    }

    pub async fn execute(
        &self,
        room: RoomCode,
        connection_id: ConnectionId,
        message: MessageBody,
    ) -> Result<(), MessageError> {
        if !self.store.is_member(&room, &connection_id).await {
            return Err(MessageError::NotAMember(
                connection_id.to_string(),
                room.to_string(),
            ));
        }

        if message.kind == MessageKind::Sos {
            let now = self.clock.now_millis();
            let until = now + self.config.alert_duration_ms;
            self.store
                .set_stationary(&room, &connection_id, Some(until))
                .await;
            self.timers
                .schedule_stationary_clear(
                    room.clone(),
                    connection_id,
                    Duration::from_millis(self.config.alert_duration_ms as u64),
                )
                .await;
            tracing::warn!(
                "SOS from '{}' in room '{}': {}",
                message.sender,
                room,
                message.content
            );
        }

        let targets = self.store.member_connections(&room).await;
        let event = ServerEvent::RoomMessage {
            from: connection_id,
            message,
        };
        self.pusher.broadcast(&targets, &event.to_json()).await;
        Ok(())
    }
}
