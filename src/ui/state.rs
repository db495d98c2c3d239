//! Server state shared across handlers.

use std::sync::Arc;

use crate::common::time::Clock;
use crate::domain::RoomStore;
use crate::usecase::{
    IngestLocationUseCase, JoinRoomUseCase, LeaveRoomUseCase, SendMessageUseCase,
    UpdateBatteryUseCase,
};

/// Shared application state
pub struct AppState {
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    pub ingest_location_usecase: Arc<IngestLocationUseCase>,
    pub send_message_usecase: Arc<SendMessageUseCase>,
    pub update_battery_usecase: Arc<UpdateBatteryUseCase>,
    /// Store handle for the read-only HTTP API
    pub store: Arc<dyn RoomStore>,
    pub clock: Arc<dyn Clock>,
}
