//! Usecase layer: one type per operation of the coordination core, wired
//! from the domain traits. The UI layer holds these in its shared state and
//! calls them from the per-connection event loop.

mod alert_expiry;
mod error;
mod ingest_location;
mod join_room;
mod leave_room;
mod prune_trails;
mod send_message;
mod update_battery;

pub use alert_expiry::{AlertKind, AlertTimers};
pub use error::{BatteryError, IngestError, MessageError};
pub use ingest_location::IngestLocationUseCase;
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use prune_trails::spawn_prune_sweep;
pub use send_message::SendMessageUseCase;
pub use update_battery::UpdateBatteryUseCase;
