//! Domain layer: value objects, geo math, room state, anomaly state machines,
//! and the traits the usecase layer depends on (dependency inversion).

mod anomaly;
mod config;
mod error;
mod geo;
mod pusher;
mod repository;
mod room;
mod values;

pub use anomaly::{
    GeofenceTransition, GeofenceWatch, MarkerState, MovementTracker, StationaryAlert,
    classify_marker,
};
pub use config::CoreConfig;
pub use error::{MessagePushError, RepositoryError, ValidationError};
pub use geo::{Coordinates, Geofence, centroid, haversine_distance};
pub use pusher::{MessagePusher, PusherChannel};
pub use repository::RoomStore;
pub use room::{
    BatteryStatus, LocationSample, Member, MemberPosition, MemberSnapshot, RoomSnapshot,
    RoomState, RoomUser,
};
pub use values::{ConnectionId, RoomCode, UserId, Username};

#[cfg(test)]
pub use pusher::MockMessagePusher;
#[cfg(test)]
pub use repository::MockRoomStore;
