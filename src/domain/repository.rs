//! Room store trait.
//!
//! The domain layer defines the data-access interface it needs; the
//! infrastructure layer provides the concrete implementation (dependency
//! inversion). The usecase layer depends only on this trait.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use super::error::RepositoryError;
use super::room::{
    BatteryStatus, LocationSample, MemberPosition, RoomSnapshot, RoomUser,
};
use super::values::{ConnectionId, RoomCode, UserId, Username};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Add or replace a member, creating the room on first join.
    /// Returns the full roster after the change.
    async fn join(
        &self,
        room: RoomCode,
        user_id: UserId,
        username: Username,
        connection_id: ConnectionId,
        now: i64,
    ) -> Vec<RoomUser>;

    /// Remove whichever member owns this connection, wherever it is joined.
    /// Drops the room's state when the last member leaves.
    async fn leave_connection(
        &self,
        connection_id: &ConnectionId,
    ) -> Option<(RoomCode, Username)>;

    /// Store a sample as the member's current location and append it to the
    /// trail (window-pruned, length-capped).
    async fn record_sample(
        &self,
        room: &RoomCode,
        connection_id: &ConnectionId,
        sample: LocationSample,
    ) -> Result<Username, RepositoryError>;

    /// Broadcast targets: every connection currently in the room
    async fn member_connections(&self, room: &RoomCode) -> Vec<ConnectionId>;

    /// Whether the connection has completed the join handshake for the room
    async fn is_member(&self, room: &RoomCode, connection_id: &ConnectionId) -> bool;

    /// Full roster, sorted for consistent ordering
    async fn roster(&self, room: &RoomCode) -> Vec<RoomUser>;

    /// Members with a sample newer than `active_since` (group-center input)
    async fn active_positions(&self, room: &RoomCode, active_since: i64) -> Vec<MemberPosition>;

    /// Set or clear the stationary/SOS flag for a member
    async fn set_stationary(
        &self,
        room: &RoomCode,
        connection_id: &ConnectionId,
        until: Option<i64>,
    );

    /// Replace the member's latest battery reading
    async fn set_battery(
        &self,
        room: &RoomCode,
        connection_id: &ConnectionId,
        battery: BatteryStatus,
    ) -> Result<(), RepositoryError>;

    /// Prune every member's trail in every room (periodic sweep)
    async fn prune_trails(&self, now: i64);

    /// A member's current trail
    async fn trail(&self, room: &RoomCode, connection_id: &ConnectionId) -> Vec<LocationSample>;

    /// Codes of all live rooms
    async fn room_codes(&self) -> Vec<RoomCode>;

    /// Read-only view of one room for the HTTP layer
    async fn room_snapshot(&self, room: &RoomCode, now: i64) -> Option<RoomSnapshot>;
}
