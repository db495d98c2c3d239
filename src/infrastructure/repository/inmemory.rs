//! In-memory room store.
//!
//! Concrete implementation of the `RoomStore` trait the domain layer
//! defines. All rooms live behind one process-wide mutex; distinct rooms are
//! independent in the data model but share the lock, which is acceptable at
//! the room volumes this core targets. The alert expiry timers and the
//! pruning sweep go through the same lock, so they never race an in-flight
//! sample ingest.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    BatteryStatus, ConnectionId, LocationSample, Member, MemberPosition, RepositoryError,
    RoomCode, RoomSnapshot, RoomState, RoomStore, RoomUser, UserId, Username,
};

pub struct InMemoryRoomStore {
    rooms: Mutex<HashMap<RoomCode, RoomState>>,
    trail_window_ms: i64,
    trail_max_points: usize,
}

impl InMemoryRoomStore {
    pub fn new(trail_window_ms: i64, trail_max_points: usize) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            trail_window_ms,
            trail_max_points,
        }
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn join(
        &self,
        room: RoomCode,
        user_id: UserId,
        username: Username,
        connection_id: ConnectionId,
        now: i64,
    ) -> Vec<RoomUser> {
        let mut rooms = self.rooms.lock().await;
        let state = rooms
            .entry(room.clone())
            .or_insert_with(|| RoomState::new(room));
        let member = Member::new(user_id, username, connection_id, now);
        if let Some(replaced) = state.add_member(member) {
            tracing::debug!(
                "Replaced presence on connection '{}' during join of '{}'",
                replaced,
                connection_id
            );
        }
        state.roster()
    }

    async fn leave_connection(
        &self,
        connection_id: &ConnectionId,
    ) -> Option<(RoomCode, Username)> {
        let mut rooms = self.rooms.lock().await;
        let code = rooms
            .values()
            .find(|state| state.member(connection_id).is_some())
            .map(|state| state.code.clone())?;
        let state = rooms.get_mut(&code)?;
        let removed = state.remove_connection(connection_id)?;
        if state.is_empty() {
            rooms.remove(&code);
            tracing::info!("Room '{}' is empty, dropping its state", code);
        }
        Some((code, removed.username))
    }

    async fn record_sample(
        &self,
        room: &RoomCode,
        connection_id: &ConnectionId,
        sample: LocationSample,
    ) -> Result<Username, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let state = rooms
            .get_mut(room)
            .ok_or_else(|| RepositoryError::RoomNotFound(room.to_string()))?;
        let member = state
            .member_mut(connection_id)
            .ok_or_else(|| RepositoryError::MemberNotFound(connection_id.to_string()))?;
        member.record_sample(sample, self.trail_window_ms, self.trail_max_points);
        Ok(member.username.clone())
    }

    async fn member_connections(&self, room: &RoomCode) -> Vec<ConnectionId> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room)
            .map(|state| state.members().map(|m| m.connection_id).collect())
            .unwrap_or_default()
    }

    async fn is_member(&self, room: &RoomCode, connection_id: &ConnectionId) -> bool {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room)
            .is_some_and(|state| state.member(connection_id).is_some())
    }

    async fn roster(&self, room: &RoomCode) -> Vec<RoomUser> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room)
            .map(|state| state.roster())
            .unwrap_or_default()
    }

    async fn active_positions(&self, room: &RoomCode, active_since: i64) -> Vec<MemberPosition> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room)
            .map(|state| state.active_positions(active_since))
            .unwrap_or_default()
    }

    async fn set_stationary(
        &self,
        room: &RoomCode,
        connection_id: &ConnectionId,
        until: Option<i64>,
    ) {
        let mut rooms = self.rooms.lock().await;
        if let Some(member) = rooms
            .get_mut(room)
            .and_then(|state| state.member_mut(connection_id))
        {
            member.stationary_until = until;
        }
    }

    async fn set_battery(
        &self,
        room: &RoomCode,
        connection_id: &ConnectionId,
        battery: BatteryStatus,
    ) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let state = rooms
            .get_mut(room)
            .ok_or_else(|| RepositoryError::RoomNotFound(room.to_string()))?;
        let member = state
            .member_mut(connection_id)
            .ok_or_else(|| RepositoryError::MemberNotFound(connection_id.to_string()))?;
        member.battery = Some(battery);
        Ok(())
    }

    async fn prune_trails(&self, now: i64) {
        let mut rooms = self.rooms.lock().await;
        for state in rooms.values_mut() {
            for member in state.members_mut() {
                member.prune_trail(now, self.trail_window_ms);
            }
        }
    }

    async fn trail(&self, room: &RoomCode, connection_id: &ConnectionId) -> Vec<LocationSample> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room)
            .and_then(|state| state.member(connection_id))
            .map(|member| member.trail.clone())
            .unwrap_or_default()
    }

    async fn room_codes(&self) -> Vec<RoomCode> {
        let rooms = self.rooms.lock().await;
        let mut codes: Vec<RoomCode> = rooms.keys().cloned().collect();
        codes.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        codes
    }

    async fn room_snapshot(&self, room: &RoomCode, now: i64) -> Option<RoomSnapshot> {
        let rooms = self.rooms.lock().await;
        rooms.get(room).map(|state| state.snapshot(now))
    }
}
