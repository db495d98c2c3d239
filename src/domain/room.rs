//! Room state: members, current locations, trails, alert flags, battery.
//!
//! Pure in-memory model; the store in the infrastructure layer wraps it in
//! a lock and exposes it through the `RoomStore` trait.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::geo::Coordinates;
use super::values::{ConnectionId, RoomCode, UserId, Username};

/// One recorded position. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub coords: Coordinates,
    /// Unix millis at which the sample was accepted
    pub recorded_at: i64,
}

impl LocationSample {
    pub fn new(coords: Coordinates, recorded_at: i64) -> Self {
        Self { coords, recorded_at }
    }
}

/// Latest advisory battery reading for a member
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryStatus {
    pub level: f64,
    pub charging: bool,
    pub observed_at: i64,
}

/// One identity's live presence in a room, bound to exactly one connection
#[derive(Debug, Clone)]
pub struct Member {
    pub user_id: UserId,
    pub username: Username,
    pub connection_id: ConnectionId,
    pub joined_at: i64,
    pub current: Option<LocationSample>,
    pub trail: Vec<LocationSample>,
    /// Set while a stationary/SOS alert is active; cleared by the expiry timer
    pub stationary_until: Option<i64>,
    pub battery: Option<BatteryStatus>,
}

impl Member {
    pub fn new(
        user_id: UserId,
        username: Username,
        connection_id: ConnectionId,
        joined_at: i64,
    ) -> Self {
        Self {
            user_id,
            username,
            connection_id,
            joined_at,
            current: None,
            trail: Vec::new(),
            stationary_until: None,
            battery: None,
        }
    }

    /// Record a sample as the current location and append it to the trail,
    /// discarding entries older than the window and capping the length.
    pub fn record_sample(&mut self, sample: LocationSample, window_ms: i64, max_points: usize) {
        self.current = Some(sample);
        self.trail.push(sample);
        self.prune_trail(sample.recorded_at, window_ms);
        if self.trail.len() > max_points {
            let excess = self.trail.len() - max_points;
            self.trail.drain(..excess);
        }
    }

    /// Snapshot-and-replace prune so a partially filtered trail is never
    /// observable.
    pub fn prune_trail(&mut self, now: i64, window_ms: i64) {
        let cutoff = now - window_ms;
        if self.trail.iter().any(|s| s.recorded_at < cutoff) {
            let kept: Vec<LocationSample> = self
                .trail
                .iter()
                .copied()
                .filter(|s| s.recorded_at >= cutoff)
                .collect();
            self.trail = kept;
        }
    }

    pub fn last_seen(&self) -> Option<i64> {
        self.current.map(|s| s.recorded_at)
    }

    pub fn is_stationary(&self, now: i64) -> bool {
        self.stationary_until.is_some_and(|until| now < until)
    }
}

/// Roster entry handed back to the broadcast layer
#[derive(Debug, Clone, PartialEq)]
pub struct RoomUser {
    pub connection_id: ConnectionId,
    pub username: Username,
}

/// A member's current position, used as group-center input
#[derive(Debug, Clone, PartialEq)]
pub struct MemberPosition {
    pub connection_id: ConnectionId,
    pub username: Username,
    pub coords: Coordinates,
    pub recorded_at: i64,
}

/// Read-only view of a member for the HTTP layer and tests
#[derive(Debug, Clone, Serialize)]
pub struct MemberSnapshot {
    pub connection_id: ConnectionId,
    pub username: Username,
    pub stationary: bool,
    pub last_seen: Option<i64>,
    pub battery: Option<BatteryStatus>,
}

/// Read-only view of a whole room
#[derive(Debug, Clone, Serialize)]
pub struct RoomSnapshot {
    pub code: RoomCode,
    pub members: Vec<MemberSnapshot>,
}

/// In-memory state of one room. Created on first join, dropped when empty.
#[derive(Debug)]
pub struct RoomState {
    pub code: RoomCode,
    members: HashMap<ConnectionId, Member>,
}

impl RoomState {
    pub fn new(code: RoomCode) -> Self {
        Self {
            code,
            members: HashMap::new(),
        }
    }

    /// Add a member, replacing any previous presence of the same identity.
    /// Returns the connection id of the replaced presence, if any.
    pub fn add_member(&mut self, member: Member) -> Option<ConnectionId> {
        let replaced = self
            .members
            .values()
            .find(|m| m.user_id == member.user_id && m.connection_id != member.connection_id)
            .map(|m| m.connection_id);
        if let Some(old) = replaced {
            self.members.remove(&old);
        }
        self.members.insert(member.connection_id, member);
        replaced
    }

    pub fn remove_connection(&mut self, connection_id: &ConnectionId) -> Option<Member> {
        self.members.remove(connection_id)
    }

    pub fn member(&self, connection_id: &ConnectionId) -> Option<&Member> {
        self.members.get(connection_id)
    }

    pub fn member_mut(&mut self, connection_id: &ConnectionId) -> Option<&mut Member> {
        self.members.get_mut(connection_id)
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    pub fn members_mut(&mut self) -> impl Iterator<Item = &mut Member> {
        self.members.values_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Full roster, sorted by username for consistent ordering
    pub fn roster(&self) -> Vec<RoomUser> {
        let mut roster: Vec<RoomUser> = self
            .members
            .values()
            .map(|m| RoomUser {
                connection_id: m.connection_id,
                username: m.username.clone(),
            })
            .collect();
        roster.sort_by(|a, b| a.username.as_str().cmp(b.username.as_str()));
        roster
    }

    /// Members with a sample newer than `active_since`
    pub fn active_positions(&self, active_since: i64) -> Vec<MemberPosition> {
        self.members
            .values()
            .filter_map(|m| {
                let sample = m.current?;
                (sample.recorded_at > active_since).then(|| MemberPosition {
                    connection_id: m.connection_id,
                    username: m.username.clone(),
                    coords: sample.coords,
                    recorded_at: sample.recorded_at,
                })
            })
            .collect()
    }

    pub fn snapshot(&self, now: i64) -> RoomSnapshot {
        let mut members: Vec<MemberSnapshot> = self
            .members
            .values()
            .map(|m| MemberSnapshot {
                connection_id: m.connection_id,
                username: m.username.clone(),
                stationary: m.is_stationary(now),
                last_seen: m.last_seen(),
                battery: m.battery,
            })
            .collect();
        members.sort_by(|a, b| a.username.as_str().cmp(b.username.as_str()));
        RoomSnapshot {
            code: self.code.clone(),
            members,
        }
    }
}
