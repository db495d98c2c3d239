//! Anomaly state machines: stationary/SOS detection, geofence edge
//! triggering, and marker classification.
//!
//! Everything here is pure and clock-free: the caller passes `now` in, which
//! keeps the state machines trivially testable and lets the same code run on
//! the server and in the client.

use super::config::CoreConfig;
use super::geo::{Coordinates, Geofence, haversine_distance};

/// Emitted once when a member crosses the stationary limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationaryAlert {
    /// When the active alert window ends
    pub alert_until: i64,
}

/// Per-member stationary/SOS state machine.
///
/// MOVING -> STATIONARY(alert window) -> (auto) -> MOVING. A sample that
/// moves more than the movement threshold resets the timer; standing still
/// past the stationary limit fires exactly one alert, then the timer is
/// re-armed so a continued immobile period fires again only after the full
/// limit re-accumulates. An explicit SOS forces the transition immediately.
#[derive(Debug, Clone)]
pub struct MovementTracker {
    last_position: Option<Coordinates>,
    last_moved_at: i64,
    alert_until: Option<i64>,
}

impl MovementTracker {
    pub fn new(now: i64) -> Self {
        Self {
            last_position: None,
            last_moved_at: now,
            alert_until: None,
        }
    }

    /// Feed one own-position sample. Returns an alert when the stationary
    /// limit is crossed.
    pub fn on_sample(
        &mut self,
        coords: Coordinates,
        now: i64,
        config: &CoreConfig,
    ) -> Option<StationaryAlert> {
        let Some(prev) = self.last_position else {
            self.last_position = Some(coords);
            self.last_moved_at = now;
            return None;
        };

        let distance = haversine_distance(prev, coords);
        if distance > config.movement_threshold_m {
            self.last_position = Some(coords);
            self.last_moved_at = now;
            self.alert_until = None;
            return None;
        }

        if now - self.last_moved_at > config.stationary_limit_ms {
            // Re-arm so the alert does not refire until the limit
            // re-accumulates.
            self.last_moved_at = now;
            let alert_until = now + config.alert_duration_ms;
            self.alert_until = Some(alert_until);
            return Some(StationaryAlert { alert_until });
        }

        None
    }

    /// User-triggered SOS: bypasses the timer and forces the stationary
    /// state for the full alert window.
    pub fn trigger_sos(&mut self, now: i64, config: &CoreConfig) -> StationaryAlert {
        let alert_until = now + config.alert_duration_ms;
        self.alert_until = Some(alert_until);
        self.last_moved_at = now;
        StationaryAlert { alert_until }
    }

    /// Whether the alert window is currently active. Auto-clears by time,
    /// with no further input needed.
    pub fn is_stationary(&self, now: i64) -> bool {
        self.alert_until.is_some_and(|until| now < until)
    }
}

/// Edge-triggered geofence transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeofenceTransition {
    Exited,
    Entered,
}

/// Tracks previous containment so enter/exit fires only on transition,
/// never repeatedly while a member stays outside.
#[derive(Debug, Clone, Default)]
pub struct GeofenceWatch {
    was_outside: bool,
}

impl GeofenceWatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, point: Coordinates, fence: &Geofence) -> Option<GeofenceTransition> {
        let outside = fence.is_outside(point);
        let transition = match (self.was_outside, outside) {
            (false, true) => Some(GeofenceTransition::Exited),
            (true, false) => Some(GeofenceTransition::Entered),
            _ => None,
        };
        self.was_outside = outside;
        transition
    }

    pub fn is_outside(&self) -> bool {
        self.was_outside
    }
}

/// Marker styling state for a member, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerState {
    Stationary,
    Far,
    OutsideGeofence,
    Normal,
}

/// Classify a member's marker. Stationary wins over deviation, deviation
/// over being outside the geofence, mirroring the reference marker styling.
pub fn classify_marker(
    stationary: bool,
    deviation_m: Option<f64>,
    outside_geofence: bool,
    deviation_threshold_m: f64,
) -> MarkerState {
    if stationary {
        MarkerState::Stationary
    } else if deviation_m.is_some_and(|d| d > deviation_threshold_m) {
        MarkerState::Far
    } else if outside_geofence {
        MarkerState::OutsideGeofence
    } else {
        MarkerState::Normal
    }
}
