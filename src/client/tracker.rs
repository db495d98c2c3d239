//! Client-side room state: peer positions, marker classification, own
//! movement watch, and the local geofence.
//!
//! Pure state machine fed by parsed server events and own GPS fixes; the
//! session layer owns the socket and the terminal. The caller passes `now`
//! in, so everything here is testable without a running clock.

use std::collections::HashMap;

use crate::domain::{
    centroid, classify_marker, haversine_distance, ConnectionId, Coordinates, CoreConfig,
    Geofence, GeofenceTransition, GeofenceWatch, MarkerState, MovementTracker, StationaryAlert,
};
use crate::infrastructure::dto::websocket::{MessageBody, MessageKind, ServerEvent};

/// What the tracker knows about one peer
#[derive(Debug, Clone)]
pub struct PeerState {
    pub username: String,
    pub coords: Option<Coordinates>,
    pub last_update: i64,
    /// Set while the peer's SOS/stationary alert window is active
    pub stationary_until: Option<i64>,
    pub battery: Option<(f64, bool)>,
}

/// Display-worthy outcome of applying a server event
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerNotice {
    Roster(Vec<String>),
    PeerJoined { username: String },
    PeerLeft { username: String },
    PeerMoved { username: String, marker: MarkerState },
    Anomaly {
        username: String,
        distance: u64,
        play_sound: bool,
    },
    Message { body: MessageBody },
    Battery {
        username: String,
        level: f64,
        charging: bool,
    },
}

/// Outcome of recording an own GPS fix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OwnFixOutcome {
    /// Set when standing still crossed the stationary limit (auto-SOS)
    pub stationary_alert: Option<StationaryAlert>,
    pub fence_transition: Option<GeofenceTransition>,
}

pub struct RoomTracker {
    config: CoreConfig,
    peers: HashMap<ConnectionId, PeerState>,
    movement: MovementTracker,
    fence: Option<Geofence>,
    fence_watch: GeofenceWatch,
    /// End of the alert window the sound last played for
    sound_played_until: Option<i64>,
}

impl RoomTracker {
    pub fn new(config: CoreConfig, now: i64) -> Self {
        Self {
            config,
            peers: HashMap::new(),
            movement: MovementTracker::new(now),
            fence: None,
            fence_watch: GeofenceWatch::new(),
            sound_played_until: None,
        }
    }

    /// Apply one server event. Returns what is worth telling the user.
    pub fn apply(&mut self, event: &ServerEvent, now: i64) -> Option<TrackerNotice> {
        match event {
            ServerEvent::RoomUsers(users) => {
                // Replace the roster, keeping known positions
                let mut next = HashMap::new();
                for user in users {
                    let previous = self.peers.remove(&user.connection_id);
                    next.insert(
                        user.connection_id,
                        PeerState {
                            username: user.username.clone(),
                            coords: previous.as_ref().and_then(|p| p.coords),
                            last_update: previous.as_ref().map_or(now, |p| p.last_update),
                            stationary_until: previous.as_ref().and_then(|p| p.stationary_until),
                            battery: previous.and_then(|p| p.battery),
                        },
                    );
                }
                self.peers = next;
                let mut names: Vec<String> =
                    self.peers.values().map(|p| p.username.clone()).collect();
                names.sort();
                Some(TrackerNotice::Roster(names))
            }
            ServerEvent::UserJoined {
                username,
                connection_id,
            } => {
                self.peers.insert(
                    *connection_id,
                    PeerState {
                        username: username.clone(),
                        coords: None,
                        last_update: now,
                        stationary_until: None,
                        battery: None,
                    },
                );
                Some(TrackerNotice::PeerJoined {
                    username: username.clone(),
                })
            }
            ServerEvent::UserLeft {
                username,
                connection_id,
            } => {
                self.peers.remove(connection_id);
                Some(TrackerNotice::PeerLeft {
                    username: username.clone(),
                })
            }
            ServerEvent::LocationUpdate {
                connection_id,
                username,
                coords,
            } => {
                let peer = self.peers.entry(*connection_id).or_insert(PeerState {
                    username: username.clone(),
                    coords: None,
                    last_update: now,
                    stationary_until: None,
                    battery: None,
                });
                peer.coords = Some(*coords);
                peer.last_update = now;
                let stationary = peer.stationary_until.is_some_and(|until| now < until);
                let marker = self.classify(*coords, stationary, now);
                Some(TrackerNotice::PeerMoved {
                    username: username.clone(),
                    marker,
                })
            }
            ServerEvent::AnomalyAlert {
                username, distance, ..
            } => {
                let play_sound = self.alert_sound_due(now);
                Some(TrackerNotice::Anomaly {
                    username: username.clone(),
                    distance: *distance,
                    play_sound,
                })
            }
            ServerEvent::RoomMessage { from, message } => {
                // An SOS pins the sender's marker to Stationary for the
                // alert window, same as the server-side flag.
                if message.kind == MessageKind::Sos {
                    if let Some(peer) = self.peers.get_mut(from) {
                        peer.stationary_until = Some(now + self.config.alert_duration_ms);
                    }
                }
                Some(TrackerNotice::Message {
                    body: message.clone(),
                })
            }
            ServerEvent::UserBatteryUpdate {
                connection_id,
                level,
                charging,
            } => {
                let username = match self.peers.get_mut(connection_id) {
                    Some(peer) => {
                        peer.battery = Some((*level, *charging));
                        peer.username.clone()
                    }
                    None => connection_id.to_string(),
                };
                Some(TrackerNotice::Battery {
                    username,
                    level: *level,
                    charging: *charging,
                })
            }
        }
    }

    /// Record an own GPS fix. The first fix centers the geofence.
    pub fn record_own_fix(&mut self, coords: Coordinates, now: i64) -> OwnFixOutcome {
        if self.fence.is_none() {
            self.fence = Some(Geofence::new(coords, self.config.geofence_radius_m));
        }

        let stationary_alert = self.movement.on_sample(coords, now, &self.config);
        let fence_transition = self
            .fence
            .as_ref()
            .and_then(|fence| self.fence_watch.observe(coords, fence));

        OwnFixOutcome {
            stationary_alert,
            fence_transition,
        }
    }

    /// Re-center the geofence on the current point with a new radius.
    pub fn reset_fence(&mut self, center: Coordinates, radius_m: f64) {
        self.fence = Some(Geofence::new(center, radius_m));
        self.fence_watch = GeofenceWatch::new();
    }

    pub fn fence(&self) -> Option<Geofence> {
        self.fence
    }

    /// Centroid of the peers with a fix newer than the activity window
    pub fn group_center(&self, now: i64) -> Option<Coordinates> {
        let active_since = now - self.config.activity_threshold_ms;
        let points: Vec<Coordinates> = self
            .peers
            .values()
            .filter(|p| p.last_update > active_since)
            .filter_map(|p| p.coords)
            .collect();
        centroid(&points)
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    fn classify(&self, coords: Coordinates, stationary: bool, now: i64) -> MarkerState {
        let deviation = self
            .group_center(now)
            .map(|center| haversine_distance(coords, center));
        let outside = self
            .fence
            .as_ref()
            .is_some_and(|fence| fence.is_outside(coords));
        classify_marker(
            stationary,
            deviation,
            outside,
            self.config.client_deviation_threshold_m,
        )
    }

    // The alert sound plays once per alert window, however many alert
    // events arrive inside it.
    fn alert_sound_due(&mut self, now: i64) -> bool {
        if self.sound_played_until.is_some_and(|until| now < until) {
            return false;
        }
        self.sound_played_until = Some(now + self.config.alert_duration_ms);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::dto::websocket::RoomUserDto;

    fn tracker() -> RoomTracker {
        RoomTracker::new(CoreConfig::default(), 0)
    }

    fn location(conn: ConnectionId, username: &str, lat: f64, lng: f64) -> ServerEvent {
        ServerEvent::LocationUpdate {
            connection_id: conn,
            username: username.to_string(),
            coords: Coordinates::new(lat, lng),
        }
    }

    #[test]
    fn test_roster_replaces_peers_but_keeps_known_positions() {
        // given (precondition): bob has a known position
        let mut t = tracker();
        let bob = ConnectionId::new();
        t.apply(&location(bob, "bob", 10.0, 20.0), 1_000);

        // when (operation): a fresh roster arrives with bob still present
        let notice = t.apply(
            &ServerEvent::RoomUsers(vec![RoomUserDto {
                connection_id: bob,
                username: "bob".to_string(),
            }]),
            2_000,
        );

        // then (expected result): roster notice, position kept
        assert_eq!(
            notice,
            Some(TrackerNotice::Roster(vec!["bob".to_string()]))
        );
        assert_eq!(t.group_center(2_000), Some(Coordinates::new(10.0, 20.0)));
    }

    #[test]
    fn test_far_peer_is_classified_as_far() {
        // given (precondition): two clustered peers
        let mut t = tracker();
        t.apply(&location(ConnectionId::new(), "alice", 10.0, 20.0), 1_000);
        t.apply(&location(ConnectionId::new(), "bob", 10.0, 20.0002), 1_000);

        // when (operation): carol reports ~1.1 km from the cluster
        let notice = t.apply(&location(ConnectionId::new(), "carol", 10.0, 20.01), 1_000);

        // then (expected result): marker is Far (deviation > 150 m)
        assert_eq!(
            notice,
            Some(TrackerNotice::PeerMoved {
                username: "carol".to_string(),
                marker: MarkerState::Far,
            })
        );
    }

    #[test]
    fn test_stale_peers_drop_out_of_the_group_center() {
        // given (precondition): a peer whose last fix is past the window
        let mut t = tracker();
        t.apply(&location(ConnectionId::new(), "alice", 10.0, 20.0), 0);

        // when (operation) / then (expected result): no active peers left
        assert_eq!(t.group_center(60_000), None);
    }

    #[test]
    fn test_alert_sound_plays_once_per_window() {
        // given (precondition):
        let mut t = tracker();
        let alert = ServerEvent::AnomalyAlert {
            kind: "deviation".to_string(),
            connection_id: ConnectionId::new(),
            username: "carol".to_string(),
            location: Coordinates::new(10.0, 20.01),
            distance: 888,
        };

        // when (operation): three alerts inside one window, one after it
        let first = t.apply(&alert, 1_000);
        let second = t.apply(&alert, 2_000);
        let third = t.apply(&alert, 29_000);
        let later = t.apply(&alert, 40_000);

        // then (expected result): sound on the first and on the post-window one
        let sound = |n: &Option<TrackerNotice>| match n {
            Some(TrackerNotice::Anomaly { play_sound, .. }) => *play_sound,
            _ => panic!("expected anomaly notice"),
        };
        assert!(sound(&first));
        assert!(!sound(&second));
        assert!(!sound(&third));
        assert!(sound(&later));
    }

    #[test]
    fn test_sos_pins_the_sender_marker_to_stationary() {
        // given (precondition): alice is a known peer, then sends an SOS
        let mut t = tracker();
        let alice = ConnectionId::new();
        t.apply(&location(alice, "alice", 10.0, 20.0), 1_000);
        t.apply(
            &ServerEvent::RoomMessage {
                from: alice,
                message: MessageBody {
                    kind: MessageKind::Sos,
                    content: "SOS Alert from alice".to_string(),
                    sender: "alice".to_string(),
                    timestamp: "2026-08-23T12:00:00+00:00".to_string(),
                },
            },
            2_000,
        );

        // when (operation): she moves inside and then past the alert window
        let during = t.apply(&location(alice, "alice", 10.0, 20.0001), 10_000);
        let after = t.apply(&location(alice, "alice", 10.0, 20.0002), 40_000);

        // then (expected result): Stationary while the window is open, back
        // to Normal once it lapses
        assert_eq!(
            during,
            Some(TrackerNotice::PeerMoved {
                username: "alice".to_string(),
                marker: MarkerState::Stationary,
            })
        );
        assert_eq!(
            after,
            Some(TrackerNotice::PeerMoved {
                username: "alice".to_string(),
                marker: MarkerState::Normal,
            })
        );
    }

    #[test]
    fn test_first_own_fix_centers_the_geofence() {
        // given (precondition):
        let mut t = tracker();
        let home = Coordinates::new(48.2, 16.37);

        // when (operation):
        t.record_own_fix(home, 0);

        // then (expected result): fence centered at the fix, default radius
        let fence = t.fence().unwrap();
        assert_eq!(fence.center, home);
        assert_eq!(fence.radius_m, 300.0);
    }

    #[test]
    fn test_walking_out_of_the_fence_fires_a_transition() {
        // given (precondition): fence centered on the first fix
        let mut t = tracker();
        t.record_own_fix(Coordinates::new(48.2, 16.37), 0);

        // when (operation): ~1.1 km north
        let outcome = t.record_own_fix(Coordinates::new(48.21, 16.37), 10_000);
        let again = t.record_own_fix(Coordinates::new(48.21, 16.37), 20_000);

        // then (expected result): exit fires once, not repeatedly
        assert_eq!(outcome.fence_transition, Some(GeofenceTransition::Exited));
        assert_eq!(again.fence_transition, None);
    }

    #[test]
    fn test_standing_still_past_the_limit_raises_auto_sos() {
        // given (precondition): fixes at the same spot
        let mut t = tracker();
        let spot = Coordinates::new(10.0, 20.0);
        t.record_own_fix(spot, 0);

        // when (operation): another fix 6 minutes later, unmoved
        let outcome = t.record_own_fix(spot, 6 * 60_000);

        // then (expected result): the stationary alert is raised
        assert!(outcome.stationary_alert.is_some());
    }

    #[test]
    fn test_reset_fence_applies_the_new_radius() {
        // given (precondition): default fence from the first fix
        let mut t = tracker();
        let home = Coordinates::new(48.2, 16.37);
        t.record_own_fix(home, 0);

        // when (operation):
        t.reset_fence(home, 500.0);

        // then (expected result):
        assert_eq!(t.fence().unwrap().radius_m, 500.0);
    }
}
