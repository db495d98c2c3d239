//! UseCase: location sample ingest, fan-out, and server-side deviation check.
//!
//! Every accepted sample is rebroadcast to the whole room (sender included,
//! as the echo confirming the server recorded it). The deviation check then
//! compares the sender against the centroid of the members active within the
//! activity window; only the sender is checked, and only when at least two
//! members are active (a centroid of one is the sender itself).

use std::sync::Arc;

use crate::common::time::Clock;
use crate::domain::{
    centroid, haversine_distance, ConnectionId, Coordinates, CoreConfig, LocationSample,
    MessagePusher, RepositoryError, RoomCode, RoomStore,
};
use crate::infrastructure::dto::websocket::ServerEvent;
use crate::usecase::error::IngestError;

pub struct IngestLocationUseCase {
    store: Arc<dyn RoomStore>,
    pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    config: CoreConfig,
}

impl IngestLocationUseCase {
    pub fn new(
        store: Arc<dyn RoomStore>,
        pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        config: CoreConfig,
    ) -> Self {
        Self {
            store,
            pusher,
            clock,
            config,
        }
    }

    pub async fn execute(
        &self,
        room: RoomCode,
        connection_id: ConnectionId,
        coords: Coordinates,
    ) -> Result<(), IngestError> {
        if !coords.is_finite() {
            return Err(IngestError::InvalidCoordinates);
        }

        let now = self.clock.now_millis();
        let sample = LocationSample::new(coords, now);
        let username = self
            .store
            .record_sample(&room, &connection_id, sample)
            .await
            .map_err(|e| match e {
                RepositoryError::RoomNotFound(code) => IngestError::UnknownRoom(code),
                RepositoryError::MemberNotFound(conn) => IngestError::UnknownMember(conn),
            })?;

        let targets = self.store.member_connections(&room).await;
        let update = ServerEvent::LocationUpdate {
            connection_id,
            username: username.to_string(),
            coords,
        };
        self.pusher.broadcast(&targets, &update.to_json()).await;

        // Deviation: sender vs. the centroid of currently-active members
        let active_since = now - self.config.activity_threshold_ms;
        let positions = self.store.active_positions(&room, active_since).await;
        if positions.len() < 2 {
            return Ok(());
        }
        let points: Vec<Coordinates> = positions.iter().map(|p| p.coords).collect();
        let Some(center) = centroid(&points) else {
            return Ok(());
        };

        let distance = haversine_distance(coords, center);
        if distance > self.config.server_deviation_threshold_m {
            tracing::info!(
                "User '{}' deviates {:.0} m from the group center in room '{}'",
                username,
                distance,
                room
            );
            let alert = ServerEvent::AnomalyAlert {
                kind: "deviation".to_string(),
                connection_id,
                username: username.to_string(),
                location: coords,
                distance: distance.round() as u64,
            };
            self.pusher.broadcast(&targets, &alert.to_json()).await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::time::FixedClock;
    use crate::domain::{MockMessagePusher, UserId, Username};
    use crate::infrastructure::message_pusher::WebSocketMessagePusher;
    use crate::infrastructure::repository::InMemoryRoomStore;
    use tokio::sync::mpsc;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn code(c: &str) -> RoomCode {
        RoomCode::new(c.to_string()).unwrap()
    }

    async fn join(
        store: &Arc<InMemoryRoomStore>,
        pusher: &Arc<WebSocketMessagePusher>,
        user: &str,
    ) -> (ConnectionId, UnboundedReceiver<String>) {
        use crate::domain::MessagePusher as _;
        let conn = ConnectionId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        pusher.register(conn, tx).await;
        store
            .join(
                code("ABC123"),
                UserId::new(format!("id-{user}")).unwrap(),
                Username::new(user.to_string()).unwrap(),
                conn,
                0,
            )
            .await;
        (conn, rx)
    }

    fn drain(rx: &mut UnboundedReceiver<String>) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(frame);
        }
        frames
    }

    #[tokio::test]
    async fn test_non_finite_coordinates_are_rejected_before_any_push() {
        // given (precondition): a pusher that must never be called
        let store = Arc::new(InMemoryRoomStore::new(300_000, 100));
        let mut pusher = MockMessagePusher::new();
        pusher.expect_broadcast().never();
        let usecase = IngestLocationUseCase::new(
            store,
            Arc::new(pusher),
            Arc::new(FixedClock::new(1_000)),
            CoreConfig::default(),
        );

        // when (operation):
        let result = usecase
            .execute(
                code("ABC123"),
                ConnectionId::new(),
                Coordinates::new(f64::NAN, 20.0),
            )
            .await;

        // then (expected result):
        assert_eq!(result, Err(IngestError::InvalidCoordinates));
    }

    #[tokio::test]
    async fn test_ingest_into_unknown_room_is_rejected() {
        // given (precondition): an empty store
        let store = Arc::new(InMemoryRoomStore::new(300_000, 100));
        let mut pusher = MockMessagePusher::new();
        pusher.expect_broadcast().never();
        let usecase = IngestLocationUseCase::new(
            store,
            Arc::new(pusher),
            Arc::new(FixedClock::new(1_000)),
            CoreConfig::default(),
        );

        // when (operation):
        let result = usecase
            .execute(code("NOPE"), ConnectionId::new(), Coordinates::new(10.0, 20.0))
            .await;

        // then (expected result):
        assert_eq!(result, Err(IngestError::UnknownRoom("NOPE".to_string())));
    }

    #[tokio::test]
    async fn test_sample_is_broadcast_to_every_member_including_sender() {
        // given (precondition): alice and bob in the room
        let store = Arc::new(InMemoryRoomStore::new(300_000, 100));
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let (alice, mut rx_a) = join(&store, &pusher, "alice").await;
        let (_bob, mut rx_b) = join(&store, &pusher, "bob").await;
        let usecase = IngestLocationUseCase::new(
            store,
            pusher,
            Arc::new(FixedClock::new(1_000)),
            CoreConfig::default(),
        );

        // when (operation):
        usecase
            .execute(code("ABC123"), alice, Coordinates::new(10.0, 20.0))
            .await
            .unwrap();

        // then (expected result): both receive the echoed location-update
        let to_alice = rx_a.recv().await.unwrap();
        let to_bob = rx_b.recv().await.unwrap();
        assert_eq!(to_alice, to_bob);
        assert!(to_alice.contains(r#""event":"location-update""#));
        assert!(to_alice.contains("alice"));
    }

    #[tokio::test]
    async fn test_deviating_sender_triggers_anomaly_alert() {
        // given (precondition): three members, two clustered, sender far out.
        // Centroid of (20.0, 20.002, 20.01) lng at lat 10 puts the sender
        // roughly 660 m away, well past the 100 m threshold.
        let store = Arc::new(InMemoryRoomStore::new(300_000, 100));
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let clock = Arc::new(FixedClock::new(1_000));
        let (u1, mut rx1) = join(&store, &pusher, "alice").await;
        let (u2, mut rx2) = join(&store, &pusher, "bob").await;
        let (u3, mut rx3) = join(&store, &pusher, "carol").await;
        let usecase = IngestLocationUseCase::new(
            store,
            pusher,
            clock,
            CoreConfig::default(),
        );
        usecase
            .execute(code("ABC123"), u1, Coordinates::new(10.0, 20.0))
            .await
            .unwrap();
        usecase
            .execute(code("ABC123"), u2, Coordinates::new(10.0, 20.002))
            .await
            .unwrap();
        drain(&mut rx1);
        drain(&mut rx2);
        drain(&mut rx3);

        // when (operation): carol reports far from the cluster
        usecase
            .execute(code("ABC123"), u3, Coordinates::new(10.0, 20.01))
            .await
            .unwrap();

        // then (expected result): everyone gets location-update then the alert
        for rx in [&mut rx1, &mut rx2, &mut rx3] {
            let frames = drain(rx);
            assert_eq!(frames.len(), 2);
            assert!(frames[0].contains(r#""event":"location-update""#));
            assert!(frames[1].contains(r#""event":"anomaly-alert""#));
            assert!(frames[1].contains("carol"));
        }
    }

    #[tokio::test]
    async fn test_no_deviation_check_with_a_single_active_member() {
        // given (precondition): only the sender is in the room
        let store = Arc::new(InMemoryRoomStore::new(300_000, 100));
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let (alice, mut rx_a) = join(&store, &pusher, "alice").await;
        let usecase = IngestLocationUseCase::new(
            store,
            pusher,
            Arc::new(FixedClock::new(1_000)),
            CoreConfig::default(),
        );

        // when (operation):
        usecase
            .execute(code("ABC123"), alice, Coordinates::new(10.0, 20.0))
            .await
            .unwrap();

        // then (expected result): the echo only, never an alert
        let frames = drain(&mut rx_a);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].contains(r#""event":"location-update""#));
    }

    #[tokio::test]
    async fn test_stale_members_are_excluded_from_the_centroid() {
        // given (precondition): bob's only sample is far away but older than
        // the activity window, so the centroid is alice and carol alone
        let store = Arc::new(InMemoryRoomStore::new(300_000, 100));
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let clock = Arc::new(FixedClock::new(1_000));
        let (alice, mut rx_a) = join(&store, &pusher, "alice").await;
        let (bob, _rx_b) = join(&store, &pusher, "bob").await;
        let (carol, _rx_c) = join(&store, &pusher, "carol").await;
        let usecase = IngestLocationUseCase::new(
            store,
            pusher,
            clock.clone(),
            CoreConfig::default(),
        );
        usecase
            .execute(code("ABC123"), bob, Coordinates::new(10.0, 25.0))
            .await
            .unwrap();
        clock.advance(60_000);
        usecase
            .execute(code("ABC123"), carol, Coordinates::new(10.0, 20.0))
            .await
            .unwrap();
        drain(&mut rx_a);

        // when (operation): alice reports right next to carol
        usecase
            .execute(code("ABC123"), alice, Coordinates::new(10.0, 20.0001))
            .await
            .unwrap();

        // then (expected result): no alert, the stale far sample did not pull
        // the centroid away
        let frames = drain(&mut rx_a);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].contains(r#""event":"location-update""#));
    }
}
