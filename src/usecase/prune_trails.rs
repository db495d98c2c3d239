//! Periodic trail pruning sweep.
//!
//! Trails are pruned on every ingest, but an idle member's trail would
//! otherwise keep its stale tail forever. The sweep walks every room on a
//! fixed interval and drops samples older than the window.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::common::time::Clock;
use crate::domain::RoomStore;

/// Spawn the background sweep. Aborting the handle stops it.
pub fn spawn_prune_sweep(
    store: Arc<dyn RoomStore>,
    clock: Arc<dyn Clock>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The immediate first tick has nothing to prune yet
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let now = clock.now_millis();
            store.prune_trails(now).await;
            tracing::trace!("Trail prune sweep completed");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::time::FixedClock;
    use crate::domain::{
        Coordinates, ConnectionId, LocationSample, RoomCode, UserId, Username,
    };
    use crate::infrastructure::repository::InMemoryRoomStore;

    #[tokio::test(start_paused = true)]
    async fn test_sweep_drops_samples_older_than_the_window() {
        // given (precondition): one stale and one fresh sample in the trail
        let store = Arc::new(InMemoryRoomStore::new(300_000, 100));
        let room = RoomCode::new("ABC123".to_string()).unwrap();
        let conn = ConnectionId::new();
        store
            .join(
                room.clone(),
                UserId::new("u1".to_string()).unwrap(),
                Username::new("alice".to_string()).unwrap(),
                conn,
                0,
            )
            .await;
        store
            .record_sample(&room, &conn, LocationSample::new(Coordinates::new(10.0, 20.0), 0))
            .await
            .unwrap();
        store
            .record_sample(
                &room,
                &conn,
                LocationSample::new(Coordinates::new(10.0, 20.001), 250_000),
            )
            .await
            .unwrap();

        let clock = Arc::new(FixedClock::new(400_000));
        let sweep = spawn_prune_sweep(store.clone(), clock, Duration::from_secs(60));

        // when (operation): one sweep interval elapses
        tokio::time::sleep(Duration::from_secs(61)).await;

        // then (expected result): the stale sample is gone, the fresh one kept
        let trail = store.trail(&room, &conn).await;
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].recorded_at, 250_000);
        sweep.abort();
    }
}
