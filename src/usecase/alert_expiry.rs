//! Scheduled, cancellable alert expiry.
//!
//! Stationary/SOS alerts auto-clear after a fixed duration even with no
//! further input. Each pending expiry is an explicit tokio task keyed by
//! (room, connection, kind); scheduling again for the same key replaces the
//! task, and disconnect cancels every task the member owns. The expiry goes
//! through the room store, so it takes the same lock as sample ingest.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::domain::{ConnectionId, RoomCode, RoomStore};

/// Alert families with independent expiry timers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    Stationary,
}

type TimerKey = (RoomCode, ConnectionId, AlertKind);

pub struct AlertTimers {
    store: Arc<dyn RoomStore>,
    tasks: Arc<Mutex<HashMap<TimerKey, JoinHandle<()>>>>,
}

impl AlertTimers {
    pub fn new(store: Arc<dyn RoomStore>) -> Self {
        Self {
            store,
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Schedule the stationary flag of (room, connection) to clear after
    /// `duration`. A pending timer for the same key is replaced.
    pub async fn schedule_stationary_clear(
        &self,
        room: RoomCode,
        connection_id: ConnectionId,
        duration: Duration,
    ) {
        let key: TimerKey = (room.clone(), connection_id, AlertKind::Stationary);
        let store = self.store.clone();
        let tasks = self.tasks.clone();
        let task_key = key.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            store.set_stationary(&task_key.0, &task_key.1, None).await;
            tracing::debug!(
                "Stationary alert for connection '{}' in room '{}' auto-cleared",
                task_key.1,
                task_key.0
            );
            tasks.lock().await.remove(&task_key);
        });

        let mut tasks = self.tasks.lock().await;
        if let Some(previous) = tasks.insert(key, handle) {
            previous.abort();
        }
    }

    /// Cancel every pending timer owned by the member. Called on disconnect.
    pub async fn cancel_member(&self, room: &RoomCode, connection_id: &ConnectionId) {
        let mut tasks = self.tasks.lock().await;
        let keys: Vec<TimerKey> = tasks
            .keys()
            .filter(|(r, c, _)| r == room && c == connection_id)
            .cloned()
            .collect();
        for key in keys {
            if let Some(handle) = tasks.remove(&key) {
                handle.abort();
            }
        }
    }

    pub async fn pending(&self) -> usize {
        self.tasks.lock().await.len()
    }
}
