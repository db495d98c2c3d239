//! Terminal client for the coordination server.

mod error;
mod formatter;
mod session;
mod tracker;

pub use session::run_client;
pub use tracker::{OwnFixOutcome, RoomTracker, TrackerNotice};
