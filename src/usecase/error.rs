//! Usecase error types.
//!
//! All of these end as a `tracing::warn!` line in the handler: the protocol
//! is fire-and-forget, so nothing is surfaced to the sending client and
//! nothing reaches other members.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("coordinates are not finite numbers")]
    InvalidCoordinates,
    #[error("unknown room '{0}'")]
    UnknownRoom(String),
    #[error("connection '{0}' is not a member of the room")]
    UnknownMember(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("sender '{0}' is not a member of room '{1}'")]
    NotAMember(String, String),
}

#[derive(Debug, Error, PartialEq)]
pub enum BatteryError {
    #[error("battery level {0} is outside [0, 1]")]
    InvalidLevel(f64),
    #[error("connection '{0}' is not a member of room '{1}'")]
    NotAMember(String, String),
}
