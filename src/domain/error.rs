//! Domain error types.

use thiserror::Error;

/// Validation failure when constructing a value object
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{0} must not contain whitespace")]
    Whitespace(&'static str),
}

/// Errors returned by the room store
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),
    #[error("no member for connection '{0}'")]
    MemberNotFound(String),
}

/// Errors returned by the message pusher
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),
    #[error("failed to push message: {0}")]
    PushFailed(String),
}
