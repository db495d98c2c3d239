//! Wire DTOs for the realtime channel and the read-only HTTP API.

pub mod http;
pub mod websocket;
