//! Real-time group location coordination library.
//!
//! This library provides the server and client implementations for a
//! WebSocket-based group location room: members join a room, stream position
//! samples, and receive location, chat, and anomaly broadcasts.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// client-side session and anomaly evaluation
pub mod client;

// shared library
pub mod common;
