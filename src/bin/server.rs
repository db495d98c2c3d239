//! Real-time group coordination server.
//!
//! Receives location samples, chat, SOS, and battery readings from room
//! members over WebSocket and fans them out to the rest of the room, with a
//! server-side deviation check against the group center.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin server
//! cargo run --bin server -- --host 0.0.0.0 --port 3000
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;

use convoy_rs::{
    common::{logger::setup_logger, time::SystemClock},
    domain::CoreConfig,
    infrastructure::{
        message_pusher::WebSocketMessagePusher, registry::ConnectionRegistry,
        repository::InMemoryRoomStore,
    },
    ui::Server,
    usecase::{
        AlertTimers, IngestLocationUseCase, JoinRoomUseCase, LeaveRoomUseCase,
        SendMessageUseCase, UpdateBatteryUseCase, spawn_prune_sweep,
    },
};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Real-time group location coordination server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Deviation distance from the group center that raises an alert (meters)
    #[arg(long)]
    deviation_threshold: Option<f64>,

    /// Standing-still duration that raises a stationary alert (seconds)
    #[arg(long)]
    stationary_limit: Option<u64>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    let mut config = CoreConfig::default();
    if let Some(threshold) = args.deviation_threshold {
        config.server_deviation_threshold_m = threshold;
    }
    if let Some(limit) = args.stationary_limit {
        config.stationary_limit_ms = (limit * 1_000) as i64;
    }

    // Initialize dependencies in order:
    // 1. Store, registry, pusher, clock
    // 2. Alert timers
    // 3. UseCases
    // 4. Background sweep
    // 5. Server

    let store = Arc::new(InMemoryRoomStore::new(
        config.trail_window_ms,
        config.trail_max_points,
    ));
    let registry = Arc::new(ConnectionRegistry::new());
    let pusher = Arc::new(WebSocketMessagePusher::new());
    let clock = Arc::new(SystemClock);
    let timers = Arc::new(AlertTimers::new(store.clone()));

    let join_room_usecase = Arc::new(JoinRoomUseCase::new(
        registry.clone(),
        store.clone(),
        pusher.clone(),
        clock.clone(),
    ));
    let leave_room_usecase = Arc::new(LeaveRoomUseCase::new(
        registry.clone(),
        store.clone(),
        pusher.clone(),
        timers.clone(),
    ));
    let ingest_location_usecase = Arc::new(IngestLocationUseCase::new(
        store.clone(),
        pusher.clone(),
        clock.clone(),
        config,
    ));
    let send_message_usecase = Arc::new(SendMessageUseCase::new(
        store.clone(),
        pusher.clone(),
        timers.clone(),
        clock.clone(),
        config,
    ));
    let update_battery_usecase = Arc::new(UpdateBatteryUseCase::new(
        store.clone(),
        pusher.clone(),
        clock.clone(),
    ));

    // Periodic trail pruning for idle members
    let _sweep = spawn_prune_sweep(
        store.clone(),
        clock.clone(),
        Duration::from_millis(config.prune_interval_ms),
    );

    let server = Server::new(
        join_room_usecase,
        leave_room_usecase,
        ingest_location_usecase,
        send_message_usecase,
        update_battery_usecase,
        store,
        clock,
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
