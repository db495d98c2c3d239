//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::common::time::Clock;
use crate::domain::RoomStore;
use crate::usecase::{
    IngestLocationUseCase, JoinRoomUseCase, LeaveRoomUseCase, SendMessageUseCase,
    UpdateBatteryUseCase,
};

use super::{
    handler::{get_room_detail, get_rooms, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// WebSocket coordination server
///
/// Encapsulates the wired usecases and runs the axum server: one WebSocket
/// endpoint carrying the event protocol, plus a small read-only HTTP API.
pub struct Server {
    join_room_usecase: Arc<JoinRoomUseCase>,
    leave_room_usecase: Arc<LeaveRoomUseCase>,
    ingest_location_usecase: Arc<IngestLocationUseCase>,
    send_message_usecase: Arc<SendMessageUseCase>,
    update_battery_usecase: Arc<UpdateBatteryUseCase>,
    store: Arc<dyn RoomStore>,
    clock: Arc<dyn Clock>,
}

impl Server {
    pub fn new(
        join_room_usecase: Arc<JoinRoomUseCase>,
        leave_room_usecase: Arc<LeaveRoomUseCase>,
        ingest_location_usecase: Arc<IngestLocationUseCase>,
        send_message_usecase: Arc<SendMessageUseCase>,
        update_battery_usecase: Arc<UpdateBatteryUseCase>,
        store: Arc<dyn RoomStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            join_room_usecase,
            leave_room_usecase,
            ingest_location_usecase,
            send_message_usecase,
            update_battery_usecase,
            store,
            clock,
        }
    }

    /// Run the server until a shutdown signal arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address
    /// or if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app_state = Arc::new(AppState {
            join_room_usecase: self.join_room_usecase,
            leave_room_usecase: self.leave_room_usecase,
            ingest_location_usecase: self.ingest_location_usecase,
            send_message_usecase: self.send_message_usecase,
            update_battery_usecase: self.update_battery_usecase,
            store: self.store,
            clock: self.clock,
        });

        let app = Router::new()
            // WebSocket endpoint
            .route("/ws", get(websocket_handler))
            // HTTP endpoints
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_code}", get(get_room_detail))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state);

        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!(
            "Coordination server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
