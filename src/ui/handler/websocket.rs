//! WebSocket connection handler.
//!
//! One connection id per socket, minted at upgrade. The socket is split into
//! a send task (drains the per-connection channel) and a receive task
//! (parses client events and dispatches to the usecases); whichever ends
//! first aborts the other, and disconnect cleanup runs exactly once after
//! that. Malformed frames are logged and dropped, never fatal.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::domain::{ConnectionId, PusherChannel, RoomCode, UserId, Username};
use crate::infrastructure::dto::websocket::ClientEvent;

use super::super::state::AppState;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

pub async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionId::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let (mut sender, mut receiver) = socket.split();

    tracing::info!("Connection '{}' established", connection_id);

    // Drain the per-connection channel into the socket. Ends when the
    // channel is dropped (disconnect or supersession by a newer connection
    // of the same identity).
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        // Handed to the pusher on the first join
        let mut sender_slot = Some(tx);
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error on '{}': {}", connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let event = match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!(
                                "Dropping malformed frame from '{}': {}",
                                connection_id,
                                e
                            );
                            continue;
                        }
                    };
                    dispatch(&recv_state, connection_id, event, &mut sender_slot).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.leave_room_usecase.execute(connection_id).await;
    tracing::info!("Connection '{}' closed", connection_id);
}

async fn dispatch(
    state: &Arc<AppState>,
    connection_id: ConnectionId,
    event: ClientEvent,
    sender_slot: &mut Option<PusherChannel>,
) {
    match event {
        ClientEvent::JoinRoom {
            room_code,
            username,
            user_id,
        } => {
            let room = match RoomCode::new(room_code) {
                Ok(room) => room,
                Err(e) => {
                    tracing::warn!("Rejected join from '{}': {}", connection_id, e);
                    return;
                }
            };
            let user_id = match UserId::new(user_id) {
                Ok(user_id) => user_id,
                Err(e) => {
                    tracing::warn!("Rejected join from '{}': {}", connection_id, e);
                    return;
                }
            };
            let username = match Username::new(username) {
                Ok(username) => username,
                Err(e) => {
                    tracing::warn!("Rejected join from '{}': {}", connection_id, e);
                    return;
                }
            };
            state
                .join_room_usecase
                .execute(room, user_id, username, connection_id, sender_slot.take())
                .await;
        }
        ClientEvent::LocationUpdate { room_code, coords } => {
            let Ok(room) = RoomCode::new(room_code) else {
                return;
            };
            if let Err(e) = state
                .ingest_location_usecase
                .execute(room, connection_id, coords)
                .await
            {
                tracing::warn!("Rejected location update from '{}': {}", connection_id, e);
            }
        }
        ClientEvent::ChatMessage { room_code, message } => {
            let Ok(room) = RoomCode::new(room_code) else {
                return;
            };
            if let Err(e) = state
                .send_message_usecase
                .execute(room, connection_id, message)
                .await
            {
                tracing::warn!("Rejected message from '{}': {}", connection_id, e);
            }
        }
        ClientEvent::BatteryStatus {
            room_code,
            level,
            charging,
        } => {
            let Ok(room) = RoomCode::new(room_code) else {
                return;
            };
            if let Err(e) = state
                .update_battery_usecase
                .execute(room, connection_id, level, charging)
                .await
            {
                tracing::warn!("Rejected battery update from '{}': {}", connection_id, e);
            }
        }
        ClientEvent::LeaveRoom { room_code: _ } => {
            state
                .leave_room_usecase
                .execute_keep_connection(connection_id)
                .await;
        }
    }
}
