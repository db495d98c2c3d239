//! Read-only HTTP API: health check and room inspection.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::common::time::{Clock as _, timestamp_to_rfc3339};
use crate::domain::{RoomCode, RoomStore as _};
use crate::infrastructure::dto::http::{MemberDetailDto, RoomDetailDto, RoomSummaryDto};

use super::super::state::AppState;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of live rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let now = state.clock.now_millis();
    let mut rooms = Vec::new();
    for code in state.store.room_codes().await {
        if let Some(snapshot) = state.store.room_snapshot(&code, now).await {
            rooms.push(RoomSummaryDto {
                code: snapshot.code.to_string(),
                member_count: snapshot.members.len(),
            });
        }
    }
    Json(rooms)
}

/// Get room detail by code
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_code): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    let code = RoomCode::new(room_code).map_err(|_| StatusCode::BAD_REQUEST)?;
    let now = state.clock.now_millis();
    let snapshot = state
        .store
        .room_snapshot(&code, now)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    let members = snapshot
        .members
        .iter()
        .map(|m| MemberDetailDto {
            connection_id: m.connection_id.to_string(),
            username: m.username.to_string(),
            stationary: m.stationary,
            last_seen: m.last_seen.map(timestamp_to_rfc3339),
            battery_level: m.battery.map(|b| b.level),
            battery_charging: m.battery.map(|b| b.charging),
        })
        .collect();

    Ok(Json(RoomDetailDto {
        code: snapshot.code.to_string(),
        members,
    }))
}
