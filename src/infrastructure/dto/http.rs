//! DTOs for the read-only HTTP API.

use serde::Serialize;

/// One room in the `/api/rooms` listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub code: String,
    pub member_count: usize,
}

/// One member in the `/api/rooms/{code}` detail
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDetailDto {
    pub connection_id: String,
    pub username: String,
    pub stationary: bool,
    /// RFC 3339 timestamp of the latest location sample, if any
    pub last_seen: Option<String>,
    pub battery_level: Option<f64>,
    pub battery_charging: Option<bool>,
}

/// Full detail of one room
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    pub code: String,
    pub members: Vec<MemberDetailDto>,
}
