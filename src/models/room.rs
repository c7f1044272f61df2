// src/models/room.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Represents the 'rooms' table: one live hosting of a quiz.
///
/// A room is usable while `is_active` is true and `deleted_at` is unset.
/// The two are independent: ending a room clears `is_active`, soft deletion
/// stamps `deleted_at`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: i64,
    pub quiz_id: i64,

    /// Short code players type to join.
    pub code: String,

    pub is_active: bool,

    /// Set when the owner ends the room.
    pub finished_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub created_by: i64,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<i64>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<i64>,
}

impl Room {
    /// Same predicate as the `rooms_active_code_key` partial index; the
    /// in-memory store filters on it.
    pub fn is_usable(&self) -> bool {
        self.is_active && self.deleted_at.is_none()
    }
}

/// DTO for opening a room on a quiz.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    #[validate(range(min = 1))]
    pub quiz_id: i64,
}

/// DTO for joining a room by its code.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    #[validate(length(min = 1, max = 255, message = "Room code must not be empty."))]
    pub room_code: String,
}
