// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Minimal display data for a user, read from the 'users' table.
/// Credentials and profile management belong to the auth service.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
}

impl UserSummary {
    /// Placeholder used when a user id has no profile row.
    pub fn anonymous(id: i64) -> Self {
        Self {
            id,
            email: None,
            first_name: None,
            last_name: None,
            profile_picture: None,
        }
    }
}
