// src/models/answer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Represents the 'user_answers' table. Rows are written once and never
/// updated: one answer per (participant, question).
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: i64,

    /// The participant (user_rooms row) who answered.
    pub user_room_id: i64,
    pub question_id: i64,
    pub option_id: i64,

    /// Seconds elapsed between the question opening and the answer.
    pub answer_speed: f64,

    pub score: i64,
    pub created_at: DateTime<Utc>,
}

/// Answer about to be written to the ledger.
#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub user_room_id: i64,
    pub question_id: i64,
    pub option_id: i64,
    pub answer_speed: f64,
    pub score: i64,
    pub is_correct: bool,
}

/// DTO for submitting an answer during a live room.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    #[validate(length(min = 1, max = 255))]
    pub room_code: String,
    pub question_id: i64,
    pub option_id: i64,

    /// Elapsed time in seconds.
    #[validate(range(min = 0.0))]
    pub timer: f64,
}

/// Filter for listing recorded answers.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFilter {
    pub room_code: Option<String>,
    pub question_id: Option<i64>,
}
