// src/live/events.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{quiz::PublicQuestion, user::UserSummary};

/// Events accepted from live clients.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    UserConnected { user_id: i64, room_code: String },
    #[serde(rename_all = "camelCase")]
    StartQuiz { room_code: String, total_question: u32 },
    #[serde(rename_all = "camelCase")]
    StartQuestion { room_code: String, question_id: i64 },
    #[serde(rename_all = "camelCase")]
    AnswerQuestion { room_code: String },
    #[serde(rename_all = "camelCase")]
    EndQuestion { room_code: String },
    #[serde(rename_all = "camelCase")]
    EndQuiz { room_code: String },
}

impl ClientEvent {
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn room_code(&self) -> &str {
        match self {
            Self::UserConnected { room_code, .. }
            | Self::StartQuiz { room_code, .. }
            | Self::StartQuestion { room_code, .. }
            | Self::AnswerQuestion { room_code }
            | Self::EndQuestion { room_code }
            | Self::EndQuiz { room_code } => room_code,
        }
    }
}

/// Events pushed to live clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Acknowledges `userConnected` to the connecting client.
    #[serde(rename_all = "camelCase")]
    Connected { room_id: i64, is_host: bool },
    /// Sent to the host when a player connects.
    NewUserConnected { user: UserSummary },
    #[serde(rename_all = "camelCase")]
    StartQuiz { total_question: u32 },
    StartQuestion { question: PublicQuestion },
    /// Sent to the host when a player answers.
    NewUserAnswer,
    EndQuestion,
    EndQuiz,
    /// Rejection of an inbound event, sent to its sender only.
    Error { message: String },
}
