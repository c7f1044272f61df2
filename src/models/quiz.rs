// src/models/quiz.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Ownership view of the 'quizzes' table.
/// Quiz authoring is handled elsewhere; rooms only need to know who owns one.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: Option<String>,
    pub created_by: i64,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Represents the 'questions' table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub content: Option<String>,
    pub order: i64,

    /// Seconds players get to answer.
    pub timer: i64,

    pub media_url: Option<String>,
}

/// Represents the 'options' table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    pub id: i64,
    pub question_id: i64,
    pub content: Option<String>,
    pub is_correct: bool,
}

/// A question with all of its options, correctness included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QuestionWithOptions {
    #[serde(flatten)]
    pub question: Question,
    pub options: Vec<QuestionOption>,
}

impl QuestionWithOptions {
    pub fn option(&self, option_id: i64) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

/// Option as sent to players (excludes `is_correct`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicOption {
    pub id: i64,
    pub content: Option<String>,
}

/// Question as sent to players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: i64,
    pub quiz_id: i64,
    pub content: Option<String>,
    pub order: i64,
    pub timer: i64,
    pub media_url: Option<String>,
    pub options: Vec<PublicOption>,
}

impl From<&QuestionWithOptions> for PublicQuestion {
    fn from(q: &QuestionWithOptions) -> Self {
        Self {
            id: q.question.id,
            quiz_id: q.question.quiz_id,
            content: q.question.content.clone(),
            order: q.question.order,
            timer: q.question.timer,
            media_url: q.question.media_url.clone(),
            options: q
                .options
                .iter()
                .map(|o| PublicOption {
                    id: o.id,
                    content: o.content.clone(),
                })
                .collect(),
        }
    }
}
