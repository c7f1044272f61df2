// src/store/mod.rs

//! Persistence seams for the room core.
//!
//! `QuizRepository` is the read side of quiz authoring (owned elsewhere).
//! `RoomStore` persists rooms, participants and the answer ledger. Both are
//! implemented by [`PgStore`] for production and [`MemoryStore`] for tests and
//! database-less runs; the two backends enforce the same uniqueness rules.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use self::memory::MemoryStore;
pub use self::postgres::PgStore;

use crate::{
    error::AppError,
    models::{
        answer::{Answer, AnswerFilter, NewAnswer},
        participant::{Participant, ParticipantWithUser},
        quiz::{QuestionWithOptions, Quiz},
        room::Room,
        user::UserSummary,
    },
};

pub const ROOM_CODE_TAKEN: &str = "room code already in use";
pub const ALREADY_JOINED: &str = "user has joined this room";
pub const ALREADY_ANSWERED: &str = "user has already answered this question";

#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Quiz that is not soft-deleted.
    async fn find_quiz(&self, quiz_id: i64) -> Result<Option<Quiz>, AppError>;

    /// Question with every option, `is_correct` included.
    async fn find_question(&self, question_id: i64)
    -> Result<Option<QuestionWithOptions>, AppError>;

    async fn find_user(&self, user_id: i64) -> Result<Option<UserSummary>, AppError>;
}

#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Inserts an active room. Fails with `Conflict` when another usable room
    /// already holds `code`.
    async fn insert_room(&self, quiz_id: i64, code: &str, created_by: i64)
    -> Result<Room, AppError>;

    async fn find_active_room_by_code(&self, code: &str) -> Result<Option<Room>, AppError>;

    async fn find_active_room_by_id(&self, room_id: i64) -> Result<Option<Room>, AppError>;

    /// Flips a usable room to inactive. Returns `None` when no usable room
    /// has this id.
    async fn deactivate_room(
        &self,
        room_id: i64,
        closed_by: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Room>, AppError>;

    /// Fails with `Conflict` when the user already joined the room.
    async fn insert_participant(&self, room_id: i64, user_id: i64)
    -> Result<Participant, AppError>;

    async fn find_participant(
        &self,
        room_id: i64,
        user_id: i64,
    ) -> Result<Option<Participant>, AppError>;

    /// All participants of a room in insertion (id) order.
    async fn list_participants(
        &self,
        room_id: i64,
        excluding_user: Option<i64>,
    ) -> Result<Vec<Participant>, AppError>;

    /// One page of participants ordered by rank ascending, with the total count.
    async fn page_participants(
        &self,
        room_id: i64,
        skip: i64,
        take: i64,
    ) -> Result<(Vec<ParticipantWithUser>, i64), AppError>;

    /// Persists `(participant id, rank)` pairs as one unit.
    async fn update_ranks(&self, ranks: &[(i64, i64)]) -> Result<(), AppError>;

    async fn find_answer(
        &self,
        user_room_id: i64,
        question_id: i64,
    ) -> Result<Option<Answer>, AppError>;

    /// Writes the answer and increments the participant's totals in one
    /// atomic step. Fails with `Conflict` when the participant already
    /// answered the question.
    async fn record_answer(&self, answer: NewAnswer) -> Result<Answer, AppError>;

    /// Answers newest first.
    async fn list_answers(&self, filter: &AnswerFilter) -> Result<Vec<Answer>, AppError>;
}
