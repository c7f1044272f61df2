// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::{ALREADY_ANSWERED, ALREADY_JOINED, QuizRepository, ROOM_CODE_TAKEN, RoomStore};
use crate::{
    error::{AppError, conflict_on_unique},
    models::{
        answer::{Answer, AnswerFilter, NewAnswer},
        participant::{Participant, ParticipantWithUser},
        quiz::{Question, QuestionOption, QuestionWithOptions, Quiz},
        room::Room,
        user::UserSummary,
    },
};

const ROOM_COLUMNS: &str = "id, quiz_id, code, is_active, finished_at, created_at, created_by, \
     updated_at, updated_by, deleted_at, deleted_by";

const PARTICIPANT_COLUMNS: &str =
    "id, user_id, room_id, total_score, total_correct_answer, rank";

const ANSWER_COLUMNS: &str =
    "id, user_room_id, question_id, option_id, answer_speed, score, created_at";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row of the participant listing: user_rooms joined with users.
#[derive(FromRow)]
struct ParticipantRow {
    id: i64,
    user_id: i64,
    room_id: i64,
    total_score: i64,
    total_correct_answer: i64,
    rank: i64,
    has_user: bool,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    profile_picture: Option<String>,
}

impl From<ParticipantRow> for ParticipantWithUser {
    fn from(row: ParticipantRow) -> Self {
        let user = row.has_user.then(|| UserSummary {
            id: row.user_id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            profile_picture: row.profile_picture,
        });

        ParticipantWithUser {
            participant: Participant {
                id: row.id,
                user_id: row.user_id,
                room_id: row.room_id,
                total_score: row.total_score,
                total_correct_answer: row.total_correct_answer,
                rank: row.rank,
            },
            user,
        }
    }
}

#[async_trait]
impl QuizRepository for PgStore {
    async fn find_quiz(&self, quiz_id: i64) -> Result<Option<Quiz>, AppError> {
        let quiz = sqlx::query_as::<_, Quiz>(
            r#"
            SELECT id, title, created_by, deleted_at
            FROM quizzes
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quiz)
    }

    async fn find_question(
        &self,
        question_id: i64,
    ) -> Result<Option<QuestionWithOptions>, AppError> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, quiz_id, content, "order", timer, media_url
            FROM questions
            WHERE id = $1
            "#,
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(question) = question else {
            return Ok(None);
        };

        let options = sqlx::query_as::<_, QuestionOption>(
            r#"
            SELECT id, question_id, content, is_correct
            FROM options
            WHERE question_id = $1
            ORDER BY id
            "#,
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(QuestionWithOptions { question, options }))
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<UserSummary>, AppError> {
        let user = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT id, email, first_name, last_name, profile_picture
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl RoomStore for PgStore {
    async fn insert_room(
        &self,
        quiz_id: i64,
        code: &str,
        created_by: i64,
    ) -> Result<Room, AppError> {
        // rooms_active_code_key rejects a second usable room with this code.
        sqlx::query_as::<_, Room>(&format!(
            "INSERT INTO rooms (quiz_id, code, is_active, created_by) \
             VALUES ($1, $2, TRUE, $3) RETURNING {ROOM_COLUMNS}"
        ))
        .bind(quiz_id)
        .bind(code)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, ROOM_CODE_TAKEN))
    }

    async fn find_active_room_by_code(&self, code: &str) -> Result<Option<Room>, AppError> {
        let room = sqlx::query_as::<_, Room>(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms \
             WHERE code = $1 AND is_active AND deleted_at IS NULL"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(room)
    }

    async fn find_active_room_by_id(&self, room_id: i64) -> Result<Option<Room>, AppError> {
        let room = sqlx::query_as::<_, Room>(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms \
             WHERE id = $1 AND is_active AND deleted_at IS NULL"
        ))
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(room)
    }

    async fn deactivate_room(
        &self,
        room_id: i64,
        closed_by: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Room>, AppError> {
        let room = sqlx::query_as::<_, Room>(&format!(
            "UPDATE rooms \
             SET is_active = FALSE, finished_at = $2, updated_at = $2, updated_by = $3 \
             WHERE id = $1 AND is_active AND deleted_at IS NULL \
             RETURNING {ROOM_COLUMNS}"
        ))
        .bind(room_id)
        .bind(at)
        .bind(closed_by)
        .fetch_optional(&self.pool)
        .await?;

        Ok(room)
    }

    async fn insert_participant(
        &self,
        room_id: i64,
        user_id: i64,
    ) -> Result<Participant, AppError> {
        sqlx::query_as::<_, Participant>(&format!(
            "INSERT INTO user_rooms (user_id, room_id, total_score, total_correct_answer, rank) \
             VALUES ($1, $2, 0, 0, 0) RETURNING {PARTICIPANT_COLUMNS}"
        ))
        .bind(user_id)
        .bind(room_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, ALREADY_JOINED))
    }

    async fn find_participant(
        &self,
        room_id: i64,
        user_id: i64,
    ) -> Result<Option<Participant>, AppError> {
        let participant = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM user_rooms WHERE room_id = $1 AND user_id = $2"
        ))
        .bind(room_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(participant)
    }

    async fn list_participants(
        &self,
        room_id: i64,
        excluding_user: Option<i64>,
    ) -> Result<Vec<Participant>, AppError> {
        let participants = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM user_rooms \
             WHERE room_id = $1 AND ($2::BIGINT IS NULL OR user_id <> $2) \
             ORDER BY id"
        ))
        .bind(room_id)
        .bind(excluding_user)
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }

    async fn page_participants(
        &self,
        room_id: i64,
        skip: i64,
        take: i64,
    ) -> Result<(Vec<ParticipantWithUser>, i64), AppError> {
        let rows = sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT
                ur.id, ur.user_id, ur.room_id, ur.total_score,
                ur.total_correct_answer, ur.rank,
                (u.id IS NOT NULL) AS has_user,
                u.email, u.first_name, u.last_name, u.profile_picture
            FROM user_rooms ur
            LEFT JOIN users u ON u.id = ur.user_id
            WHERE ur.room_id = $1
            ORDER BY ur.rank ASC, ur.id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(room_id)
        .bind(take)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_rooms WHERE room_id = $1")
            .bind(room_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn update_ranks(&self, ranks: &[(i64, i64)]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        for (participant_id, rank) in ranks {
            sqlx::query("UPDATE user_rooms SET rank = $1 WHERE id = $2")
                .bind(rank)
                .bind(participant_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_answer(
        &self,
        user_room_id: i64,
        question_id: i64,
    ) -> Result<Option<Answer>, AppError> {
        let answer = sqlx::query_as::<_, Answer>(&format!(
            "SELECT {ANSWER_COLUMNS} FROM user_answers \
             WHERE user_room_id = $1 AND question_id = $2"
        ))
        .bind(user_room_id)
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(answer)
    }

    async fn record_answer(&self, answer: NewAnswer) -> Result<Answer, AppError> {
        let mut tx = self.pool.begin().await?;

        // user_answers_user_room_question_key is the authoritative exactly-once check.
        let saved = sqlx::query_as::<_, Answer>(&format!(
            "INSERT INTO user_answers (user_room_id, question_id, option_id, answer_speed, score) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {ANSWER_COLUMNS}"
        ))
        .bind(answer.user_room_id)
        .bind(answer.question_id)
        .bind(answer.option_id)
        .bind(answer.answer_speed)
        .bind(answer.score)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, ALREADY_ANSWERED))?;

        sqlx::query(
            r#"
            UPDATE user_rooms
            SET total_score = total_score + $1,
                total_correct_answer = total_correct_answer + $2
            WHERE id = $3
            "#,
        )
        .bind(answer.score)
        .bind(i64::from(answer.is_correct))
        .bind(answer.user_room_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(saved)
    }

    async fn list_answers(&self, filter: &AnswerFilter) -> Result<Vec<Answer>, AppError> {
        let mut query_builder = QueryBuilder::<Postgres>::new(
            "SELECT ua.id, ua.user_room_id, ua.question_id, ua.option_id, \
             ua.answer_speed, ua.score, ua.created_at \
             FROM user_answers ua \
             JOIN user_rooms ur ON ur.id = ua.user_room_id \
             JOIN rooms r ON r.id = ur.room_id \
             WHERE TRUE",
        );

        if let Some(code) = &filter.room_code {
            query_builder.push(" AND r.code = ").push_bind(code.clone());
        }
        if let Some(question_id) = filter.question_id {
            query_builder
                .push(" AND ua.question_id = ")
                .push_bind(question_id);
        }
        query_builder.push(" ORDER BY ua.id DESC");

        let answers = query_builder
            .build_query_as::<Answer>()
            .fetch_all(&self.pool)
            .await?;

        Ok(answers)
    }
}
