// src/services/ledger.rs

//! Answer ledger: one scored answer per participant and question.

use crate::{
    error::AppError,
    models::answer::{Answer, AnswerFilter, NewAnswer},
    services::{rooms, scoring},
    store::{QuizRepository, RoomStore},
};

/// A player's answer to one question of a live room.
#[derive(Debug, Clone)]
pub struct AnswerSubmission<'a> {
    pub room_code: &'a str,
    pub user_id: i64,
    pub question_id: i64,
    pub option_id: i64,
    pub elapsed: f64,
}

/// Records a scored answer and credits the participant's totals.
///
/// Fails with `NotFound` for an unknown room, question or option, `Forbidden`
/// if the user never joined the room, and `Conflict` if the participant has
/// already answered this question.
pub async fn submit_answer(
    store: &dyn RoomStore,
    quizzes: &dyn QuizRepository,
    submission: AnswerSubmission<'_>,
) -> Result<Answer, AppError> {
    if !submission.elapsed.is_finite() || submission.elapsed < 0.0 {
        return Err(AppError::BadRequest(
            "elapsed time must be a non-negative number".to_string(),
        ));
    }

    let room = rooms::require_active_by_code(store, submission.room_code).await?;

    let participant = store
        .find_participant(room.id, submission.user_id)
        .await?
        .ok_or(AppError::Forbidden("user has not joined this room".to_string()))?;

    if store
        .find_answer(participant.id, submission.question_id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "user has already answered this question".to_string(),
        ));
    }

    // Only questions of the quiz this room is hosting can be answered.
    let question = quizzes
        .find_question(submission.question_id)
        .await?
        .filter(|q| q.question.quiz_id == room.quiz_id)
        .ok_or(AppError::NotFound("question not found".to_string()))?;
    let option = question
        .option(submission.option_id)
        .ok_or(AppError::NotFound("option not found".to_string()))?;

    let score = scoring::answer_score(submission.elapsed, question.question.timer, option.is_correct);

    // Insert and roster increment are one unit; a concurrent duplicate that
    // slipped past the lookup above is rejected here as Conflict.
    let answer = store
        .record_answer(NewAnswer {
            user_room_id: participant.id,
            question_id: question.question.id,
            option_id: option.id,
            answer_speed: submission.elapsed,
            score,
            is_correct: option.is_correct,
        })
        .await?;

    tracing::info!(
        room_id = room.id,
        participant_id = participant.id,
        question_id = answer.question_id,
        score,
        correct = option.is_correct,
        "answer recorded"
    );
    Ok(answer)
}

pub async fn list_answers(store: &dyn RoomStore, filter: &AnswerFilter) -> Result<Vec<Answer>, AppError> {
    store.list_answers(filter).await
}
