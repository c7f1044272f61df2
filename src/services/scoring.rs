// src/services/scoring.rs

use crate::{config::MAX_QUESTION_SCORE, models::participant::Participant};

/// Points for one answer.
///
/// Correct answers earn `MAX_QUESTION_SCORE` scaled linearly by the share of
/// the question's time budget left unused; wrong answers earn nothing.
/// Answers at or past the budget score 0.
pub fn answer_score(elapsed: f64, time_budget: i64, is_correct: bool) -> i64 {
    if !is_correct || time_budget <= 0 || !elapsed.is_finite() {
        return 0;
    }

    let budget = time_budget as f64;
    let remaining = (budget - elapsed.max(0.0)).max(0.0);

    (MAX_QUESTION_SCORE as f64 / budget * remaining).round() as i64
}

/// Orders participants by total score, highest first, and assigns 1-based ranks.
///
/// The sort is stable: equal scores keep their input order.
pub fn rank_participants(mut participants: Vec<Participant>) -> Vec<Participant> {
    participants.sort_by(|a, b| b.total_score.cmp(&a.total_score));

    for (index, participant) in participants.iter_mut().enumerate() {
        participant.rank = index as i64 + 1;
    }

    participants
}
