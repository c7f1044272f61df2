// src/store/memory.rs

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{ALREADY_ANSWERED, ALREADY_JOINED, QuizRepository, ROOM_CODE_TAKEN, RoomStore};
use crate::{
    error::AppError,
    models::{
        answer::{Answer, AnswerFilter, NewAnswer},
        participant::{Participant, ParticipantWithUser},
        quiz::{Question, QuestionOption, QuestionWithOptions, Quiz},
        room::Room,
        user::UserSummary,
    },
};

/// In-process store with the same constraints as the Postgres schema.
///
/// Every operation runs under a single mutex, so check-then-write sequences
/// inside one method are atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: HashMap<i64, UserSummary>,
    quizzes: HashMap<i64, Quiz>,
    questions: HashMap<i64, QuestionWithOptions>,
    rooms: BTreeMap<i64, Room>,
    participants: BTreeMap<i64, Participant>,
    answers: BTreeMap<i64, Answer>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers display data for a user and returns its id.
    pub async fn add_user(&self, first_name: &str) -> i64 {
        let mut t = self.inner.lock().await;
        let id = t.next_id();
        t.users.insert(
            id,
            UserSummary {
                id,
                email: Some(format!("{}@example.com", first_name.to_lowercase())),
                first_name: Some(first_name.to_string()),
                last_name: None,
                profile_picture: None,
            },
        );
        id
    }

    pub async fn add_quiz(&self, title: &str, owner_id: i64) -> Quiz {
        let mut t = self.inner.lock().await;
        let quiz = Quiz {
            id: t.next_id(),
            title: Some(title.to_string()),
            created_by: owner_id,
            deleted_at: None,
        };
        t.quizzes.insert(quiz.id, quiz.clone());
        quiz
    }

    /// Adds a question with `(content, is_correct)` options.
    pub async fn add_question(
        &self,
        quiz_id: i64,
        content: &str,
        timer: i64,
        options: &[(&str, bool)],
    ) -> QuestionWithOptions {
        let mut t = self.inner.lock().await;
        let question_id = t.next_id();
        let order = t
            .questions
            .values()
            .filter(|q| q.question.quiz_id == quiz_id)
            .count() as i64;

        let options = options
            .iter()
            .map(|(text, is_correct)| QuestionOption {
                id: t.next_id(),
                question_id,
                content: Some(text.to_string()),
                is_correct: *is_correct,
            })
            .collect();

        let question = QuestionWithOptions {
            question: Question {
                id: question_id,
                quiz_id,
                content: Some(content.to_string()),
                order,
                timer,
                media_url: None,
            },
            options,
        };
        t.questions.insert(question_id, question.clone());
        question
    }

    /// Stamps `deleted_at` on a room, as the soft-delete collaborator would.
    pub async fn soft_delete_room(&self, room_id: i64, deleted_by: i64) {
        let mut t = self.inner.lock().await;
        if let Some(room) = t.rooms.get_mut(&room_id) {
            room.deleted_at = Some(Utc::now());
            room.deleted_by = Some(deleted_by);
        }
    }
}

#[async_trait]
impl QuizRepository for MemoryStore {
    async fn find_quiz(&self, quiz_id: i64) -> Result<Option<Quiz>, AppError> {
        let t = self.inner.lock().await;
        Ok(t.quizzes
            .get(&quiz_id)
            .filter(|q| q.deleted_at.is_none())
            .cloned())
    }

    async fn find_question(
        &self,
        question_id: i64,
    ) -> Result<Option<QuestionWithOptions>, AppError> {
        let t = self.inner.lock().await;
        Ok(t.questions.get(&question_id).cloned())
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<UserSummary>, AppError> {
        let t = self.inner.lock().await;
        Ok(t.users.get(&user_id).cloned())
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn insert_room(
        &self,
        quiz_id: i64,
        code: &str,
        created_by: i64,
    ) -> Result<Room, AppError> {
        let mut t = self.inner.lock().await;
        if t.rooms.values().any(|r| r.code == code && r.is_usable()) {
            return Err(AppError::Conflict(ROOM_CODE_TAKEN.to_string()));
        }

        let room = Room {
            id: t.next_id(),
            quiz_id,
            code: code.to_string(),
            is_active: true,
            finished_at: None,
            created_at: Utc::now(),
            created_by,
            updated_at: None,
            updated_by: None,
            deleted_at: None,
            deleted_by: None,
        };
        t.rooms.insert(room.id, room.clone());
        Ok(room)
    }

    async fn find_active_room_by_code(&self, code: &str) -> Result<Option<Room>, AppError> {
        let t = self.inner.lock().await;
        Ok(t.rooms
            .values()
            .find(|r| r.code == code && r.is_usable())
            .cloned())
    }

    async fn find_active_room_by_id(&self, room_id: i64) -> Result<Option<Room>, AppError> {
        let t = self.inner.lock().await;
        Ok(t.rooms.get(&room_id).filter(|r| r.is_usable()).cloned())
    }

    async fn deactivate_room(
        &self,
        room_id: i64,
        closed_by: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Room>, AppError> {
        let mut t = self.inner.lock().await;
        let Some(room) = t.rooms.get_mut(&room_id).filter(|r| r.is_usable()) else {
            return Ok(None);
        };

        room.is_active = false;
        room.finished_at = Some(at);
        room.updated_at = Some(at);
        room.updated_by = Some(closed_by);
        Ok(Some(room.clone()))
    }

    async fn insert_participant(
        &self,
        room_id: i64,
        user_id: i64,
    ) -> Result<Participant, AppError> {
        let mut t = self.inner.lock().await;
        if t.participants
            .values()
            .any(|p| p.room_id == room_id && p.user_id == user_id)
        {
            return Err(AppError::Conflict(ALREADY_JOINED.to_string()));
        }

        let participant = Participant {
            id: t.next_id(),
            user_id,
            room_id,
            total_score: 0,
            total_correct_answer: 0,
            rank: 0,
        };
        t.participants.insert(participant.id, participant.clone());
        Ok(participant)
    }

    async fn find_participant(
        &self,
        room_id: i64,
        user_id: i64,
    ) -> Result<Option<Participant>, AppError> {
        let t = self.inner.lock().await;
        Ok(t.participants
            .values()
            .find(|p| p.room_id == room_id && p.user_id == user_id)
            .cloned())
    }

    async fn list_participants(
        &self,
        room_id: i64,
        excluding_user: Option<i64>,
    ) -> Result<Vec<Participant>, AppError> {
        let t = self.inner.lock().await;
        Ok(t.participants
            .values()
            .filter(|p| p.room_id == room_id && Some(p.user_id) != excluding_user)
            .cloned()
            .collect())
    }

    async fn page_participants(
        &self,
        room_id: i64,
        skip: i64,
        take: i64,
    ) -> Result<(Vec<ParticipantWithUser>, i64), AppError> {
        let t = self.inner.lock().await;
        let mut members: Vec<&Participant> = t
            .participants
            .values()
            .filter(|p| p.room_id == room_id)
            .collect();
        // BTreeMap iteration is already id order, so a stable sort keeps id as tie-break.
        members.sort_by_key(|p| p.rank);

        let total = members.len() as i64;
        let page = members
            .into_iter()
            .skip(skip.max(0) as usize)
            .take(take.max(0) as usize)
            .map(|p| ParticipantWithUser {
                participant: p.clone(),
                user: t.users.get(&p.user_id).cloned(),
            })
            .collect();

        Ok((page, total))
    }

    async fn update_ranks(&self, ranks: &[(i64, i64)]) -> Result<(), AppError> {
        let mut t = self.inner.lock().await;
        for (participant_id, rank) in ranks {
            if let Some(p) = t.participants.get_mut(participant_id) {
                p.rank = *rank;
            }
        }
        Ok(())
    }

    async fn find_answer(
        &self,
        user_room_id: i64,
        question_id: i64,
    ) -> Result<Option<Answer>, AppError> {
        let t = self.inner.lock().await;
        Ok(t.answers
            .values()
            .find(|a| a.user_room_id == user_room_id && a.question_id == question_id)
            .cloned())
    }

    async fn record_answer(&self, answer: NewAnswer) -> Result<Answer, AppError> {
        let mut t = self.inner.lock().await;
        if t.answers
            .values()
            .any(|a| a.user_room_id == answer.user_room_id && a.question_id == answer.question_id)
        {
            return Err(AppError::Conflict(ALREADY_ANSWERED.to_string()));
        }
        if !t.participants.contains_key(&answer.user_room_id) {
            return Err(AppError::InternalServerError(format!(
                "participant {} does not exist",
                answer.user_room_id
            )));
        }

        let saved = Answer {
            id: t.next_id(),
            user_room_id: answer.user_room_id,
            question_id: answer.question_id,
            option_id: answer.option_id,
            answer_speed: answer.answer_speed,
            score: answer.score,
            created_at: Utc::now(),
        };
        t.answers.insert(saved.id, saved.clone());

        if let Some(p) = t.participants.get_mut(&answer.user_room_id) {
            p.total_score += answer.score;
            if answer.is_correct {
                p.total_correct_answer += 1;
            }
        }

        Ok(saved)
    }

    async fn list_answers(&self, filter: &AnswerFilter) -> Result<Vec<Answer>, AppError> {
        let t = self.inner.lock().await;
        let answers = t
            .answers
            .values()
            .rev()
            .filter(|a| filter.question_id.is_none_or(|q| a.question_id == q))
            .filter(|a| match &filter.room_code {
                None => true,
                Some(code) => t
                    .participants
                    .get(&a.user_room_id)
                    .and_then(|p| t.rooms.get(&p.room_id))
                    .is_some_and(|r| &r.code == code),
            })
            .cloned()
            .collect();

        Ok(answers)
    }
}
