// src/services/rooms.rs

//! Room directory: opening, resolving and ending rooms.

use chrono::Utc;
use rand::Rng;

use crate::{
    config::{MAX_CODE_ATTEMPTS, ROOM_CODE_ALPHABET, ROOM_CODE_LENGTH},
    error::AppError,
    models::room::Room,
    store::{QuizRepository, RoomStore},
};

/// Draws a random room code of `len` characters from `ROOM_CODE_ALPHABET`.
pub fn generate_room_code<R: Rng>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Opens an active room on a quiz the caller owns.
///
/// Codes are re-drawn until one is free among usable rooms. The insert itself
/// is the authoritative check: a code taken between lookup and insert comes
/// back as `Conflict` and is retried with a fresh code.
pub async fn create_room(
    store: &dyn RoomStore,
    quizzes: &dyn QuizRepository,
    quiz_id: i64,
    owner_id: i64,
) -> Result<Room, AppError> {
    let quiz = quizzes
        .find_quiz(quiz_id)
        .await?
        .ok_or(AppError::NotFound("quiz not found".to_string()))?;

    if quiz.created_by != owner_id {
        return Err(AppError::Forbidden(
            "only the quiz owner can open a room".to_string(),
        ));
    }

    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let code = generate_room_code(&mut rand::rng(), ROOM_CODE_LENGTH);

        if store.find_active_room_by_code(&code).await?.is_some() {
            tracing::debug!(attempt, "room code collision on lookup, redrawing");
            continue;
        }

        match store.insert_room(quiz_id, &code, owner_id).await {
            Ok(room) => {
                tracing::info!(room_id = room.id, quiz_id, code = %room.code, "room opened");
                return Ok(room);
            }
            Err(AppError::Conflict(_)) => {
                tracing::debug!(attempt, "room code collision on insert, redrawing");
            }
            Err(e) => return Err(e),
        }
    }

    tracing::error!(quiz_id, "exhausted room code attempts");
    Err(AppError::InternalServerError(
        "could not allocate a room code".to_string(),
    ))
}

/// Resolves a usable room by code, or `NotFound`.
pub async fn require_active_by_code(store: &dyn RoomStore, code: &str) -> Result<Room, AppError> {
    store
        .find_active_room_by_code(code)
        .await?
        .ok_or(AppError::NotFound("room not found".to_string()))
}

/// Resolves a usable room by id, or `NotFound`.
pub async fn require_active_by_id(store: &dyn RoomStore, room_id: i64) -> Result<Room, AppError> {
    store
        .find_active_room_by_id(room_id)
        .await?
        .ok_or(AppError::NotFound("room not found".to_string()))
}

/// Ends a usable room, freeing its code. Only the room owner may end it.
pub async fn end_room(store: &dyn RoomStore, room_id: i64, closed_by: i64) -> Result<Room, AppError> {
    let room = require_active_by_id(store, room_id).await?;
    if room.created_by != closed_by {
        return Err(AppError::Forbidden(
            "only the room owner can end the room".to_string(),
        ));
    }

    // A concurrent end between lookup and update also lands here as NotFound.
    let ended = store
        .deactivate_room(room_id, closed_by, Utc::now())
        .await?
        .ok_or(AppError::NotFound("room not found".to_string()))?;

    tracing::info!(room_id, code = %ended.code, "room ended");
    Ok(ended)
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_code_has_fixed_length_and_alphabet() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let code = generate_room_code(&mut rng, ROOM_CODE_LENGTH);
            assert_eq!(code.len(), ROOM_CODE_LENGTH);
            assert!(code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b)));
        }
    }

    #[tokio::test]
    async fn test_create_room_requires_existing_quiz() {
        let store = MemoryStore::new();
        let owner = store.add_user("Host").await;

        let err = create_room(&store, &store, 999, owner).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_room_requires_owner() {
        let store = MemoryStore::new();
        let owner = store.add_user("Host").await;
        let other = store.add_user("Other").await;
        let quiz = store.add_quiz("Capitals", owner).await;

        let err = create_room(&store, &store, quiz.id, other).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_active_rooms_never_share_codes() {
        let store = MemoryStore::new();
        let owner = store.add_user("Host").await;
        let quiz = store.add_quiz("Capitals", owner).await;

        let mut codes = std::collections::HashSet::new();
        for _ in 0..50 {
            let room = create_room(&store, &store, quiz.id, owner).await.unwrap();
            assert!(room.is_active);
            assert!(codes.insert(room.code));
        }
    }

    #[tokio::test]
    async fn test_end_room_twice_is_not_found() {
        let store = MemoryStore::new();
        let owner = store.add_user("Host").await;
        let quiz = store.add_quiz("Capitals", owner).await;
        let room = create_room(&store, &store, quiz.id, owner).await.unwrap();

        let ended = end_room(&store, room.id, owner).await.unwrap();
        assert!(!ended.is_active);
        assert!(ended.finished_at.is_some());
        assert_eq!(ended.updated_by, Some(owner));

        let again = end_room(&store, room.id, owner).await.unwrap_err();
        assert!(matches!(again, AppError::NotFound(_)));
        assert!(store.find_active_room_by_code(&room.code).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_end_room_by_stranger_is_forbidden() {
        let store = MemoryStore::new();
        let owner = store.add_user("Host").await;
        let player = store.add_user("Player").await;
        let quiz = store.add_quiz("Capitals", owner).await;
        let room = create_room(&store, &store, quiz.id, owner).await.unwrap();

        let err = end_room(&store, room.id, player).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(store.find_active_room_by_id(room.id).await.unwrap().is_some());
    }
}
