// src/services/roster.rs

//! Participant roster: joining rooms, listing and ranking participants.

use crate::{
    error::AppError,
    models::participant::{Page, PageMeta, PageQuery, Participant, ParticipantWithUser},
    services::{rooms, scoring},
    store::RoomStore,
};

/// Adds the user to the active room with this code.
pub async fn join_by_code(
    store: &dyn RoomStore,
    room_code: &str,
    user_id: i64,
) -> Result<Participant, AppError> {
    let room = rooms::require_active_by_code(store, room_code).await?;
    join(store, room.id, user_id).await
}

/// Adds the user to a room with zeroed totals. A user joins a room at most once.
pub async fn join(store: &dyn RoomStore, room_id: i64, user_id: i64) -> Result<Participant, AppError> {
    if store.find_participant(room_id, user_id).await?.is_some() {
        return Err(AppError::Conflict("user has joined this room".to_string()));
    }

    // The (room_id, user_id) constraint settles a concurrent double join.
    let participant = store.insert_participant(room_id, user_id).await?;
    tracing::info!(room_id, user_id, participant_id = participant.id, "user joined room");
    Ok(participant)
}

pub async fn get(
    store: &dyn RoomStore,
    room_id: i64,
    user_id: i64,
) -> Result<Option<Participant>, AppError> {
    store.find_participant(room_id, user_id).await
}

/// One page of a room's participants, ordered by rank ascending.
pub async fn list(
    store: &dyn RoomStore,
    room_id: i64,
    query: &PageQuery,
) -> Result<Page<ParticipantWithUser>, AppError> {
    let (data, total_count) = store
        .page_participants(room_id, query.skip(), query.take())
        .await?;

    Ok(Page {
        data,
        meta: PageMeta {
            page: query.page(),
            take: query.take(),
            total_count,
        },
    })
}

/// Re-ranks everyone in the room except `excluding_user` and persists the
/// ranks. Returns the ranked list, best first.
pub async fn recompute_ranks(
    store: &dyn RoomStore,
    room_id: i64,
    excluding_user: Option<i64>,
) -> Result<Vec<Participant>, AppError> {
    let participants = store.list_participants(room_id, excluding_user).await?;
    let ranked = scoring::rank_participants(participants);

    let updates: Vec<(i64, i64)> = ranked.iter().map(|p| (p.id, p.rank)).collect();
    store.update_ranks(&updates).await?;

    tracing::info!(room_id, ranked = ranked.len(), "room ranks recomputed");
    Ok(ranked)
}

/// Rank recompute as triggered by the room owner. The owner never competes.
pub async fn recompute_room_ranks(
    store: &dyn RoomStore,
    room_id: i64,
    caller_id: i64,
) -> Result<Vec<Participant>, AppError> {
    let room = rooms::require_active_by_id(store, room_id).await?;
    if room.created_by != caller_id {
        return Err(AppError::Forbidden(
            "only the room owner can update ranks".to_string(),
        ));
    }

    recompute_ranks(store, room.id, Some(room.created_by)).await
}
