// src/handlers/rooms.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        answer::{AnswerFilter, SubmitAnswerRequest},
        participant::PageQuery,
        room::{CreateRoomRequest, JoinRoomRequest},
    },
    services::{
        ledger::{self, AnswerSubmission},
        rooms, roster,
    },
    state::AppState,
    utils::jwt::Claims,
};

/// Opens a live room on a quiz owned by the caller.
#[utoipa::path(
    post,
    path = "/api/rooms",
    tag = "rooms",
    request_body = CreateRoomRequest,
    responses(
        (status = 201, description = "Room created", body = crate::models::room::Room),
        (status = 403, description = "Caller does not own the quiz"),
        (status = 404, description = "Quiz not found")
    ),
    security(("bearer" = []))
)]
pub async fn create_room(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let owner_id = claims.user_id()?;

    let room = rooms::create_room(
        state.store.as_ref(),
        state.quizzes.as_ref(),
        payload.quiz_id,
        owner_id,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "create successfully", "data": room })),
    ))
}

/// Joins the caller to the active room with the given code.
#[utoipa::path(
    post,
    path = "/api/rooms/join-room",
    tag = "rooms",
    request_body = JoinRoomRequest,
    responses(
        (status = 201, description = "Joined", body = crate::models::participant::Participant),
        (status = 404, description = "Room not found"),
        (status = 409, description = "Already joined")
    ),
    security(("bearer" = []))
)]
pub async fn join_room(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<JoinRoomRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let participant = roster::join_by_code(state.store.as_ref(), &payload.room_code, user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "join successfully", "data": participant })),
    ))
}

/// Records the caller's answer to a question.
#[utoipa::path(
    post,
    path = "/api/rooms/answer-question",
    tag = "rooms",
    request_body = SubmitAnswerRequest,
    responses(
        (status = 201, description = "Answer recorded", body = crate::models::answer::Answer),
        (status = 403, description = "Caller has not joined the room"),
        (status = 404, description = "Room, question or option not found"),
        (status = 409, description = "Question already answered")
    ),
    security(("bearer" = []))
)]
pub async fn answer_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let answer = ledger::submit_answer(
        state.store.as_ref(),
        state.quizzes.as_ref(),
        AnswerSubmission {
            room_code: &payload.room_code,
            user_id,
            question_id: payload.question_id,
            option_id: payload.option_id,
            elapsed: payload.timer,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "answer successfully", "data": answer })),
    ))
}

/// Lists a room's participants by rank.
#[utoipa::path(
    get,
    path = "/api/rooms/get-users/{room_id}",
    tag = "rooms",
    params(("room_id" = i64, Path, description = "Room id"), PageQuery),
    responses((status = 200, description = "Paginated participants")),
    security(("bearer" = []))
)]
pub async fn get_users(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;

    let page = roster::list(state.store.as_ref(), room_id, &query).await?;

    Ok(Json(json!({ "message": "get successfully", "data": page })))
}

/// Recomputes ranks for a room. Room owner only.
#[utoipa::path(
    patch,
    path = "/api/rooms/update-user-rank/{id}",
    tag = "rooms",
    params(("id" = i64, Path, description = "Room id")),
    responses(
        (status = 200, description = "Ranked participants, best first"),
        (status = 403, description = "Caller does not own the room"),
        (status = 404, description = "Room not found")
    ),
    security(("bearer" = []))
)]
pub async fn update_user_rank(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(room_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let caller_id = claims.user_id()?;

    let ranked = roster::recompute_room_ranks(state.store.as_ref(), room_id, caller_id).await?;

    Ok(Json(json!({ "message": "update successfully", "data": ranked })))
}

/// Ends a room. Room owner only.
#[utoipa::path(
    patch,
    path = "/api/rooms/end-room/{id}",
    tag = "rooms",
    params(("id" = i64, Path, description = "Room id")),
    responses(
        (status = 200, description = "Room ended", body = crate::models::room::Room),
        (status = 403, description = "Caller does not own the room"),
        (status = 404, description = "No active room with this id")
    ),
    security(("bearer" = []))
)]
pub async fn end_room(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(room_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let closed_by = claims.user_id()?;

    let room = rooms::end_room(state.store.as_ref(), room_id, closed_by).await?;
    state.sessions.close_room(room.id);

    Ok(Json(json!({ "message": "update successfully", "data": room })))
}

/// Lists recorded answers, newest first.
#[utoipa::path(
    get,
    path = "/api/rooms/user-answers",
    tag = "rooms",
    params(AnswerFilter),
    responses((status = 200, description = "Answers", body = [crate::models::answer::Answer])),
    security(("bearer" = []))
)]
pub async fn get_user_answers(
    State(state): State<AppState>,
    Query(filter): Query<AnswerFilter>,
) -> Result<impl IntoResponse, AppError> {
    let answers = ledger::list_answers(state.store.as_ref(), &filter).await?;

    Ok(Json(json!({ "message": "get successfully", "data": answers })))
}
