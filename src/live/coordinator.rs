// src/live/coordinator.rs

use tracing::info;

use super::{
    events::{ClientEvent, ServerEvent},
    hub::{ConnectionHandle, Registration},
};
use crate::{
    error::AppError,
    models::{quiz::PublicQuestion, room::Room, user::UserSummary},
    services::rooms,
    state::AppState,
};

/// Applies one inbound event from `connection`, authenticated as `user_id`.
///
/// Errors are meant for the sender only; they never touch other connections.
pub async fn handle_event(
    state: &AppState,
    connection: &ConnectionHandle,
    user_id: i64,
    event: ClientEvent,
) -> Result<(), AppError> {
    match event {
        ClientEvent::UserConnected {
            user_id: claimed,
            room_code,
        } => {
            if claimed != user_id {
                return Err(AppError::Forbidden(
                    "userId does not match the authenticated user".to_string(),
                ));
            }
            connect(state, connection, user_id, &room_code).await
        }
        ClientEvent::StartQuiz {
            room_code,
            total_question,
        } => {
            let room = active_room(state, &room_code).await?;
            broadcast(state, &room, connection, ServerEvent::StartQuiz { total_question });
            Ok(())
        }
        ClientEvent::StartQuestion {
            room_code,
            question_id,
        } => {
            let room = active_room(state, &room_code).await?;
            let question = state
                .quizzes
                .find_question(question_id)
                .await?
                .filter(|q| q.question.quiz_id == room.quiz_id)
                .ok_or(AppError::NotFound("question not found".to_string()))?;

            // Players must not learn which option is correct.
            let question = PublicQuestion::from(&question);
            broadcast(state, &room, connection, ServerEvent::StartQuestion { question });
            Ok(())
        }
        ClientEvent::AnswerQuestion { room_code } => {
            let room = active_room(state, &room_code).await?;
            if let Some(host) = state.sessions.host_of(room.id) {
                host.send(ServerEvent::NewUserAnswer);
            }
            Ok(())
        }
        ClientEvent::EndQuestion { room_code } => {
            let room = active_room(state, &room_code).await?;
            broadcast(state, &room, connection, ServerEvent::EndQuestion);
            Ok(())
        }
        ClientEvent::EndQuiz { room_code } => {
            let room = active_room(state, &room_code).await?;
            broadcast(state, &room, connection, ServerEvent::EndQuiz);
            Ok(())
        }
    }
}

/// Registers the connection in the room and tells the host about new players.
async fn connect(
    state: &AppState,
    connection: &ConnectionHandle,
    user_id: i64,
    room_code: &str,
) -> Result<(), AppError> {
    let room = active_room(state, room_code).await?;
    let is_host = room.created_by == user_id;

    let user = if is_host {
        None
    } else {
        Some(
            state
                .quizzes
                .find_user(user_id)
                .await?
                .unwrap_or_else(|| UserSummary::anonymous(user_id)),
        )
    };

    // No await between here and the registration: host lookup and append
    // happen as one step inside the hub.
    let registration = state
        .sessions
        .register(connection, user_id, room.id, is_host);

    connection.send(ServerEvent::Connected {
        room_id: room.id,
        is_host,
    });

    if let (Registration::Player { host: Some(host) }, Some(user)) = (registration, user) {
        host.send(ServerEvent::NewUserConnected { user });
    }

    info!(room_id = room.id, user_id, is_host, connection = %connection.id, "user connected");
    Ok(())
}

/// Forgets the connection in every room it joined.
pub fn disconnect(state: &AppState, connection: &ConnectionHandle) {
    state.sessions.remove_connection(connection.id);
    info!(connection = %connection.id, "connection removed from live rooms");
}

async fn active_room(state: &AppState, room_code: &str) -> Result<Room, AppError> {
    rooms::require_active_by_code(state.store.as_ref(), room_code).await
}

fn broadcast(state: &AppState, room: &Room, sender: &ConnectionHandle, event: ServerEvent) {
    let delivered = state.sessions.broadcast(room.id, sender.id, &event);
    info!(room_id = room.id, delivered, event = event_name(&event), "broadcast");
}

fn event_name(event: &ServerEvent) -> &'static str {
    match event {
        ServerEvent::Connected { .. } => "connected",
        ServerEvent::NewUserConnected { .. } => "newUserConnected",
        ServerEvent::StartQuiz { .. } => "startQuiz",
        ServerEvent::StartQuestion { .. } => "startQuestion",
        ServerEvent::NewUserAnswer => "newUserAnswer",
        ServerEvent::EndQuestion => "endQuestion",
        ServerEvent::EndQuiz => "endQuiz",
        ServerEvent::Error { .. } => "error",
    }
}
