// src/live/socket.rs

use axum::{
    extract::{
        Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};
use utoipa::IntoParams;

use super::{
    coordinator,
    events::{ClientEvent, ServerEvent},
    hub::ConnectionHandle,
};
use crate::{error::AppError, state::AppState, utils::jwt::verify_jwt};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LiveQuery {
    /// Bearer token of the connecting user.
    pub token: String,
}

/// Upgrade an authenticated HTTP request into a live room connection.
#[utoipa::path(
    get,
    path = "/api/rooms/live",
    tag = "live",
    params(LiveQuery),
    responses(
        (status = 101, description = "Switching protocols to WebSocket"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn live_handler(
    State(state): State<AppState>,
    Query(query): Query<LiveQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let claims = verify_jwt(&query.token, &state.config.jwt_secret)?;
    let user_id = claims.user_id()?;

    Ok(ws.on_upgrade(move |socket| handle_socket(state, socket, user_id)))
}

/// Full lifecycle of one live connection.
pub async fn handle_socket(state: AppState, socket: WebSocket, user_id: i64) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ServerEvent>();

    // Dedicated writer task keeps outbound events flowing while inbound frames are awaited.
    let writer_task = tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            let payload = match serde_json::to_string(&event) {
                Ok(p) => p,
                Err(err) => {
                    warn!(error = %err, "failed to serialize live event");
                    continue;
                }
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    let connection = ConnectionHandle::new(outbound_tx);
    info!(connection = %connection.id, user_id, "live connection opened");

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let event = match ClientEvent::from_json_str(&text) {
                    Ok(event) => event,
                    Err(err) => {
                        warn!(connection = %connection.id, error = %err, "malformed live event");
                        connection.send(ServerEvent::Error {
                            message: format!("invalid event: {err}"),
                        });
                        continue;
                    }
                };

                let room_code = event.room_code().to_string();
                if let Err(err) = coordinator::handle_event(&state, &connection, user_id, event).await {
                    warn!(
                        connection = %connection.id,
                        room_code = %room_code,
                        error = %err.message(),
                        "live event dropped"
                    );
                    connection.send(ServerEvent::Error {
                        message: err.message().to_string(),
                    });
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Binary(_)) => {}
            Err(err) => {
                warn!(connection = %connection.id, error = %err, "websocket error");
                break;
            }
        }
    }

    coordinator::disconnect(&state, &connection);
    finalize(writer_task, connection).await;
}

/// Ensure the writer task winds down before the socket handler returns.
async fn finalize(writer_task: JoinHandle<()>, connection: ConnectionHandle) {
    drop(connection);
    let _ = writer_task.await;
}
