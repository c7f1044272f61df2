// src/handlers/docs.rs

use axum::{Json, response::IntoResponse};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health,
        crate::handlers::rooms::create_room,
        crate::handlers::rooms::join_room,
        crate::handlers::rooms::answer_question,
        crate::handlers::rooms::get_users,
        crate::handlers::rooms::update_user_rank,
        crate::handlers::rooms::end_room,
        crate::handlers::rooms::get_user_answers,
        crate::live::socket::live_handler,
    ),
    components(schemas(
        crate::models::room::Room,
        crate::models::room::CreateRoomRequest,
        crate::models::room::JoinRoomRequest,
        crate::models::participant::Participant,
        crate::models::answer::Answer,
        crate::models::answer::SubmitAnswerRequest,
        crate::live::events::ClientEvent,
        crate::live::events::ServerEvent,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "rooms", description = "Room lifecycle, roster and answers"),
        (name = "live", description = "WebSocket quiz flow"),
        (name = "health", description = "Health check"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Serves the generated OpenAPI document.
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
