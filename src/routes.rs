// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, patch, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{docs, health, rooms},
    live::socket::live_handler,
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Room routes sit behind the bearer-token middleware.
/// * The live socket authenticates through its `token` query parameter instead.
/// * Applies global middleware (Trace, CORS) and injects the shared state.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let room_routes = Router::new()
        .route("/", post(rooms::create_room))
        .route("/join-room", post(rooms::join_room))
        .route("/answer-question", post(rooms::answer_question))
        .route("/get-users/{room_id}", get(rooms::get_users))
        .route("/update-user-rank/{id}", patch(rooms::update_user_rank))
        .route("/end-room/{id}", patch(rooms::end_room))
        .route("/user-answers", get(rooms::get_user_answers))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        // Added after the layer so the upgrade is not wrapped by it.
        .route("/live", get(live_handler));

    Router::new()
        .nest("/api/rooms", room_routes)
        .route("/api/health", get(health::health))
        .route("/api/openapi.json", get(docs::openapi_json))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::{Request, StatusCode}};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::{Config, StoreBackend},
        store::MemoryStore,
        utils::jwt::sign_jwt,
    };

    fn app() -> Router {
        let config = Config {
            database_url: None,
            jwt_secret: "router".to_string(),
            rust_log: "error".to_string(),
            port: 0,
            store_backend: StoreBackend::Memory,
        };
        create_router(AppState::in_memory(Arc::new(MemoryStore::new()), config))
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_room_routes_need_bearer_token() {
        let response = app()
            .oneshot(Request::get("/api/rooms/get-users/1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let token = sign_jwt(1, "router", 60).unwrap();
        let response = app()
            .oneshot(
                Request::get("/api/rooms/get-users/1")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_live_socket_skips_bearer_middleware() {
        let response = app()
            .oneshot(Request::get("/api/rooms/live?token=bogus").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_ne!(response.status(), StatusCode::OK);
        assert_ne!(response.status(), StatusCode::NOT_FOUND);
    }
}
