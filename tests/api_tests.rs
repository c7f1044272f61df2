// tests/api_tests.rs

use std::sync::Arc;

use quiz_room_server::{
    config::{Config, StoreBackend},
    routes,
    state::AppState,
    store::MemoryStore,
    utils::jwt::sign_jwt,
};
use serde_json::{Value, json};

const SECRET: &str = "test_secret_for_integration_tests";

struct TestApp {
    address: String,
    store: Arc<MemoryStore>,
    client: reqwest::Client,
}

impl TestApp {
    fn token(&self, user_id: i64) -> String {
        sign_jwt(user_id, SECRET, 600).expect("Failed to sign token")
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn post(&self, path: &str, user_id: i64, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(self.token(user_id))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    async fn patch(&self, path: &str, user_id: i64) -> reqwest::Response {
        self.client
            .patch(self.url(path))
            .bearer_auth(self.token(user_id))
            .send()
            .await
            .expect("Failed to execute request")
    }

    async fn get(&self, path: &str, user_id: i64) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(self.token(user_id))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// Spawns the app on a random port, backed by the in-memory store.
async fn spawn_app() -> TestApp {
    let config = Config {
        database_url: None,
        jwt_secret: SECRET.to_string(),
        rust_log: "error".to_string(),
        port: 0,
        store_backend: StoreBackend::Memory,
    };

    let store = Arc::new(MemoryStore::new());
    let state = AppState::in_memory(store.clone(), config);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        store,
        client: reqwest::Client::new(),
    }
}

/// Host, player, a quiz with one 30-second question, and an open room.
struct Seeded {
    host: i64,
    player: i64,
    room_id: i64,
    code: String,
    question_id: i64,
    right: i64,
    wrong: i64,
}

async fn seed_room(app: &TestApp) -> Seeded {
    let host = app.store.add_user("Host").await;
    let player = app.store.add_user("Player").await;
    let quiz = app.store.add_quiz("Capitals", host).await;
    let question = app
        .store
        .add_question(quiz.id, "Capital of France?", 30, &[("Paris", true), ("Lyon", false)])
        .await;

    let response = app.post("/api/rooms", host, json!({ "quizId": quiz.id })).await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();

    Seeded {
        host,
        player,
        room_id: body["data"]["id"].as_i64().unwrap(),
        code: body["data"]["code"].as_str().unwrap().to_string(),
        question_id: question.question.id,
        right: question.options[0].id,
        wrong: question.options[1].id,
    }
}

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/api/health")).send().await.unwrap();

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn unknown_path_is_404() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn room_routes_require_token() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/rooms/join-room"))
        .json(&json!({ "roomCode": "ABCDEF" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn create_room_returns_active_room_with_code() {
    let app = spawn_app().await;
    let host = app.store.add_user("Host").await;
    let quiz = app.store.add_quiz("Capitals", host).await;

    let response = app.post("/api/rooms", host, json!({ "quizId": quiz.id })).await;

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    let code = body["data"]["code"].as_str().unwrap();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    assert_eq!(body["data"]["isActive"], true);
    assert_eq!(body["data"]["createdBy"], host);
}

#[tokio::test]
async fn create_room_on_foreign_or_missing_quiz_fails() {
    let app = spawn_app().await;
    let owner = app.store.add_user("Owner").await;
    let other = app.store.add_user("Other").await;
    let quiz = app.store.add_quiz("Capitals", owner).await;

    let response = app.post("/api/rooms", other, json!({ "quizId": quiz.id })).await;
    assert_eq!(response.status().as_u16(), 403);

    let response = app.post("/api/rooms", owner, json!({ "quizId": 9999 })).await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn join_twice_conflicts() {
    let app = spawn_app().await;
    let seeded = seed_room(&app).await;

    let first = app
        .post("/api/rooms/join-room", seeded.player, json!({ "roomCode": seeded.code }))
        .await;
    assert_eq!(first.status().as_u16(), 201);
    let body: Value = first.json().await.unwrap();
    assert_eq!(body["data"]["totalScore"], 0);
    assert_eq!(body["data"]["roomId"], seeded.room_id);

    let second = app
        .post("/api/rooms/join-room", seeded.player, json!({ "roomCode": seeded.code }))
        .await;
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
async fn join_unknown_code_is_404() {
    let app = spawn_app().await;
    let player = app.store.add_user("Player").await;

    let response = app
        .post("/api/rooms/join-room", player, json!({ "roomCode": "NOPE00" }))
        .await;

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn answer_scores_by_speed_and_only_once() {
    let app = spawn_app().await;
    let seeded = seed_room(&app).await;
    app.post("/api/rooms/join-room", seeded.player, json!({ "roomCode": seeded.code }))
        .await;

    let response = app
        .post(
            "/api/rooms/answer-question",
            seeded.player,
            json!({
                "roomCode": seeded.code,
                "questionId": seeded.question_id,
                "optionId": seeded.right,
                "timer": 10.0
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["score"], 667);

    let again = app
        .post(
            "/api/rooms/answer-question",
            seeded.player,
            json!({
                "roomCode": seeded.code,
                "questionId": seeded.question_id,
                "optionId": seeded.wrong,
                "timer": 2.0
            }),
        )
        .await;
    assert_eq!(again.status().as_u16(), 409);

    let answers: Value = app
        .get(
            &format!("/api/rooms/user-answers?roomCode={}", seeded.code),
            seeded.host,
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(answers["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn answer_without_joining_is_forbidden() {
    let app = spawn_app().await;
    let seeded = seed_room(&app).await;

    let response = app
        .post(
            "/api/rooms/answer-question",
            seeded.player,
            json!({
                "roomCode": seeded.code,
                "questionId": seeded.question_id,
                "optionId": seeded.right,
                "timer": 1.0
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn ranks_follow_scores_and_exclude_owner() {
    let app = spawn_app().await;
    let seeded = seed_room(&app).await;
    let slow = app.store.add_user("Slow").await;

    for user in [seeded.player, slow] {
        app.post("/api/rooms/join-room", user, json!({ "roomCode": seeded.code }))
            .await;
    }
    app.post(
        "/api/rooms/answer-question",
        slow,
        json!({
            "roomCode": seeded.code,
            "questionId": seeded.question_id,
            "optionId": seeded.right,
            "timer": 20.0
        }),
    )
    .await;
    app.post(
        "/api/rooms/answer-question",
        seeded.player,
        json!({
            "roomCode": seeded.code,
            "questionId": seeded.question_id,
            "optionId": seeded.right,
            "timer": 1.0
        }),
    )
    .await;

    let forbidden = app
        .patch(
            &format!("/api/rooms/update-user-rank/{}", seeded.room_id),
            seeded.player,
        )
        .await;
    assert_eq!(forbidden.status().as_u16(), 403);

    let response = app
        .patch(
            &format!("/api/rooms/update-user-rank/{}", seeded.room_id),
            seeded.host,
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    let ranked = body["data"].as_array().unwrap();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0]["userId"], seeded.player);
    assert_eq!(ranked[0]["rank"], 1);
    assert_eq!(ranked[1]["userId"], slow);
    assert_eq!(ranked[1]["rank"], 2);

    let page: Value = app
        .get(
            &format!("/api/rooms/get-users/{}?page=1&take=1", seeded.room_id),
            seeded.host,
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(page["data"]["meta"]["totalCount"], 2);
    assert_eq!(page["data"]["data"].as_array().unwrap().len(), 1);
    assert_eq!(page["data"]["data"][0]["userId"], seeded.player);
}

#[tokio::test]
async fn end_room_closes_it_once() {
    let app = spawn_app().await;
    let seeded = seed_room(&app).await;

    let by_player = app
        .patch(&format!("/api/rooms/end-room/{}", seeded.room_id), seeded.player)
        .await;
    assert_eq!(by_player.status().as_u16(), 403);

    let first = app
        .patch(&format!("/api/rooms/end-room/{}", seeded.room_id), seeded.host)
        .await;
    assert_eq!(first.status().as_u16(), 200);
    let body: Value = first.json().await.unwrap();
    assert_eq!(body["data"]["isActive"], false);
    assert!(body["data"]["finishedAt"].is_string());

    let second = app
        .patch(&format!("/api/rooms/end-room/{}", seeded.room_id), seeded.host)
        .await;
    assert_eq!(second.status().as_u16(), 404);

    let join = app
        .post("/api/rooms/join-room", seeded.player, json!({ "roomCode": seeded.code }))
        .await;
    assert_eq!(join.status().as_u16(), 404);
}

#[tokio::test]
async fn openapi_document_lists_room_routes() {
    let app = spawn_app().await;

    let doc: Value = app
        .client
        .get(app.url("/api/openapi.json"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(doc["paths"]["/api/rooms/join-room"].is_object());
    assert!(doc["paths"]["/api/rooms/live"].is_object());
}
