// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    live::hub::SessionHub,
    store::{MemoryStore, QuizRepository, RoomStore},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RoomStore>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub sessions: Arc<SessionHub>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn RoomStore>, quizzes: Arc<dyn QuizRepository>, config: Config) -> Self {
        Self {
            store,
            quizzes,
            sessions: Arc::new(SessionHub::new()),
            config,
        }
    }

    /// State backed entirely by one in-memory store.
    pub fn in_memory(store: Arc<MemoryStore>, config: Config) -> Self {
        Self::new(store.clone(), store, config)
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
