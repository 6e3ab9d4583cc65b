// src/state.rs

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::session::ExamSession;

/// Live exam sessions, keyed by student id: at most one active session per
/// student. Sessions hold no persisted state until they complete.
pub type SessionMap = Arc<Mutex<HashMap<i64, ExamSession>>>;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub sessions: SessionMap,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self {
            pool,
            config,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for SessionMap {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
