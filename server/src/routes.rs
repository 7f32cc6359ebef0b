//! HTTP routes for the chat surface

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use concierge_core::{McpSession, Orchestrator};

use crate::handlers::{chat, health};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub session: Arc<McpSession>,
}

/// Create the API router
pub fn create_router(orchestrator: Arc<Orchestrator>, session: Arc<McpSession>) -> Router {
    let state = AppState {
        orchestrator,
        session,
    };

    Router::new()
        .route("/chat", post(chat))
        .route("/health", get(health))
        .with_state(state)
}
