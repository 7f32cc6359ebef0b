//! HTTP handlers for the chat surface

use axum::{extract::State, http::StatusCode, response::Json};
use concierge_core::ConnectionState;
use serde::{Deserialize, Serialize};

use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub session: ConnectionState,
}

/// Process one user query through the orchestrator
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, StatusCode> {
    if request.query.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    match state.orchestrator.process_query(&request.query).await {
        Ok(response) => Ok(Json(ChatResponse { response })),
        Err(e) => {
            // The caller only learns "query failed"; details stay in the log
            tracing::error!("failed to process query: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Report the session's connection state
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let session = state.session.state();
    let status_code = if session == ConnectionState::Connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: if session == ConnectionState::Connected {
                "ok"
            } else {
                "degraded"
            },
            session,
        }),
    )
}
