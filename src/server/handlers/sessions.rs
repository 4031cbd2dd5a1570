use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn list_sessions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut sessions = Vec::new();
    for session_id in state.memory.session_ids().await {
        let history = state.memory.history(&session_id).await;
        sessions.push(json!({
            "session_id": session_id,
            "message_count": history.len(),
        }));
    }
    Json(json!({ "sessions": sessions }))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.memory.contains(&session_id).await {
        return Err(ApiError::NotFound("Session not found".to_string()));
    }

    let summary = state.memory.summary(&session_id).await;
    let messages: Vec<Value> = summary
        .history
        .iter()
        .map(|turn| {
            json!({
                "role": turn.role,
                "content": turn.content,
                "timestamp": turn.timestamp.to_rfc3339(),
            })
        })
        .collect();

    Ok(Json(json!({
        "session_id": summary.session_id,
        "message_count": summary.message_count,
        "topics_discussed": summary.topics_discussed,
        "last_activity": summary.last_activity,
        "messages": messages,
    })))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.memory.clear(&session_id).await {
        return Err(ApiError::NotFound("Session not found".to_string()));
    }
    Ok(Json(json!({ "message": "Session deleted successfully" })))
}
