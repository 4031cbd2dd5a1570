use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Relay support chatbot API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "chat": "/chat",
            "health": "/health",
            "consultations": "/consultations",
            "knowledge": "/knowledge/status"
        }
    }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let llm = match state.llm.health_check().await {
        Ok(true) => "operational",
        _ => "unreachable",
    };

    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "services": {
            "llm_provider": llm,
            "knowledge_base": "operational",
            "scheduler": "operational"
        }
    }))
}
