use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddDocumentsRequest {
    pub texts: Vec<String>,
    pub metadata: Option<Vec<BTreeMap<String, String>>>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
    pub k: Option<usize>,
}

pub async fn add_documents(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AddDocumentsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.texts.is_empty() {
        return Err(ApiError::BadRequest("texts must not be empty".to_string()));
    }

    let added = state
        .knowledge
        .add_texts(payload.texts, payload.metadata)
        .await?;
    Ok(Json(json!({
        "message": format!("Added {} chunks to knowledge base", added)
    })))
}

pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        let Some(filename) = field.file_name().map(|name| name.to_string()) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {}", e)))?;

        let added = state.knowledge.add_file(&filename, &bytes).await?;
        return Ok(Json(json!({
            "message": format!("Successfully processed {}", filename),
            "filename": filename,
            "chunks_added": added,
        })));
    }

    Err(ApiError::BadRequest("no file field in upload".to_string()))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    if params.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }

    let results = state.knowledge.search(&params.query, params.k).await?;
    Ok(Json(json!({
        "query": params.query,
        "count": results.len(),
        "results": results,
    })))
}

pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.knowledge.status().await;
    Json(json!({
        "status": "success",
        "knowledge_base": status,
    }))
}

pub async fn reinitialize(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let added = state.knowledge.reinitialize().await?;
    Ok(Json(json!({
        "message": format!("Knowledge base initialized with {} seed chunks", added)
    })))
}
