use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::scheduling::TeamMember;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecentLogsParams {
    pub hours: Option<i64>,
}

pub async fn recent_logs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecentLogsParams>,
) -> impl IntoResponse {
    let logs = state.audit.recent(params.hours.unwrap_or(24)).await;
    Json(json!({
        "status": "success",
        "total_logs": logs.len(),
        "logs": logs,
    }))
}

pub async fn logs_by_status(
    State(state): State<Arc<AppState>>,
    Path(status): Path<String>,
) -> impl IntoResponse {
    let logs = state.audit.by_status(&status).await;
    Json(json!({
        "status": "success",
        "total_logs": logs.len(),
        "logs": logs,
    }))
}

#[derive(Debug, Deserialize)]
pub struct DateRangeParams {
    pub start_date: String,
    pub end_date: String,
}

pub async fn logs_by_date_range(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DateRangeParams>,
) -> Result<impl IntoResponse, ApiError> {
    let logs = state
        .audit
        .by_date_range(&params.start_date, &params.end_date)
        .await?;
    Ok(Json(json!({
        "status": "success",
        "total_logs": logs.len(),
        "logs": logs,
    })))
}

pub async fn clear_logs(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = state.audit.clear_all().await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("All consultation logs cleared successfully. {} logs removed.", removed),
        "logs_removed": removed,
    })))
}

pub async fn stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let requests = state.ledger.all().await;
    let stats = state.audit.stats(&requests).await;
    Json(json!({
        "status": "success",
        "stats": stats,
    }))
}

pub async fn analytics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.analyzer.snapshot().await;
    Json(json!({
        "status": "success",
        "statistics": snapshot,
    }))
}

pub async fn team(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let members = state.audit.team_members().await;
    Json(json!({
        "status": "success",
        "total_members": members.len(),
        "team_members": members,
    }))
}

pub async fn add_team_member(
    State(state): State<Arc<AppState>>,
    Json(member): Json<TeamMember>,
) -> Result<impl IntoResponse, ApiError> {
    if member.name.trim().is_empty() || member.email.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "team members need a name and an email".to_string(),
        ));
    }

    let name = member.name.clone();
    state.audit.add_team_member(member).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Team member {} added successfully", name),
    })))
}

pub async fn remove_team_member(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.audit.remove_team_member(&email).await? {
        return Err(ApiError::NotFound("Team member not found".to_string()));
    }
    Ok(Json(json!({
        "success": true,
        "message": format!("Team member {} removed successfully", email),
    })))
}
