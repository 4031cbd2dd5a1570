use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, FromRequest, Path, Query, Request, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::scheduling::{
    parse_range_bound, ClientInfo, ConsultationStatus, NewConsultation, ScheduleOutcome,
};
use crate::state::AppState;

pub async fn available_slots(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let slots = state.ledger.available_slots().await;
    Json(json!({
        "status": "success",
        "available_slots": slots,
    }))
}

/// Schedule a consultation. A JSON body takes precedence; urlencoded form
/// fields are accepted for the plain HTML scheduling page.
pub async fn schedule(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    request: Request,
) -> Result<impl IntoResponse, ApiError> {
    let payload = extract_payload(&headers, request).await?;

    let client = ClientInfo {
        ip_address: addr.ip().to_string(),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
    };

    let contact = state.ledger.contact().clone();
    match state.ledger.schedule(payload, client).await? {
        ScheduleOutcome::Scheduled { id } => Ok(Json(json!({
            "success": true,
            "consultation_id": id,
            "message": format!(
                "Consultation request created successfully! Your consultation ID is {}.",
                id
            ),
            "next_steps": "Our team will contact you within 24 hours to confirm your appointment.",
            "contact_info": {
                "phone": contact.phone,
                "email": contact.email,
            },
        }))),
        ScheduleOutcome::SlotTaken { message, suggestion } => Ok(Json(json!({
            "success": false,
            "message": message,
            "suggestion": suggestion,
        }))),
    }
}

async fn extract_payload(
    headers: &HeaderMap,
    request: Request,
) -> Result<NewConsultation, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("application/json") {
        let Json(payload) = Json::<NewConsultation>::from_request(request, &())
            .await
            .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {}", e)))?;
        Ok(payload)
    } else {
        let Form(payload) = Form::<NewConsultation>::from_request(request, &())
            .await
            .map_err(|e| ApiError::BadRequest(format!("invalid form body: {}", e)))?;
        Ok(payload)
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let status = match &params.status {
        Some(raw) => Some(
            ConsultationStatus::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown status '{}'", raw)))?,
        ),
        None => None,
    };
    let from = params
        .from
        .as_deref()
        .map(|v| parse_range_bound(v, false))
        .transpose()?;
    let to = params
        .to
        .as_deref()
        .map(|v| parse_range_bound(v, true))
        .transpose()?;

    let requests = state.ledger.filtered(status, from, to).await;
    Ok(Json(json!({
        "status": "success",
        "total_requests": requests.len(),
        "requests": requests,
    })))
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(consultation_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let request = state
        .ledger
        .get(&consultation_id)
        .await
        .ok_or_else(|| ApiError::NotFound("Consultation request not found".to_string()))?;

    Ok(Json(json!({
        "found": true,
        "status": request.status,
        "created_at": request.created_at.to_rfc3339(),
        "confirmed_at": request.confirmed_at.map(|ts| ts.to_rfc3339()),
        "details": request,
    })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(consultation_id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let status = ConsultationStatus::parse(&payload.status)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown status '{}'", payload.status)))?;

    let old_status = state.ledger.update_status(&consultation_id, status).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!(
            "Consultation {} status updated from {} to {}",
            consultation_id,
            old_status.as_str(),
            status.as_str()
        ),
    })))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(consultation_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.ledger.delete(&consultation_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Consultation {} deleted successfully", consultation_id),
    })))
}
