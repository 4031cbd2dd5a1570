use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{admin, chat, consultations, health, knowledge, sessions};
use crate::state::AppState;

/// Creates the application router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state);
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/chat", post(chat::chat))
        .route("/sessions", get(sessions::list_sessions))
        .route(
            "/sessions/:session_id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/knowledge/documents", post(knowledge::add_documents))
        .route("/knowledge/upload", post(knowledge::upload_document))
        .route("/knowledge/search", get(knowledge::search))
        .route("/knowledge/status", get(knowledge::status))
        .route("/knowledge/reinitialize", post(knowledge::reinitialize))
        .route("/consultations/slots", get(consultations::available_slots))
        .route(
            "/consultations",
            get(consultations::list).post(consultations::schedule),
        )
        .route(
            "/consultations/:consultation_id",
            get(consultations::get_status).delete(consultations::delete),
        )
        .route(
            "/consultations/:consultation_id/status",
            put(consultations::update_status),
        )
        .route("/admin/logs/recent", get(admin::recent_logs))
        .route("/admin/logs/status/:status", get(admin::logs_by_status))
        .route("/admin/logs/range", get(admin::logs_by_date_range))
        .route("/admin/logs/clear", post(admin::clear_logs))
        .route("/admin/stats", get(admin::stats))
        .route("/admin/analytics", get(admin::analytics))
        .route(
            "/admin/team",
            get(admin::team).post(admin::add_team_member),
        )
        .route("/admin/team/:email", delete(admin::remove_team_member))
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(state: &Arc<AppState>) -> CorsLayer {
    let configured = &state.settings.server.cors_allowed_origins;
    let origins: Vec<HeaderValue> = if configured.is_empty() {
        default_local_origins()
    } else {
        configured.clone()
    }
    .into_iter()
    .filter_map(|origin| HeaderValue::from_str(&origin).ok())
    .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
}

fn default_local_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
        "http://localhost:8000".to_string(),
        "http://127.0.0.1".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
        "http://127.0.0.1:8000".to_string(),
    ]
}
