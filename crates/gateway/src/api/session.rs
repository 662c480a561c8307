//! Session management endpoints: delete, delete-last-turn, stats.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use agentrt_domain::tenant::Tenant;
use agentrt_sessions::TokenCounter;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTenantBody {
    pub brand_id: String,
    pub user_id: String,
}

pub async fn delete(State(state): State<AppState>, Json(body): Json<SessionTenantBody>) -> impl IntoResponse {
    let session_key = Tenant::new(body.brand_id, body.user_id).session_key();
    match state.sessions.delete(&session_key) {
        Ok(()) => Json(serde_json::json!({ "sessionKey": session_key, "deleted": true })).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": e.to_string() }))).into_response(),
    }
}

pub async fn delete_last(State(state): State<AppState>, Json(body): Json<SessionTenantBody>) -> impl IntoResponse {
    let session_key = Tenant::new(body.brand_id, body.user_id).session_key();
    match state.sessions.delete_last_turn(&session_key) {
        Ok(remaining) => Json(serde_json::json!({ "sessionKey": session_key, "remainingEvents": remaining.len() })).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": e.to_string() }))).into_response(),
    }
}

pub async fn stats(State(state): State<AppState>, Path((brand_id, user_id)): Path<(String, String)>) -> impl IntoResponse {
    let session_key = Tenant::new(brand_id, user_id).session_key();
    let events = match state.sessions.load(&session_key) {
        Ok(events) => events,
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": e.to_string() }))).into_response(),
    };
    let token_count = state.token_counter.count(&events);
    let last_update = events.last().map(|e| e.timestamp);

    Json(serde_json::json!({
        "sessionKey": session_key,
        "eventCount": events.len(),
        "tokenCount": token_count,
        "lastUpdatedAt": last_update,
    }))
    .into_response()
}
