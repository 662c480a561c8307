//! `POST /memory/delete`: deletes a memory fact by its shared ID.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryDeleteBody {
    pub user_id: String,
    pub memory_id: String,
    /// Carried through from the request for symmetry with the wire
    /// contract; the Memory Store has a single fact namespace per user so
    /// this does not currently affect dispatch.
    #[serde(default)]
    pub r#type: Option<String>,
}

pub async fn delete(State(state): State<AppState>, Json(body): Json<MemoryDeleteBody>) -> impl IntoResponse {
    match state.caps.memory.delete(&body.user_id, &body.memory_id).await {
        Ok(()) => Json(serde_json::json!({ "userId": body.user_id, "memoryId": body.memory_id, "deleted": true })).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": e.to_string() }))).into_response(),
    }
}
