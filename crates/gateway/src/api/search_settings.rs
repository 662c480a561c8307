//! Search Index Manager admin endpoints: datastore lifecycle, reindex,
//! and status.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use agentrt_domain::media::MediaLibraryItem;

use crate::state::AppState;

pub async fn create_datastore(State(state): State<AppState>, Path(brand_id): Path<String>) -> impl IntoResponse {
    match state.caps.search.create(&brand_id).await {
        Ok(descriptor) => Json(descriptor).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": e.to_string() }))).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteDatastoreQuery {
    #[serde(default)]
    force_recreate: bool,
}

pub async fn delete_datastore(
    State(state): State<AppState>,
    Path(brand_id): Path<String>,
    Query(q): Query<DeleteDatastoreQuery>,
) -> impl IntoResponse {
    match state.caps.search.delete(&brand_id, q.force_recreate).await {
        Ok(descriptor) => Json(descriptor).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": e.to_string() }))).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct ReindexQuery {
    #[serde(default)]
    job_id: Option<String>,
}

/// Kicks off a reindex as its own background task and returns immediately
/// with the `jobId`; `GET .../status` and the job tracker's `get_job` are
/// how a caller observes progress.
pub async fn reindex(State(state): State<AppState>, Path(brand_id): Path<String>, Query(q): Query<ReindexQuery>) -> impl IntoResponse {
    let job_id = q.job_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let items = load_media_library(&state, &brand_id).await;

    let search = state.caps.search.clone();
    let brand_id_for_task = brand_id.clone();
    let job_id_for_task = job_id.clone();
    tokio::spawn(async move {
        if let Err(e) = search.reindex(&brand_id_for_task, items, Some(job_id_for_task.clone())).await {
            tracing::warn!(brand_id = %brand_id_for_task, job_id = %job_id_for_task, error = %e, "reindex job failed");
        }
    });

    (StatusCode::ACCEPTED, Json(serde_json::json!({ "brandId": brand_id, "jobId": job_id }))).into_response()
}

pub async fn status(State(state): State<AppState>, Path(brand_id): Path<String>) -> impl IntoResponse {
    match state.caps.search.get_descriptor(&brand_id).await {
        Ok(descriptor) => Json(descriptor).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": e.to_string() }))).into_response(),
    }
}

async fn load_media_library(state: &AppState, brand_id: &str) -> Vec<MediaLibraryItem> {
    match state.caps.document_db.list(&format!("brands/{brand_id}/media")).await {
        Ok(docs) => docs.into_iter().filter_map(|(_, v)| serde_json::from_value(v).ok()).collect(),
        Err(e) => {
            tracing::warn!(brand_id, error = %e, "failed to load media library for reindex");
            Vec::new()
        }
    }
}
