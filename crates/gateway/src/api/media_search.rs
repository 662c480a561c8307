//! `POST /agent/media-search`: one-shot semantic search over a tenant's
//! media library, outside the turn loop.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};

use agentrt_domain::media::MediaLibraryItem;
use agentrt_search::QueryExpander;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSearchBody {
    pub brand_id: String,
    pub query: String,
    #[serde(default = "d_k")]
    pub k: usize,
}

fn d_k() -> usize {
    10
}

#[derive(Debug, Serialize)]
pub struct MediaSearchHitOut {
    pub media_id: String,
    pub score: f32,
}

pub async fn media_search(State(state): State<AppState>, Json(body): Json<MediaSearchBody>) -> impl IntoResponse {
    if body.brand_id.is_empty() || body.query.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": "brandId and query are required" }))).into_response();
    }

    let items = load_media_library(&state, &body.brand_id).await;

    let expander = QueryExpander::new(
        &state.caps.llm,
        state.caps.web_search.as_ref(),
        state.caps.search_config.query_expander_k,
        state.caps.search_config.query_expander_deadline_ms,
    );
    let variants = expander.expand(&body.query).await;

    match agentrt_search::search_with_variants(&state.caps.search, &body.brand_id, &variants, &items, body.k).await {
        Ok(hits) => Json(serde_json::json!({
            "hits": hits.into_iter().map(|h| MediaSearchHitOut { media_id: h.media_id, score: h.score }).collect::<Vec<_>>()
        }))
        .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": e.to_string() }))).into_response(),
    }
}

async fn load_media_library(state: &AppState, brand_id: &str) -> Vec<MediaLibraryItem> {
    match state.caps.document_db.list(&format!("brands/{brand_id}/media")).await {
        Ok(docs) => docs.into_iter().filter_map(|(_, v)| serde_json::from_value(v).ok()).collect(),
        Err(e) => {
            tracing::warn!(brand_id, error = %e, "failed to load media library for search");
            Vec::new()
        }
    }
}
