//! The HTTP surface, assembled into one [`axum::Router`].

pub mod chat;
pub mod health;
pub mod media_search;
pub mod memory;
pub mod search_settings;
pub mod session;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/v1/capabilities/readiness", get(health::readiness))
        .route("/agent/chat", post(chat::chat))
        .route("/agent/media-search", post(media_search::media_search))
        .route("/session/delete", post(session::delete))
        .route("/session/delete-last", post(session::delete_last))
        .route("/session/stats/:brand_id/:user_id", get(session::stats))
        .route("/memory/delete", post(memory::delete))
        .route(
            "/search-settings/:brand_id/datastore",
            post(search_settings::create_datastore).delete(search_settings::delete_datastore),
        )
        .route("/search-settings/:brand_id/reindex", post(search_settings::reindex))
        .route("/search-settings/:brand_id/status", get(search_settings::status))
        .with_state(state)
}
