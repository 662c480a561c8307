//! `POST /agent/chat`, the Request Coordinator's primary streaming
//! endpoint. Binds the request to a fresh [`TenantContext`], spawns one
//! Agent Loop turn, and streams its [`Frame`]s back as NDJSON until a
//! `final_response`/`error` frame or the per-request wall-clock timeout.

use std::convert::Infallible;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde::Deserialize;

use agentrt_domain::media::{MediaHandle, MediaKind, MediaSource};
use agentrt_domain::tenant::{RequestSettings, Tenant, TenantContext};
use agentrt_runtime::{AgentTurnRequest, Frame};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBody {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    pub brand_id: String,
    pub user_id: String,
    #[serde(default)]
    pub team_context: Option<serde_json::Value>,
    #[serde(default)]
    pub media: Vec<MediaAttachmentInput>,
    #[serde(default)]
    pub settings: RequestSettings,
    #[serde(default)]
    pub image_context: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAttachmentInput {
    pub uri: String,
    #[serde(default = "d_mime")]
    pub mime_type: String,
    #[serde(default)]
    pub kind: Option<MediaKind>,
}

fn d_mime() -> String {
    "application/octet-stream".to_string()
}

pub async fn chat(State(state): State<AppState>, Json(body): Json<ChatBody>) -> Response {
    if body.brand_id.is_empty() || body.user_id.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": "brandId and userId are required" }))).into_response();
    }

    let tenant = Tenant::new(body.brand_id, body.user_id);
    let mut tenant_ctx = TenantContext::new(tenant);
    tenant_ctx.settings = body.settings;
    tenant_ctx.team_context = merge_team_context(body.team_context, body.image_context);
    tenant_ctx.attachments = body
        .media
        .into_iter()
        .enumerate()
        .map(|(i, m)| MediaHandle {
            id: format!("attachment-{i}"),
            kind: m.kind.unwrap_or(MediaKind::Other),
            uri: m.uri,
            mime_type: m.mime_type,
            source: MediaSource::Uploaded,
            provenance: "attached by user".into(),
        })
        .collect();

    let req = AgentTurnRequest { caps: state.caps.clone(), tenant: tenant_ctx, user_text: body.message };
    let (cancel, rx) = state.runtime.spawn_turn(req);
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    let body = Body::from_stream(ndjson_stream(rx, cancel, timeout));
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn merge_team_context(team_context: Option<serde_json::Value>, image_context: Option<serde_json::Value>) -> Option<serde_json::Value> {
    match (team_context, image_context) {
        (None, None) => None,
        (Some(tc), None) => Some(tc),
        (tc, Some(ic)) => {
            let mut map = tc.and_then(|v| v.as_object().cloned()).unwrap_or_default();
            map.insert("imageContext".to_string(), ic);
            Some(serde_json::Value::Object(map))
        }
    }
}

/// Wraps the frame channel in an NDJSON byte stream, enforcing the
/// per-request wall-clock timeout by cancelling the turn and
/// emitting a terminal `error` frame if the deadline is reached first.
fn ndjson_stream(
    mut rx: tokio::sync::mpsc::Receiver<Frame>,
    cancel: agentrt_runtime::CancelToken,
    timeout: Duration,
) -> impl futures_core::Stream<Item = Result<Bytes, Infallible>> {
    async_stream::stream! {
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                frame = rx.recv() => {
                    match frame {
                        Some(frame) => {
                            let terminal = matches!(frame, Frame::FinalResponse { .. } | Frame::Error { .. });
                            yield Ok(Bytes::from(frame.to_ndjson_line()));
                            if terminal {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = &mut deadline => {
                    cancel.cancel();
                    yield Ok(Bytes::from(Frame::Error { message: "request timed out".into() }.to_ndjson_line()));
                    break;
                }
            }
        }
    }
}
