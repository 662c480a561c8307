//! Extracts media handles out of prior `toolResult` events, newest turn
//! first, so the resolver can answer "the last image" / "image 2" without
//! the caller re-deriving it from the raw transcript.

use serde_json::Value;

use agentrt_domain::event::{Event, EventKind, ToolResultStatus};
use agentrt_domain::media::{MediaHandle, MediaKind, MediaSource};

/// A handle recovered from history, tagged with the ordinal of the event it
/// came from so callers can group handles by turn.
#[derive(Debug, Clone)]
pub struct HistoricalHandle {
    pub ordinal: u64,
    pub handle: MediaHandle,
}

const URL_FIELDS: &[(&str, MediaKind)] = &[
    ("imageUrl", MediaKind::Image),
    ("videoUrl", MediaKind::Video),
    ("musicUrl", MediaKind::Audio),
    ("audioUrl", MediaKind::Audio),
];

const URL_LIST_FIELDS: &[(&str, MediaKind)] = &[
    ("imageUrls", MediaKind::Image),
    ("videoUrls", MediaKind::Video),
    ("musicUrls", MediaKind::Audio),
];

/// Walks `history` newest-to-oldest and returns every media handle found in
/// successful `toolResult` payloads, most recent first. A single event may
/// yield several handles (e.g. `imageUrls`); within that event they keep the
/// array's order.
pub fn handles_from_history(history: &[Event]) -> Vec<HistoricalHandle> {
    let mut out = Vec::new();
    for event in history.iter().rev() {
        let EventKind::ToolResult { status, content, tool_name, .. } = &event.kind else {
            continue;
        };
        if *status != ToolResultStatus::Success {
            continue;
        }
        let Ok(parsed) = serde_json::from_str::<Value>(content) else {
            continue;
        };
        out.extend(handles_from_payload(&parsed, tool_name, event.ordinal));
    }
    out
}

fn handles_from_payload(payload: &Value, tool_name: &str, ordinal: u64) -> Vec<HistoricalHandle> {
    let mut found = Vec::new();

    for (field, kind) in URL_LIST_FIELDS {
        if let Some(urls) = payload.get(field).and_then(Value::as_array) {
            for (i, url) in urls.iter().enumerate() {
                if let Some(url) = url.as_str() {
                    found.push(make_handle(ordinal, tool_name, *kind, url, i));
                }
            }
        }
    }
    if !found.is_empty() {
        return found;
    }

    for (field, kind) in URL_FIELDS {
        if let Some(url) = payload.get(field).and_then(Value::as_str) {
            found.push(make_handle(ordinal, tool_name, *kind, url, 0));
        }
    }
    found
}

fn make_handle(ordinal: u64, tool_name: &str, kind: MediaKind, url: &str, index: usize) -> HistoricalHandle {
    HistoricalHandle {
        ordinal,
        handle: MediaHandle {
            id: format!("hist-{ordinal}-{index}"),
            kind,
            uri: url.to_string(),
            mime_type: default_mime(kind).to_string(),
            source: MediaSource::Generated,
            provenance: format!("result of {tool_name} in prior turn (ordinal {ordinal})"),
        },
    }
}

fn default_mime(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => "image/png",
        MediaKind::Video => "video/mp4",
        MediaKind::Audio => "audio/mpeg",
        MediaKind::Pdf => "application/pdf",
        MediaKind::Other => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use agentrt_domain::event::EventAuthor;

    fn tool_result_event(ordinal: u64, content: &str) -> Event {
        Event {
            ordinal,
            author: EventAuthor::Model,
            kind: EventKind::ToolResult {
                call_id: format!("call-{ordinal}"),
                tool_name: "generateImage".into(),
                status: ToolResultStatus::Success,
                content: content.to_string(),
            },
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn newest_event_comes_first() {
        let history = vec![
            tool_result_event(1, r#"{"imageUrl":"https://a/1.png"}"#),
            tool_result_event(2, r#"{"imageUrl":"https://a/2.png"}"#),
        ];
        let handles = handles_from_history(&history);
        assert_eq!(handles[0].handle.uri, "https://a/2.png");
        assert_eq!(handles[1].handle.uri, "https://a/1.png");
    }

    #[test]
    fn plural_field_preferred_over_singular() {
        let history = vec![tool_result_event(
            1,
            r#"{"imageUrl":"https://a/0.png","imageUrls":["https://a/0.png","https://a/1.png"]}"#,
        )];
        let handles = handles_from_history(&history);
        assert_eq!(handles.len(), 2);
    }

    #[test]
    fn failed_results_are_skipped() {
        let mut event = tool_result_event(1, r#"{"imageUrl":"https://a/1.png"}"#);
        if let EventKind::ToolResult { status, .. } = &mut event.kind {
            *status = ToolResultStatus::Error;
        }
        assert!(handles_from_history(&[event]).is_empty());
    }
}
