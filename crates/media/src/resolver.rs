//! Media Resolver: decides which concrete media handles are in scope
//! for a turn, given the user's text, any attachments on the current
//! message, and the session's prior events.
//!
//! Resolution is a pure function of its inputs: same arguments, same
//! result, no side effects, and it never fails — an unresolved reference
//! degrades to an empty [`ResolvedMediaSet`] rather than an error.

use agentrt_domain::event::Event;
use agentrt_domain::media::{MediaHandle, MediaKind, MediaLibraryItem, ResolutionMethod, ResolvedMediaSet};
use agentrt_search::SearchIndexManager;

use crate::deictic::{self, DeicticReference};
use crate::history::handles_from_history;

/// Resolves `user_text` against `attachments` and `recent_history`.
///
/// `library` and `library_query` carry the optional library-lookup step
/// (step 3): if the text matches no deictic phrase and the caller supplies
/// a library to search, a fallback/vector lookup against `library_items` is
/// attempted before giving up.
pub async fn resolve(
    user_text: &str,
    attachments: &[MediaHandle],
    recent_history: &[Event],
    brand_id: &str,
    library: Option<&SearchIndexManager>,
    library_items: &[MediaLibraryItem],
) -> ResolvedMediaSet {
    // Step 1: explicit upload always wins.
    if !attachments.is_empty() {
        return ResolvedMediaSet {
            items: attachments.to_vec(),
            method: ResolutionMethod::ExplicitUpload,
            confidence: 1.0,
            user_intent: user_text.to_string(),
        };
    }

    let historical = handles_from_history(recent_history);

    // Step 2: deictic phrase detection over prior turns.
    if let Some(reference) = deictic::detect(user_text) {
        if let Some(resolved) = resolve_deictic(&reference, &historical, user_text) {
            return resolved;
        }
    }

    // Step 3: library lookup, only attempted when the caller wired one in.
    if let (Some(manager), false) = (library, library_items.is_empty()) {
        if let Ok(hits) = manager.search(brand_id, user_text, library_items, 1).await {
            if let Some(best) = hits.first() {
                if let Some(item) = library_items.iter().find(|i| i.media_id == best.media_id) {
                    let confidence = best.score.clamp(0.0, 0.95);
                    return ResolvedMediaSet {
                        items: vec![MediaHandle {
                            id: item.media_id.clone(),
                            kind: item.kind,
                            uri: item.storage_uri.clone(),
                            mime_type: default_mime(item.kind).to_string(),
                            source: item.source,
                            provenance: format!("library lookup for phrase {user_text:?}"),
                        }],
                        method: ResolutionMethod::LibraryLookup,
                        confidence,
                        user_intent: user_text.to_string(),
                    };
                }
            }
        }
    }

    // Step 4: nothing resolved.
    ResolvedMediaSet::none(user_text.to_string())
}

fn resolve_deictic(
    reference: &DeicticReference,
    historical: &[crate::history::HistoricalHandle],
    user_text: &str,
) -> Option<ResolvedMediaSet> {
    match reference {
        DeicticReference::Singular { kind } => {
            // `historical` is newest-first; `.find`/`.first()` both pick the
            // newest match, kind-constrained or not.
            let handle = match kind {
                Some(kind) => historical.iter().find(|h| h.handle.kind == *kind)?,
                None => historical.first()?,
            };
            Some(ResolvedMediaSet {
                items: vec![handle.handle.clone()],
                method: ResolutionMethod::LastImage,
                confidence: 0.75,
                user_intent: user_text.to_string(),
            })
        }
        DeicticReference::Ordinal { kind, index } => {
            // `historical` is newest-first; reverse to chronological
            // (oldest-first) order before applying the 1-indexed ordinal,
            // per spec.md ("the N-th image in chronological order").
            let mut of_kind: Vec<_> = historical.iter().filter(|h| h.handle.kind == *kind).collect();
            of_kind.reverse();
            if *index == 0 || *index > of_kind.len() {
                return None;
            }
            let handle = of_kind.get(index - 1)?;
            Some(ResolvedMediaSet {
                items: vec![handle.handle.clone()],
                method: ResolutionMethod::IndexedReference,
                confidence: 0.9,
                user_intent: user_text.to_string(),
            })
        }
        DeicticReference::Plural => {
            let newest_ordinal = historical.iter().map(|h| h.ordinal).max()?;
            let items: Vec<MediaHandle> = historical
                .iter()
                .filter(|h| h.ordinal == newest_ordinal)
                .map(|h| h.handle.clone())
                .collect();
            if items.is_empty() {
                return None;
            }
            Some(ResolvedMediaSet {
                items,
                method: ResolutionMethod::IndexedReference,
                confidence: 0.5,
                user_intent: user_text.to_string(),
            })
        }
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
    use agentrt_domain::event::{Event, EventAuthor, EventKind, ToolResultStatus};
    use agentrt_domain::media::MediaSource;
    use chrono::Utc;

    fn image_result_event(ordinal: u64, url: &str) -> Event {
        Event {
            ordinal,
            author: EventAuthor::Model,
            kind: EventKind::ToolResult {
                call_id: format!("call-{ordinal}"),
                tool_name: "generateImage".into(),
                status: ToolResultStatus::Success,
                content: format!(r#"{{"imageUrl":"{url}"}}"#),
            },
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn no_attachments_no_history_no_match_resolves_to_none() {
        let result = resolve("write a poem", &[], &[], "brand1", None, &[]).await;
        assert_eq!(result.method, ResolutionMethod::None);
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn explicit_attachment_always_wins() {
        let attachment = MediaHandle {
            id: "a1".into(),
            kind: MediaKind::Image,
            uri: "https://x/a1.png".into(),
            mime_type: "image/png".into(),
            source: MediaSource::Uploaded,
            provenance: "attached by user".into(),
        };
        let result = resolve("make this brighter, the image", &[attachment], &[], "brand1", None, &[]).await;
        assert_eq!(result.method, ResolutionMethod::ExplicitUpload);
        assert_eq!(result.confidence, 1.0);
    }

    /// spec.md §8 scenario 1: a bare pronoun with no noun, no attachment,
    /// resolves to the last image in history.
    #[tokio::test]
    async fn bare_pronoun_resolves_to_last_image() {
        let history = vec![image_result_event(1, "https://x/u1.png")];
        let result = resolve("make it blue", &[], &history, "brand1", None, &[]).await;
        assert_eq!(result.method, ResolutionMethod::LastImage);
        assert!(result.confidence >= 0.75);
        assert_eq!(result.items[0].uri, "https://x/u1.png");
    }

    /// "image N" must index chronologically (oldest first), not by recency:
    /// of three images emitted in order u1, u2, u3, "image 2" is u2.
    #[tokio::test]
    async fn ordinal_reference_indexes_chronologically_not_by_recency() {
        let history = vec![
            image_result_event(1, "https://x/u1.png"),
            image_result_event(2, "https://x/u2.png"),
            image_result_event(3, "https://x/u3.png"),
        ];
        let result = resolve("use image 2 for the background", &[], &history, "brand1", None, &[]).await;
        assert_eq!(result.method, ResolutionMethod::IndexedReference);
        assert_eq!(result.items[0].uri, "https://x/u2.png");
    }
}
