//! Per-tenant append-only event log with token-budgeted trimming.
//!
//! Keyed by `sessionKey` (`brandId_userId`). Writes for a given key are
//! serialised through a per-key mutex: the single-writer-per-session-key
//! discipline is the minimum needed to keep turn ordering intact. Persistence
//! is JSONL via [`crate::transcript::TranscriptWriter`]; an in-memory cache
//! avoids re-reading the file on every turn.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use agentrt_domain::error::Result;
use agentrt_domain::event::{Event, EventAuthor, EventKind};
use agentrt_domain::trace::TraceEvent;

use crate::token::TokenCounter;
use crate::transcript::TranscriptWriter;

struct SessionState {
    events: Vec<Event>,
    /// Per-session write lock, held across a load-modify-persist cycle so
    /// two concurrent turns for the same tenant can't interleave appends.
    write_lock: Arc<Mutex<()>>,
}

pub struct SessionStore {
    writer: TranscriptWriter,
    cache: RwLock<HashMap<String, SessionState>>,
}

impl SessionStore {
    pub fn new(base_dir: &Path) -> Self {
        Self { writer: TranscriptWriter::new(base_dir), cache: RwLock::new(HashMap::new()) }
    }

    fn write_lock(&self, session_key: &str) -> Arc<Mutex<()>> {
        if let Some(state) = self.cache.read().get(session_key) {
            return state.write_lock.clone();
        }
        let mut cache = self.cache.write();
        cache
            .entry(session_key.to_string())
            .or_insert_with(|| SessionState { events: Vec::new(), write_lock: Arc::new(Mutex::new(())) })
            .write_lock
            .clone()
    }

    /// Loads the session (from cache, or from disk on first touch for this
    /// process). Returns whether the session was newly created.
    pub fn resolve_or_create(&self, session_key: &str) -> Result<(Vec<Event>, bool)> {
        if let Some(state) = self.cache.read().get(session_key) {
            return Ok((state.events.clone(), false));
        }
        let lock = self.write_lock(session_key);
        let _guard = lock.lock();
        // Re-check after acquiring the lock: another thread may have loaded
        // it while we waited.
        if let Some(state) = self.cache.read().get(session_key) {
            return Ok((state.events.clone(), false));
        }
        let events = self.writer.read(session_key)?;
        let is_new = events.is_empty();
        self.cache.write().insert(
            session_key.to_string(),
            SessionState { events: events.clone(), write_lock: lock },
        );
        TraceEvent::SessionResolved { session_key: session_key.to_string(), is_new, event_count: events.len() }.emit();
        Ok((events, is_new))
    }

    pub fn load(&self, session_key: &str) -> Result<Vec<Event>> {
        Ok(self.resolve_or_create(session_key)?.0)
    }

    /// Appends new events, persisting them before they're visible to other
    /// callers.
    pub fn append_events(&self, session_key: &str, new_events: Vec<Event>) -> Result<()> {
        if new_events.is_empty() {
            return Ok(());
        }
        self.resolve_or_create(session_key)?;
        let lock = self.write_lock(session_key);
        let _guard = lock.lock();

        self.writer.append(session_key, &new_events)?;
        let mut cache = self.cache.write();
        let state = cache.entry(session_key.to_string()).or_insert_with(|| SessionState {
            events: Vec::new(),
            write_lock: lock.clone(),
        });
        state.events.extend(new_events);
        Ok(())
    }

    /// Drops the oldest events until the tail fits `token_budget`, never
    /// splitting a toolCall/toolResult pair. Returns the trimmed
    /// history; appends a `systemNotice` event recording that trimming
    /// occurred.
    pub fn trim_if_needed(&self, session_key: &str, token_budget: u32, counter: &dyn TokenCounter) -> Result<Vec<Event>> {
        let (events, _) = self.resolve_or_create(session_key)?;
        let before = counter.count(&events);
        if before <= token_budget {
            return Ok(events);
        }

        let lock = self.write_lock(session_key);
        let _guard = lock.lock();
        let trimmed = trim_to_budget(&events, token_budget, counter);
        let dropped = events.len() - trimmed.len();
        let after = counter.count(&trimmed);

        let mut final_events = trimmed;
        if dropped > 0 {
            let next_ordinal = final_events.last().map(|e| e.ordinal + 1).unwrap_or(0);
            final_events.push(Event {
                ordinal: next_ordinal,
                author: EventAuthor::System,
                kind: EventKind::SystemNotice { text: format!("trimmed {dropped} older event(s) to stay within the session token budget") },
                timestamp: chrono::Utc::now(),
            });
        }

        self.writer.replace(session_key, &final_events)?;
        self.cache.write().insert(session_key.to_string(), SessionState { events: final_events.clone(), write_lock: lock });

        TraceEvent::SessionTrimmed {
            session_key: session_key.to_string(),
            dropped_events: dropped,
            remaining_events: final_events.len(),
            token_estimate_before: before as u64,
            token_estimate_after: after as u64,
        }
        .emit();

        Ok(final_events)
    }

    pub fn delete(&self, session_key: &str) -> Result<()> {
        self.writer.delete(session_key)?;
        self.cache.write().remove(session_key);
        Ok(())
    }

    /// Drops only the most recent turn (the last contiguous run of events
    /// produced since the previous `userTurn`, or the last event if none).
    pub fn delete_last_turn(&self, session_key: &str) -> Result<Vec<Event>> {
        let (mut events, _) = self.resolve_or_create(session_key)?;
        let lock = self.write_lock(session_key);
        let _guard = lock.lock();

        let cut = events
            .iter()
            .rposition(|e| matches!(e.kind, EventKind::UserTurn { .. }))
            .unwrap_or(events.len().saturating_sub(1));
        events.truncate(cut);

        self.writer.replace(session_key, &events)?;
        self.cache.write().insert(session_key.to_string(), SessionState { events: events.clone(), write_lock: lock });
        Ok(events)
    }

    pub fn count_tokens(&self, session_key: &str, counter: &dyn TokenCounter) -> Result<u32> {
        Ok(counter.count(&self.load(session_key)?))
    }
}

/// Drops the oldest events from `events` until the remaining tail's token
/// count is within `budget`, keeping toolCall/toolResult pairs intact.
fn trim_to_budget(events: &[Event], budget: u32, counter: &dyn TokenCounter) -> Vec<Event> {
    let mut start = 0;
    while start < events.len() && counter.count(&events[start..]) > budget {
        start += 1;
        // If the cut lands inside a toolCall/toolResult pair, extend the cut
        // to cover the whole pair rather than splitting it.
        if let Some(pair_id) = events.get(start - 1).and_then(|e| e.pair_id()) {
            let pair_id = pair_id.to_string();
            while start < events.len() && events[start].pair_id() == Some(pair_id.as_str()) {
                start += 1;
            }
        }
    }
    events[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentrt_domain::event::ToolResultStatus;
    use agentrt_domain::tool::ToolCall;
    use serde_json::json;

    fn event(ordinal: u64, kind: EventKind) -> Event {
        Event { ordinal, author: EventAuthor::User, kind, timestamp: chrono::Utc::now() }
    }

    struct FixedCounter(u32);
    impl TokenCounter for FixedCounter {
        fn count(&self, events: &[Event]) -> u32 {
            events.len() as u32 * self.0
        }
    }

    #[test]
    fn trim_never_splits_a_tool_call_pair() {
        let events = vec![
            event(0, EventKind::UserTurn { text: "hi".into() }),
            event(1, EventKind::ToolCall { call: ToolCall { call_id: "c1".into(), tool_name: "t".into(), arguments: json!({}) } }),
            event(2, EventKind::ToolResult { call_id: "c1".into(), tool_name: "t".into(), status: ToolResultStatus::Success, content: "{}".into() }),
            event(3, EventKind::ModelText { text: "done".into() }),
        ];
        let counter = FixedCounter(1);
        let trimmed = trim_to_budget(&events, 2, &counter);
        let has_call = trimmed.iter().any(|e| matches!(e.kind, EventKind::ToolCall { .. }));
        let has_result = trimmed.iter().any(|e| matches!(e.kind, EventKind::ToolResult { .. }));
        assert_eq!(has_call, has_result, "a tool call/result pair must never be split by trimming");
    }

    #[test]
    fn append_and_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let events = vec![event(0, EventKind::UserTurn { text: "hello".into() })];
        store.append_events("brand_user", events.clone()).unwrap();
        let loaded = store.load("brand_user").unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn trim_is_a_suffix_of_the_pre_trim_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let events: Vec<Event> = (0..10).map(|i| event(i, EventKind::ModelText { text: format!("t{i}") })).collect();
        store.append_events("brand_user", events.clone()).unwrap();
        let trimmed = store.trim_if_needed("brand_user", 1, &FixedCounter(10)).unwrap();
        let original_ordinals: Vec<u64> = events.iter().map(|e| e.ordinal).collect();
        let trimmed_ordinals: Vec<u64> =
            trimmed.iter().filter(|e| !matches!(e.kind, EventKind::SystemNotice { .. })).map(|e| e.ordinal).collect();
        assert!(original_ordinals.ends_with(&trimmed_ordinals));
    }
}
