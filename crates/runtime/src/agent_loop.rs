//! Agent Loop: the reason/act loop that drives one conversational turn.
//! Loads and trims history, resolves media, streams the LLM's
//! response, dispatches any tool calls it requests, and re-prompts with
//! their results until the model stops or a safety limit is hit.
//!
//! Two parallel records come out of a turn: the durable [`Event`] log
//! appended to the [`SessionStore`], and the ephemeral [`Frame`] stream the
//! caller reads for live progress. They are related but not identical —
//! `ModelThought` is persisted but has no dedicated frame type of its own
//! beyond `thought`, and `context_update`/`log` frames have no session
//! event counterpart at all.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::Instrument;

use agentrt_capabilities::{ChatRequest, LlmRouter};
use agentrt_domain::error::Error;
use agentrt_domain::event::{Event, EventAuthor, EventKind, ToolResultStatus};
use agentrt_domain::media::MediaLibraryItem;
use agentrt_domain::stream::StreamEvent;
use agentrt_domain::tenant::TenantContext;
use agentrt_domain::tool::{ContentPart, Message, MessageContent, Role, ToolCall};
use agentrt_sessions::{SessionStore, TokenCounter};
use agentrt_tools::{ToolCapabilities, ToolContext, ToolOutcome, ToolRegistry};

use crate::cancel::{CancelMap, CancelToken};
use crate::encoder::Frame;
use crate::job_tracker::JobTracker;

/// Force-stop after this many reprompt iterations, mirroring a turn that
/// keeps calling tools without ever producing a final answer.
const MAX_TOOL_LOOPS: usize = 25;

/// Retry budget for a transient failure opening or reading the LLM stream,
/// matching the backoff curve [`LlmRouter`] uses for its own non-streaming
/// retries.
const MAX_STREAM_RETRIES: u32 = 3;

pub struct AgentRuntime {
    sessions: Arc<SessionStore>,
    tools: Arc<ToolRegistry>,
    token_counter: Arc<dyn TokenCounter>,
    cancel_map: Arc<CancelMap>,
    job_tracker: Arc<JobTracker>,
    system_instruction: String,
    session_token_budget: u32,
    tool_timeout: Duration,
}

pub struct AgentTurnRequest {
    pub caps: Arc<ToolCapabilities>,
    pub tenant: TenantContext,
    pub user_text: String,
}

impl AgentRuntime {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sessions: Arc<SessionStore>,
        tools: Arc<ToolRegistry>,
        token_counter: Arc<dyn TokenCounter>,
        cancel_map: Arc<CancelMap>,
        job_tracker: Arc<JobTracker>,
        system_instruction: String,
        session_token_budget: u32,
        tool_timeout: Duration,
    ) -> Self {
        Self { sessions, tools, token_counter, cancel_map, job_tracker, system_instruction, session_token_budget, tool_timeout }
    }

    /// Spawns one turn as a background task and returns its cancel token
    /// plus a channel of frames for the caller (the Request Coordinator) to
    /// stream out. The task's lifetime is independent of the receiver: if
    /// the caller drops `rx`, sends become no-ops and the loop keeps
    /// running to completion so the session and memory stay consistent.
    pub fn spawn_turn(self: &Arc<Self>, req: AgentTurnRequest) -> (CancelToken, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(64);
        let session_key = req.tenant.session_key();
        let cancel = self.cancel_map.register(&session_key);
        let cancel_for_task = cancel.clone();
        let this = self.clone();
        let turn_span = tracing::info_span!("turn", session_key = %session_key, "otel.kind" = "SERVER");
        tokio::spawn(
            async move {
                let result = this.run_turn_inner(req, &cancel_for_task, &tx).await;
                this.cancel_map.remove(&session_key);
                if let Err(e) = result {
                    let _ = tx.send(Frame::Error { message: e.to_string() }).await;
                }
            }
            .instrument(turn_span),
        );
        (cancel, rx)
    }

    async fn run_turn_inner(
        &self,
        req: AgentTurnRequest,
        cancel: &CancelToken,
        tx: &mpsc::Sender<Frame>,
    ) -> Result<(), Error> {
        let AgentTurnRequest { caps, mut tenant, user_text } = req;
        let session_key = tenant.session_key();
        let brand_id = tenant.tenant.brand_id.clone();
        let user_id = tenant.tenant.user_id.clone();

        // ── Step 1: load and trim history ───────────────────────────────
        let history = self.sessions.load(&session_key)?;
        let history = self.sessions.trim_if_needed(&session_key, self.session_token_budget, self.token_counter.as_ref())?;
        let mut next_ordinal = history.last().map(|e| e.ordinal + 1).unwrap_or(0);

        // ── Step 2: recall memories ──────────────────────────────────────
        let memories = if caps.memory_bank_enabled {
            caps.memory.recall(&user_id, &user_text).await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "memory recall failed, continuing without it");
                Vec::new()
            })
        } else {
            Vec::new()
        };

        // ── Step 3: resolve media in scope for this turn ─────────────────
        let library_items = load_media_library(&caps, &brand_id).await;
        let resolved = agentrt_media::resolve(
            &user_text,
            &tenant.attachments,
            &history,
            &brand_id,
            Some(caps.search.as_ref()),
            &library_items,
        )
        .await;
        let active_media = resolved.items.clone();
        tenant.resolved_media = Some(resolved.clone());

        agentrt_domain::trace::TraceEvent::MediaResolved {
            session_key: session_key.clone(),
            method: format!("{:?}", resolved.method),
            confidence: resolved.confidence,
            item_count: resolved.items.len(),
        }
        .emit();

        let _ = tx
            .send(Frame::ContextUpdate {
                token_usage: self.token_counter.count(&history),
                active_media: active_media.clone(),
            })
            .await;

        // ── Step 4: compose the system message and append the user turn ──
        let system_prompt = compose_system_prompt(&self.system_instruction, &tenant, &memories, &resolved);
        let mut messages = vec![Message::system(system_prompt)];
        messages.extend(events_to_messages(&history));
        messages.push(user_message_with_media(&user_text, &resolved.items));

        let user_turn_event = Event { ordinal: next_ordinal, author: EventAuthor::User, kind: EventKind::UserTurn { text: user_text.clone() }, timestamp: chrono::Utc::now() };
        next_ordinal += 1;
        self.sessions.append_events(&session_key, vec![user_turn_event])?;
        let _ = tx.send(Frame::Log { content: "Thinking…".into() }).await;

        // ── Step 5: reason/act loop ───────────────────────────────────────
        let tool_defs = self.tools.definitions();
        let mut text_buf = String::new();
        let mut image_urls: Vec<String> = Vec::new();
        let mut video_urls: Vec<String> = Vec::new();
        let mut music_urls: Vec<String> = Vec::new();
        let mut turn_events: Vec<Event> = Vec::new();

        'turn: for loop_idx in 0..MAX_TOOL_LOOPS {
            if cancel.is_cancelled() {
                self.sessions.append_events(&session_key, std::mem::take(&mut turn_events))?;
                return Ok(());
            }

            let request = ChatRequest { messages: messages.clone(), tools: tool_defs.clone(), ..Default::default() };
            let llm_call_span = tracing::info_span!("llm.call", "otel.kind" = "CLIENT", model = request.model.as_deref().unwrap_or("default"));
            let stream_result = self.chat_stream_with_retries(&caps.llm, &request).instrument(llm_call_span).await;
            let mut stream = match stream_result {
                Ok(stream) => stream,
                Err(e) => {
                    self.sessions.append_events(&session_key, std::mem::take(&mut turn_events))?;
                    let notice = Event {
                        ordinal: next_ordinal,
                        author: EventAuthor::System,
                        kind: EventKind::SystemNotice { text: format!("LLM request failed after retries: {e}") },
                        timestamp: chrono::Utc::now(),
                    };
                    self.sessions.append_events(&session_key, vec![notice])?;
                    let _ = tx.send(Frame::FinalResponse { content: format!("I couldn't complete that: {e}"), image_urls: None, video_urls: None, music_urls: None }).await;
                    return Ok(());
                }
            };

            let mut pending_calls: Vec<ToolCall> = Vec::new();
            let mut tc_bufs: HashMap<String, (String, String)> = HashMap::new();
            let mut was_cancelled = false;

            while let Some(chunk) = stream.next().await {
                if cancel.is_cancelled() {
                    was_cancelled = true;
                    break;
                }
                match chunk? {
                    StreamEvent::Token { text } => {
                        text_buf.push_str(&text);
                        let _ = tx.send(Frame::TextDelta { delta: text }).await;
                    }
                    StreamEvent::ToolCallStarted { call_id, tool_name } => {
                        tc_bufs.insert(call_id, (tool_name, String::new()));
                    }
                    StreamEvent::ToolCallDelta { call_id, delta } => {
                        if let Some((_, args)) = tc_bufs.get_mut(&call_id) {
                            args.push_str(&delta);
                        }
                    }
                    StreamEvent::ToolCallFinished { call_id, tool_name, arguments } => {
                        pending_calls.push(ToolCall { call_id: call_id.clone(), tool_name, arguments });
                        tc_bufs.remove(&call_id);
                    }
                    StreamEvent::Done { .. } => {}
                    StreamEvent::Error { message } => {
                        self.sessions.append_events(&session_key, std::mem::take(&mut turn_events))?;
                        let _ = tx.send(Frame::Error { message }).await;
                        return Ok(());
                    }
                }
            }

            if was_cancelled {
                self.sessions.append_events(&session_key, std::mem::take(&mut turn_events))?;
                return Ok(());
            }

            for (call_id, (tool_name, args_str)) in tc_bufs.drain() {
                let arguments = parse_tool_arguments(&call_id, &tool_name, &args_str);
                pending_calls.push(ToolCall { call_id, tool_name, arguments });
            }

            // No tool calls: this is the model's final answer for the turn.
            if pending_calls.is_empty() {
                if !text_buf.is_empty() {
                    turn_events.push(Event { ordinal: next_ordinal, author: EventAuthor::Model, kind: EventKind::ModelText { text: text_buf.clone() }, timestamp: chrono::Utc::now() });
                    next_ordinal += 1;
                }
                break 'turn;
            }

            messages.push(assistant_tool_call_message(&text_buf, &pending_calls));

            for call in pending_calls {
                if cancel.is_cancelled() {
                    self.sessions.append_events(&session_key, std::mem::take(&mut turn_events))?;
                    return Ok(());
                }

                let _ = tx.send(Frame::Thought { content: format!("calling {}", call.tool_name) }).await;
                turn_events.push(Event { ordinal: next_ordinal, author: EventAuthor::Model, kind: EventKind::ModelThought { text: format!("calling {}", call.tool_name) }, timestamp: chrono::Utc::now() });
                next_ordinal += 1;

                let _ = tx.send(Frame::ToolCall { name: call.tool_name.clone(), args: call.arguments.clone() }).await;
                turn_events.push(Event { ordinal: next_ordinal, author: EventAuthor::Model, kind: EventKind::ToolCall { call: call.clone() }, timestamp: chrono::Utc::now() });
                next_ordinal += 1;

                let tool_ctx = ToolContext::new(tenant.clone(), caps.clone());
                let tool_span = tracing::info_span!("tool.call", tool_name = %call.tool_name);
                let outcome = self
                    .tools
                    .dispatch(&call.tool_name, call.arguments.clone(), &tool_ctx, self.tool_timeout)
                    .instrument(tool_span)
                    .await;

                agentrt_domain::trace::TraceEvent::ToolDispatched {
                    session_key: session_key.clone(),
                    tool: call.tool_name.clone(),
                    ok: !outcome.is_error(),
                    duration_ms: 0,
                }
                .emit();

                collect_extracted_media(&outcome, &mut image_urls, &mut video_urls, &mut music_urls);
                if let Some(job_id) = outcome.extra.get("jobId").and_then(Value::as_str) {
                    self.job_tracker.spawn_poll(job_id.to_string());
                }

                let status = if outcome.is_error() { ToolResultStatus::Error } else { ToolResultStatus::Success };
                let _ = tx
                    .send(Frame::ToolResult {
                        name: call.tool_name.clone(),
                        status: if outcome.is_error() { "error".into() } else { "success".into() },
                        content: outcome.content.clone(),
                        extra: outcome.extra.clone(),
                    })
                    .await;
                turn_events.push(Event {
                    ordinal: next_ordinal,
                    author: EventAuthor::System,
                    kind: EventKind::ToolResult { call_id: call.call_id.clone(), tool_name: call.tool_name.clone(), status, content: outcome.content.clone() },
                    timestamp: chrono::Utc::now(),
                });
                next_ordinal += 1;

                messages.push(Message::tool_result(&call.call_id, &outcome.content));
            }

            self.sessions.append_events(&session_key, std::mem::take(&mut turn_events))?;
            text_buf.clear();

            if loop_idx == MAX_TOOL_LOOPS - 1 {
                let _ = tx.send(Frame::Error { message: format!("tool loop limit reached ({MAX_TOOL_LOOPS} iterations)") }).await;
                return Ok(());
            }
        }

        self.sessions.append_events(&session_key, turn_events)?;

        let memory_caps = caps.clone();
        let memory_user_id = user_id.clone();
        let memory_user_text = user_text.clone();
        let memory_assistant_text = text_buf.clone();
        tokio::spawn(async move {
            extract_and_save_turn(memory_caps, memory_user_id, memory_user_text, memory_assistant_text).await;
        });

        let _ = tx
            .send(Frame::FinalResponse {
                content: text_buf,
                image_urls: (!image_urls.is_empty()).then_some(image_urls),
                video_urls: (!video_urls.is_empty()).then_some(video_urls),
                music_urls: (!music_urls.is_empty()).then_some(music_urls),
            })
            .await;
        Ok(())
    }

    /// Wraps [`LlmRouter::chat_stream`] with the same retry/backoff budget
    /// the router gives its non-streaming `chat` path — opening a stream is
    /// itself a single request/response round trip and can fail
    /// transiently the same way.
    async fn chat_stream_with_retries(
        &self,
        llm: &LlmRouter,
        request: &ChatRequest,
    ) -> Result<agentrt_domain::stream::BoxStream<'static, Result<StreamEvent, Error>>, Error> {
        let mut attempt = 0;
        loop {
            match llm.chat_stream(request.model.as_deref(), request.clone()).await {
                Ok(stream) => return Ok(stream),
                Err(e) if e.is_retriable() && attempt < MAX_STREAM_RETRIES => {
                    attempt += 1;
                    let backoff = Duration::from_millis(200 * 2u64.pow(attempt - 1));
                    tracing::warn!(attempt, backoff_ms = backoff.as_millis() as u64, error = %e, "retrying LLM stream open after transient failure");
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

async fn load_media_library(caps: &ToolCapabilities, brand_id: &str) -> Vec<MediaLibraryItem> {
    match caps.document_db.list(&format!("brands/{brand_id}/media")).await {
        Ok(docs) => docs.into_iter().filter_map(|(_, v)| serde_json::from_value(v).ok()).collect(),
        Err(e) => {
            tracing::warn!(brand_id, error = %e, "failed to load media library for resolution, resolving without it");
            Vec::new()
        }
    }
}

fn compose_system_prompt(
    base: &str,
    tenant: &TenantContext,
    memories: &[agentrt_domain::memory::MemoryFact],
    resolved: &agentrt_domain::media::ResolvedMediaSet,
) -> String {
    let mut prompt = base.to_string();
    if let Some(team_context) = &tenant.team_context {
        prompt.push_str(&format!("\n\nTeam context: {team_context}"));
    }
    if !memories.is_empty() {
        let facts = memories.iter().map(|f| format!("- {}", f.text)).collect::<Vec<_>>().join("\n");
        prompt.push_str(&format!("\n\nKnown facts about this user:\n{facts}"));
    }
    if !resolved.items.is_empty() {
        let media = resolved
            .items
            .iter()
            .map(|m| format!("- {} ({:?}, {}): {}", m.id, m.kind, m.uri, m.provenance))
            .collect::<Vec<_>>()
            .join("\n");
        prompt.push_str(&format!("\n\nMedia in scope for this turn (resolved via {:?}):\n{media}", resolved.method));
    }
    prompt
}

/// Attaches resolved media as additional content parts when there is any in
/// scope, and inlines the URLs into the text too so tools that take a URL
/// argument (image editors, etc.) have one to read straight off the prompt.
fn user_message_with_media(user_text: &str, items: &[agentrt_domain::media::MediaHandle]) -> Message {
    if items.is_empty() {
        return Message::user(user_text);
    }
    let mut parts = vec![ContentPart::Text { text: user_text.to_string() }];
    for item in items {
        parts.push(ContentPart::Image { url: item.uri.clone(), media_type: Some(item.mime_type.clone()) });
    }
    Message { role: Role::User, content: MessageContent::Parts(parts) }
}

fn assistant_tool_call_message(text: &str, calls: &[ToolCall]) -> Message {
    let mut parts = Vec::new();
    if !text.is_empty() {
        parts.push(ContentPart::Text { text: text.to_string() });
    }
    for call in calls {
        parts.push(ContentPart::ToolUse { id: call.call_id.clone(), name: call.tool_name.clone(), input: call.arguments.clone() });
    }
    Message { role: Role::Assistant, content: MessageContent::Parts(parts) }
}

fn parse_tool_arguments(call_id: &str, tool_name: &str, args_str: &str) -> Value {
    if args_str.trim().is_empty() {
        return Value::Object(Default::default());
    }
    serde_json::from_str(args_str).unwrap_or_else(|e| {
        tracing::warn!(call_id, tool = tool_name, error = %e, "tool call arguments are not valid JSON, defaulting to an empty object");
        Value::Object(Default::default())
    })
}

fn collect_extracted_media(outcome: &ToolOutcome, image_urls: &mut Vec<String>, video_urls: &mut Vec<String>, music_urls: &mut Vec<String>) {
    for (key, urls) in [("imageUrls", &mut *image_urls), ("videoUrls", &mut *video_urls), ("musicUrls", &mut *music_urls)] {
        if let Some(values) = outcome.extra.get(key).and_then(Value::as_array) {
            urls.extend(values.iter().filter_map(Value::as_str).map(String::from));
        }
    }
}

fn events_to_messages(events: &[Event]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(events.len());
    for event in events {
        match &event.kind {
            EventKind::UserTurn { text } => messages.push(Message::user(text.clone())),
            EventKind::ModelText { text } => messages.push(Message::assistant(text.clone())),
            EventKind::ToolCall { call } => messages.push(Message {
                role: Role::Assistant,
                content: MessageContent::Parts(vec![ContentPart::ToolUse { id: call.call_id.clone(), name: call.tool_name.clone(), input: call.arguments.clone() }]),
            }),
            EventKind::ToolResult { call_id, content, status, .. } => messages.push(Message {
                role: Role::Tool,
                content: MessageContent::Parts(vec![ContentPart::ToolResult { tool_use_id: call_id.clone(), content: content.clone(), is_error: matches!(status, ToolResultStatus::Error) }]),
            }),
            EventKind::ModelThought { .. } | EventKind::SystemNotice { .. } => {}
        }
    }
    messages
}

/// Background, best-effort: ask the model to distill the completed
/// `(user, assistant)` turn into atomic long-term facts, then save each
/// independently so one bad extraction never loses the rest. Never surfaces
/// a failure to the caller — this runs after the turn's frames have
/// already been sent.
async fn extract_and_save_turn(caps: Arc<ToolCapabilities>, user_id: String, user_text: String, assistant_text: String) {
    if !caps.memory_bank_enabled || (user_text.trim().is_empty() && assistant_text.trim().is_empty()) {
        return;
    }
    let prompt = format!(
        "From this conversation turn, list any durable facts worth remembering long-term about the user (preferences, goals, identity details they state about themselves, even if the assistant never echoes them back). Reply with a JSON array of short strings, or [] if there is nothing worth keeping.\n\nUser: {user_text}\nAssistant: {assistant_text}"
    );
    let request = ChatRequest { messages: vec![Message::user(prompt)], json_mode: true, ..Default::default() };
    let facts: Vec<String> = match caps.llm.chat(None, request).await {
        Ok(response) => serde_json::from_str(&response.content).unwrap_or_default(),
        Err(e) => {
            tracing::warn!(user_id, error = %e, "memory extraction call failed, skipping auto-capture for this turn");
            return;
        }
    };
    if facts.is_empty() {
        return;
    }
    caps.memory.save_all(&user_id, facts).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentrt_domain::tenant::Tenant;
    use agentrt_tools::handlers::test_support::mock_capabilities;
    use std::time::Duration as StdDuration;

    fn runtime(sessions: Arc<SessionStore>) -> Arc<AgentRuntime> {
        let mut registry = ToolRegistry::new();
        agentrt_tools::handlers::text::register(&mut registry);
        let caps = agentrt_tools::handlers::test_support::mock_capabilities();
        Arc::new(AgentRuntime::new(
            sessions,
            Arc::new(registry),
            Arc::new(agentrt_sessions::EstimatingTokenCounter),
            Arc::new(CancelMap::new()),
            Arc::new(JobTracker::new(
                caps.document_db.clone(),
                caps.video_gen.clone(),
                caps.music_gen.clone(),
                StdDuration::from_secs(1_800),
            )),
            "You are a helpful assistant.".into(),
            30_000,
            StdDuration::from_secs(5),
        ))
    }

    #[tokio::test]
    async fn a_turn_with_no_tool_calls_produces_a_final_response_and_persists_history() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = Arc::new(SessionStore::new(dir.path()));
        let runtime = runtime(sessions.clone());
        let caps = mock_capabilities();
        let tenant = TenantContext::new(Tenant::new("b1", "u1"));

        let (_cancel, mut rx) = runtime.spawn_turn(AgentTurnRequest { caps, tenant: tenant.clone(), user_text: "say hi".into() });

        let mut saw_final = false;
        while let Some(frame) = rx.recv().await {
            if matches!(frame, Frame::FinalResponse { .. }) {
                saw_final = true;
            }
        }
        assert!(saw_final);

        let history = sessions.load(&tenant.session_key()).unwrap();
        assert!(history.iter().any(|e| matches!(e.kind, EventKind::UserTurn { .. })));
        assert!(history.iter().any(|e| matches!(e.kind, EventKind::ModelText { .. })));
    }

    #[tokio::test]
    async fn cancelling_before_the_turn_starts_streaming_appends_only_the_user_turn() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = Arc::new(SessionStore::new(dir.path()));
        let runtime = runtime(sessions.clone());
        let caps = mock_capabilities();
        let tenant = TenantContext::new(Tenant::new("b1", "u1"));
        let session_key = tenant.session_key();

        let (cancel, mut rx) = runtime.spawn_turn(AgentTurnRequest { caps, tenant, user_text: "say hi".into() });
        cancel.cancel();
        while rx.recv().await.is_some() {}

        let history = sessions.load(&session_key).unwrap();
        assert!(history.iter().any(|e| matches!(e.kind, EventKind::UserTurn { .. })));
        assert!(!history.iter().any(|e| matches!(e.kind, EventKind::ModelText { .. })));
    }
}
