use serde::Serialize;

/// Structured trace events emitted across every crate in this workspace.
///
/// Each variant is logged as a single `tracing::info!` line carrying the
/// serialized event under `trace_event`, so aggregate behaviour (trim
/// frequency, index transitions, fallback rate) can be grepped out of plain
/// logs without a metrics backend.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    LlmRequest {
        provider: String,
        model: String,
        streaming: bool,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
    LlmFallback {
        from_provider: String,
        from_model: String,
        to_provider: String,
        to_model: String,
        reason: String,
    },
    SessionResolved {
        session_key: String,
        is_new: bool,
        event_count: usize,
    },
    SessionTrimmed {
        session_key: String,
        dropped_events: usize,
        remaining_events: usize,
        token_estimate_before: u64,
        token_estimate_after: u64,
    },
    TranscriptAppend {
        session_key: String,
        events: usize,
    },
    MediaResolved {
        session_key: String,
        method: String,
        confidence: f32,
        item_count: usize,
    },
    MemoryFactWritten {
        user_id: String,
        fact_id: String,
    },
    MemoryFactDeleted {
        user_id: String,
        fact_id: String,
        remote_delete_ok: bool,
    },
    IndexStateChanged {
        brand_id: String,
        from: String,
        to: String,
    },
    ReindexProgress {
        job_id: String,
        brand_id: String,
        progress: u8,
        processed: usize,
        total: usize,
    },
    JobTerminal {
        job_id: String,
        kind: String,
        state: String,
        message: Option<String>,
    },
    ToolDispatched {
        session_key: String,
        tool: String,
        ok: bool,
        duration_ms: u64,
    },
    QueryExpanded {
        original: String,
        variant_count: usize,
        degraded: bool,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "agent_runtime_event");
    }
}
