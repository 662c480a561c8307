//! `AppState` construction, extracted from `main.rs` so the `serve` and
//! `doctor` CLI commands can share one boot path.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use agentrt_capabilities::mock::{
    InMemoryDocumentDb, InMemoryMemoryProvider, InMemoryObjectStore, InMemoryVectorIndex,
    InMemoryWebSearch, MockImageGen, MockLlmProvider, MockMusicGen, MockVideoGen,
};
use agentrt_capabilities::{http_fetch::HttpFetchAdapter, LlmProvider, LlmRouter, ProviderRegistry};
use agentrt_domain::config::Config;
use agentrt_memory::MemoryStore;
use agentrt_runtime::{AgentRuntime, CancelMap, JobTracker};
use agentrt_search::SearchIndexManager;
use agentrt_sessions::{EstimatingTokenCounter, SessionStore};
use agentrt_tools::ToolCapabilities;

use crate::state::AppState;

/// Validate config, initialize every subsystem, and return a fully-wired
/// [`AppState`]. Shared between the `serve` default and `doctor`.
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    let issues = config.validate();
    for issue in &issues {
        use agentrt_domain::config::ConfigSeverity;
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == agentrt_domain::config::ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues.iter().filter(|i| i.severity == agentrt_domain::config::ConfigSeverity::Error).count()
        );
    }

    // ── Session store ────────────────────────────────────────────────
    let state_dir = Path::new(&config.server.state_dir);
    std::fs::create_dir_all(state_dir).with_context(|| format!("creating session state dir {}", state_dir.display()))?;
    let sessions = Arc::new(SessionStore::new(state_dir));
    tracing::info!(path = %state_dir.display(), "session store ready");

    // ── Capability ports ─────────────────────────────────────────────
    // This workspace carries real LLM and HTTP-fetch adapters; every other
    // port runs an in-process default that behaves like a durable backend
    // until an external vendor is wired in.
    let object_store: Arc<dyn agentrt_capabilities::ObjectStorePort> = Arc::new(InMemoryObjectStore::new());
    let document_db: Arc<dyn agentrt_capabilities::DocumentDbPort> = Arc::new(InMemoryDocumentDb::new());
    let vector: Arc<dyn agentrt_capabilities::VectorIndexPort> = Arc::new(InMemoryVectorIndex::new());
    let memory_provider: Arc<dyn agentrt_capabilities::MemoryProviderPort> =
        Arc::new(InMemoryMemoryProvider::new(config.project.project_id.as_deref().unwrap_or("local"), &config.project.memory_location));

    let llm = Arc::new(build_llm_router(&config)?);
    if llm.registry().is_empty() {
        tracing::warn!("no LLM providers initialized, gateway will run in degraded mode with mock responses only");
    } else {
        tracing::info!(providers = llm.registry().len(), "LLM provider registry ready");
    }

    let search = Arc::new(SearchIndexManager::new(vector, document_db.clone(), config.search.clone()));
    let memory = Arc::new(MemoryStore::new(memory_provider, document_db.clone()));

    let caps = Arc::new(ToolCapabilities {
        llm: llm.clone(),
        image_gen: Arc::new(MockImageGen::new(object_store.clone())),
        video_gen: Arc::new(MockVideoGen::new(object_store.clone())),
        music_gen: Arc::new(MockMusicGen::new(object_store.clone())),
        object_store: object_store.clone(),
        document_db: document_db.clone(),
        web_search: Arc::new(InMemoryWebSearch),
        http_fetch: Arc::new(HttpFetchAdapter::new()),
        search: search.clone(),
        memory: memory.clone(),
        search_config: config.search.clone(),
        memory_bank_enabled: config.memory.enable_memory_bank,
    });
    tracing::info!(memory_bank_enabled = caps.memory_bank_enabled, "capability ports ready");

    // ── Tool registry ────────────────────────────────────────────────
    let tools = Arc::new(agentrt_tools::handlers::build_default_registry());
    tracing::info!(tool_count = tools.definitions().len(), "tool registry ready");

    // ── Job tracker ────────────────────────────────────────────
    let job_tracker = Arc::new(JobTracker::new(
        document_db,
        caps.video_gen.clone(),
        caps.music_gen.clone(),
        Duration::from_secs(config.server.job_max_duration_secs),
    ));

    // ── Agent runtime ────────────────────────────────────────
    let cancel_map = Arc::new(CancelMap::new());
    let runtime = Arc::new(AgentRuntime::new(
        sessions.clone(),
        tools.clone(),
        Arc::new(EstimatingTokenCounter) as Arc<dyn agentrt_sessions::TokenCounter>,
        cancel_map.clone(),
        job_tracker,
        default_system_instruction(),
        config.sessions.session_token_budget as u32,
        Duration::from_secs(config.server.tool_timeout_secs),
    ));
    tracing::info!("agent runtime ready");

    Ok(AppState {
        config,
        runtime,
        sessions,
        tools,
        caps,
        cancel_map,
        token_counter: Arc::new(EstimatingTokenCounter),
    })
}

/// Builds the LLM router from `[llm.providers]`. When none are configured
/// the gateway still boots, backed by a single deterministic mock provider
/// so `/agent/chat` remains exercisable without vendor credentials.
fn build_llm_router(config: &Config) -> anyhow::Result<LlmRouter> {
    if config.llm.providers.is_empty() {
        let mut providers: std::collections::HashMap<String, Arc<dyn LlmProvider>> = std::collections::HashMap::new();
        providers.insert("mock".into(), Arc::new(MockLlmProvider::new("mock")));
        let registry = ProviderRegistry::from_providers(providers, Some("mock".into()));
        return Ok(LlmRouter::with_registry(registry, "mock".into(), config.llm.default_timeout_ms, Vec::new()));
    }
    LlmRouter::from_config(&config.llm).context("initializing LLM providers")
}

fn default_system_instruction() -> String {
    "You are a capable, tool-using assistant operating on behalf of a brand. \
     Use the tools available to you to generate and manage media, search the \
     web, and recall what you know about the user before answering."
        .to_string()
}
