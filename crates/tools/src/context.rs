//! Per-call context handed to every tool handler: the request's
//! [`TenantContext`] plus the capability ports and the memory/search
//! components a handler may need. Constructed once per gateway and
//! shared across requests; handlers never mutate it.

use std::sync::Arc;

use agentrt_capabilities::{
    DocumentDbPort, HttpFetchPort, ImageGenPort, MusicGenPort, ObjectStorePort, VideoGenPort,
    WebSearchPort,
};
use agentrt_capabilities::LlmRouter;
use agentrt_domain::config::SearchConfig;
use agentrt_domain::tenant::TenantContext;
use agentrt_memory::MemoryStore;
use agentrt_search::SearchIndexManager;

/// Every capability a tool handler can reach. Held by the gateway for the
/// lifetime of the process and shared (never mutated) across requests, the
/// same singleton discipline the tool registry itself follows.
pub struct ToolCapabilities {
    pub llm: Arc<LlmRouter>,
    pub image_gen: Arc<dyn ImageGenPort>,
    pub video_gen: Arc<dyn VideoGenPort>,
    pub music_gen: Arc<dyn MusicGenPort>,
    pub object_store: Arc<dyn ObjectStorePort>,
    pub document_db: Arc<dyn DocumentDbPort>,
    pub web_search: Arc<dyn WebSearchPort>,
    pub http_fetch: Arc<dyn HttpFetchPort>,
    pub search: Arc<SearchIndexManager>,
    pub memory: Arc<MemoryStore>,
    pub search_config: SearchConfig,
    pub memory_bank_enabled: bool,
}

/// Bundles one request's [`TenantContext`] with the shared
/// [`ToolCapabilities`] a handler dispatches through.
pub struct ToolContext {
    pub tenant: TenantContext,
    pub caps: Arc<ToolCapabilities>,
}

impl ToolContext {
    pub fn new(tenant: TenantContext, caps: Arc<ToolCapabilities>) -> Self {
        Self { tenant, caps }
    }

    pub fn brand_id(&self) -> &str {
        &self.tenant.tenant.brand_id
    }

    pub fn user_id(&self) -> &str {
        &self.tenant.tenant.user_id
    }
}
