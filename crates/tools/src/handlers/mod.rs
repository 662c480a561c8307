//! Canonical tool handlers and the registry that wires them all up.

pub mod documents;
pub mod image;
pub mod library;
pub mod memory;
pub mod music;
pub mod team;
pub mod text;
pub mod video;
pub mod vision;
pub mod web;

use std::sync::Arc;

use crate::registry::ToolRegistry;

/// Builds the registry with every canonical tool registered: `generateText`,
/// `generateImage`, `editOrComposeImage`, `generateVideo`, `generateMusic`,
/// `analyzeImage`, `webSearch`, `searchMediaLibrary`, `indexMediaItem`,
/// `queryBrandDocuments`, `crawlWebsite`, `processYoutubeVideo`,
/// `recallMemory`, `saveMemory`, `createTeamEvent`.
pub fn build_default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    text::register(&mut registry);
    image::register(&mut registry);
    video::register(&mut registry);
    music::register(&mut registry);
    vision::register(&mut registry);
    web::register(&mut registry);
    library::register(&mut registry);
    documents::register(&mut registry);
    memory::register(&mut registry);
    team::register(&mut registry);
    registry
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_support {
    use super::*;
    use crate::context::ToolCapabilities;
    use agentrt_capabilities::mock::{
        InMemoryDocumentDb, InMemoryMemoryProvider, InMemoryObjectStore, InMemoryVectorIndex,
        InMemoryWebSearch, MockImageGen, MockLlmProvider, MockMusicGen, MockVideoGen,
    };
    use agentrt_capabilities::{LlmProvider, LlmRouter, ProviderRegistry};
    use agentrt_domain::config::SearchConfig;
    use agentrt_memory::MemoryStore;
    use agentrt_search::SearchIndexManager;
    use std::collections::HashMap;

    pub fn mock_capabilities() -> Arc<ToolCapabilities> {
        let object_store: Arc<dyn agentrt_capabilities::ObjectStorePort> = Arc::new(InMemoryObjectStore::new());
        let document_db: Arc<dyn agentrt_capabilities::DocumentDbPort> = Arc::new(InMemoryDocumentDb::new());
        let vector: Arc<dyn agentrt_capabilities::VectorIndexPort> = Arc::new(InMemoryVectorIndex::new());
        let memory_provider: Arc<dyn agentrt_capabilities::MemoryProviderPort> =
            Arc::new(InMemoryMemoryProvider::new("proj", "us-west1"));
        let mut providers: HashMap<String, Arc<dyn LlmProvider>> = HashMap::new();
        providers.insert("mock".into(), Arc::new(MockLlmProvider::new("mock")));
        let registry = ProviderRegistry::from_providers(providers, Some("mock".into()));
        let llm = Arc::new(LlmRouter::with_registry(registry, "mock".into(), 5_000, Vec::new()));
        Arc::new(ToolCapabilities {
            llm: llm.clone(),
            image_gen: Arc::new(MockImageGen::new(object_store.clone())),
            video_gen: Arc::new(MockVideoGen::new(object_store.clone())),
            music_gen: Arc::new(MockMusicGen::new(object_store.clone())),
            object_store: object_store.clone(),
            document_db: document_db.clone(),
            web_search: Arc::new(InMemoryWebSearch),
            http_fetch: Arc::new(agentrt_capabilities::http_fetch::HttpFetchAdapter::new()),
            search: Arc::new(SearchIndexManager::new(vector, document_db.clone(), SearchConfig::default())),
            memory: Arc::new(MemoryStore::new(memory_provider, document_db)),
            search_config: SearchConfig::default(),
            memory_bank_enabled: true,
        })
    }

    /// Same fixture with `memory_bank_enabled` toggled, for the tool-gating test.
    pub fn mock_capabilities_with_memory_bank(enabled: bool) -> Arc<ToolCapabilities> {
        let caps = mock_capabilities();
        Arc::new(ToolCapabilities {
            llm: caps.llm.clone(),
            image_gen: caps.image_gen.clone(),
            video_gen: caps.video_gen.clone(),
            music_gen: caps.music_gen.clone(),
            object_store: caps.object_store.clone(),
            document_db: caps.document_db.clone(),
            web_search: caps.web_search.clone(),
            http_fetch: caps.http_fetch.clone(),
            search: caps.search.clone(),
            memory: caps.memory.clone(),
            search_config: caps.search_config.clone(),
            memory_bank_enabled: enabled,
        })
    }
}
