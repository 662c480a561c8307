//! In-process adapters for every non-LLM capability port.
//!
//! These back the gateway when no external vendor is configured and serve
//! as the deterministic test doubles for the rest of the workspace.

use crate::ports::{
    DocumentDbPort, GeneratedMedia, GenerationParams, ImageGenPort, MemoryProviderPort,
    MusicGenPort, ObjectStorePort, OpHandle, PollOutcome, RemoteFact, VectorDoc, VectorHit,
    VectorIndexPort, VideoGenPort, WebSearchPort,
};
use agentrt_domain::error::{Error, Result};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ── Object store ─────────────────────────────────────────────────────

/// Keeps blobs in memory, addressed by a `mem://<folder>/<id>` URI.
#[derive(Default)]
pub struct InMemoryObjectStore {
    blobs: RwLock<HashMap<String, (Vec<u8>, String)>>,
    counter: AtomicU64,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ObjectStorePort for InMemoryObjectStore {
    async fn put(&self, bytes: Vec<u8>, content_type: &str, folder: &str) -> Result<String> {
        let id = self.counter.fetch_add(1, Ordering::SeqCst);
        let uri = format!("mem://{folder}/{id}");
        self.blobs.write().insert(uri.clone(), (bytes, content_type.to_string()));
        Ok(uri)
    }

    async fn get(&self, uri: &str) -> Result<Vec<u8>> {
        self.blobs
            .read()
            .get(uri)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| Error::NotFound(format!("object '{uri}' not found")))
    }
}

// ── Document DB ──────────────────────────────────────────────────────

/// A JSON document store keyed by `(collection, doc_id)`. This is the
/// default backing for sessions/jobs/media-library/settings when no
/// external document database is configured.
#[derive(Default)]
pub struct InMemoryDocumentDb {
    collections: RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl InMemoryDocumentDb {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl DocumentDbPort for InMemoryDocumentDb {
    async fn put(&self, collection: &str, doc_id: &str, value: Value) -> Result<()> {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(doc_id.to_string(), value);
        Ok(())
    }

    async fn get(&self, collection: &str, doc_id: &str) -> Result<Option<Value>> {
        Ok(self.collections.read().get(collection).and_then(|c| c.get(doc_id).cloned()))
    }

    async fn delete(&self, collection: &str, doc_id: &str) -> Result<()> {
        if let Some(c) = self.collections.write().get_mut(collection) {
            c.remove(doc_id);
        }
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .map(|c| c.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }
}

// ── Vector index ─────────────────────────────────────────────────────

/// Simulates a remote vector index: `create_index` mints a
/// timestamp-suffixed backing name, and search scores by naive term
/// overlap rather than real embeddings.
#[derive(Default)]
pub struct InMemoryVectorIndex {
    indices: RwLock<HashMap<String, HashMap<String, VectorDoc>>>,
    next_suffix: AtomicU64,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn term_overlap_score(query: &str, text: &str) -> f32 {
        let q: Vec<&str> = query.to_lowercase().split_whitespace().collect();
        if q.is_empty() {
            return 0.0;
        }
        let text_lower = text.to_lowercase();
        let hits = q.iter().filter(|w| text_lower.contains(*w)).count();
        hits as f32 / q.len() as f32
    }
}

#[async_trait::async_trait]
impl VectorIndexPort for InMemoryVectorIndex {
    async fn create_index(&self, brand_id: &str) -> Result<String> {
        let suffix = self.next_suffix.fetch_add(1, Ordering::SeqCst);
        let backing = format!("momentum-media-{brand_id}-{suffix}");
        self.indices.write().insert(backing.clone(), HashMap::new());
        Ok(backing)
    }

    async fn delete_index(&self, backing_uri: &str) -> Result<()> {
        self.indices.write().remove(backing_uri);
        Ok(())
    }

    async fn get_index(&self, backing_uri: &str) -> Result<bool> {
        Ok(!self.indices.read().contains_key(backing_uri))
    }

    async fn upsert(&self, backing_uri: &str, docs: Vec<VectorDoc>) -> Result<()> {
        let mut indices = self.indices.write();
        let index = indices
            .get_mut(backing_uri)
            .ok_or_else(|| Error::NotFound(format!("vector index '{backing_uri}' not found")))?;
        for doc in docs {
            index.insert(doc.id.clone(), doc);
        }
        Ok(())
    }

    async fn search(&self, backing_uri: &str, query: &str, k: usize) -> Result<Vec<VectorHit>> {
        let indices = self.indices.read();
        let Some(index) = indices.get(backing_uri) else {
            return Ok(Vec::new());
        };
        let mut hits: Vec<VectorHit> = index
            .values()
            .map(|doc| VectorHit {
                id: doc.id.clone(),
                score: Self::term_overlap_score(query, &doc.text),
                metadata: doc.metadata.clone(),
            })
            .filter(|h| h.score > 0.0)
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }
}

// ── Long-term memory ─────────────────────────────────────────────────

/// Round-trips facts with resource names shaped like a real provider's
/// (`projects/p/locations/l/memories/{id}`), which exercises the factId
/// invariant the same way a real backend would.
#[derive(Default)]
pub struct InMemoryMemoryProvider {
    facts: RwLock<HashMap<String, HashMap<String, String>>>,
    project: String,
    location: String,
}

impl InMemoryMemoryProvider {
    pub fn new(project: impl Into<String>, location: impl Into<String>) -> Self {
        Self { facts: RwLock::default(), project: project.into(), location: location.into() }
    }
}

#[async_trait::async_trait]
impl MemoryProviderPort for InMemoryMemoryProvider {
    async fn append(&self, user_id: &str, fact_text: &str) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        self.facts.write().entry(user_id.to_string()).or_default().insert(id.clone(), fact_text.to_string());
        Ok(format!("projects/{}/locations/{}/memories/{}", self.project, self.location, id))
    }

    async fn search(&self, user_id: &str, query: &str) -> Result<Vec<RemoteFact>> {
        let query_lower = query.to_lowercase();
        Ok(self
            .facts
            .read()
            .get(user_id)
            .map(|facts| {
                facts
                    .values()
                    .filter(|text| query_lower.is_empty() || text.to_lowercase().contains(&query_lower))
                    .map(|text| RemoteFact { text: text.clone() })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete(&self, user_id: &str, remote_id: &str) -> Result<()> {
        let id = remote_id.rsplit('/').next().unwrap_or(remote_id);
        if let Some(facts) = self.facts.write().get_mut(user_id) {
            facts.remove(id);
        }
        // Deleting an already-absent fact is success, matching a real
        // provider's idempotent delete semantics.
        Ok(())
    }
}

// ── Web search ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryWebSearch;

#[async_trait::async_trait]
impl WebSearchPort for InMemoryWebSearch {
    async fn search(&self, query: &str) -> Result<Vec<crate::ports::WebSearchResult>> {
        Ok(vec![crate::ports::WebSearchResult {
            title: format!("Results for {query}"),
            url: "https://example.invalid/search".into(),
            snippet: "web search capability not configured for this deployment".into(),
        }])
    }
}

// ── Generators ───────────────────────────────────────────────────────

/// Deterministic stand-in generators: they mint a synthetic object-store URI
/// rather than calling a real diffusion/video/audio model, via an injected
/// [`ObjectStorePort`] so generated media is retrievable the same way real
/// provider output would be.
pub struct MockImageGen {
    store: Arc<dyn ObjectStorePort>,
}

impl MockImageGen {
    pub fn new(store: Arc<dyn ObjectStorePort>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl ImageGenPort for MockImageGen {
    async fn generate(&self, prompt: &str, _params: &GenerationParams) -> Result<GeneratedMedia> {
        let uri = self.store.put(prompt.as_bytes().to_vec(), "image/png", "generated/images").await?;
        Ok(GeneratedMedia { uri, mime_type: "image/png".into() })
    }
}

pub struct MockMusicGen {
    store: Arc<dyn ObjectStorePort>,
}

impl MockMusicGen {
    pub fn new(store: Arc<dyn ObjectStorePort>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl MusicGenPort for MockMusicGen {
    async fn generate(&self, prompt: &str, _params: &GenerationParams) -> Result<GeneratedMedia> {
        let uri = self.store.put(prompt.as_bytes().to_vec(), "audio/mpeg", "generated/music").await?;
        Ok(GeneratedMedia { uri, mime_type: "audio/mpeg".into() })
    }
}

/// Video generation is asynchronous in every real provider; this mock
/// completes on the second poll so callers exercise the `Pending` path.
pub struct MockVideoGen {
    store: Arc<dyn ObjectStorePort>,
    polls: RwLock<HashMap<String, u32>>,
}

impl MockVideoGen {
    pub fn new(store: Arc<dyn ObjectStorePort>) -> Self {
        Self { store, polls: RwLock::default() }
    }
}

#[async_trait::async_trait]
impl VideoGenPort for MockVideoGen {
    async fn start(&self, prompt: &str, _params: &GenerationParams) -> Result<OpHandle> {
        let id = uuid::Uuid::new_v4().to_string();
        self.polls.write().insert(id.clone(), 0);
        tracing::debug!(op_id = %id, prompt, "started mock video generation");
        Ok(OpHandle { id, provider: "mock-video".into() })
    }

    async fn poll(&self, op: &OpHandle) -> Result<PollOutcome> {
        let mut polls = self.polls.write();
        let count = polls.entry(op.id.clone()).or_insert(0);
        *count += 1;
        if *count < 2 {
            return Ok(PollOutcome::Pending);
        }
        drop(polls);
        let uri = self.store.put(op.id.as_bytes().to_vec(), "video/mp4", "generated/videos").await?;
        Ok(PollOutcome::Done(GeneratedMedia { uri, mime_type: "video/mp4".into() }))
    }
}

// ── LLM ──────────────────────────────────────────────────────────────

/// A canned [`LlmProvider`] used where a deployment has no configured
/// vendor credentials and by unit tests that exercise tool handlers
/// without a live model. Echoes the last user message as its completion
/// and never emits a tool call.
pub struct MockLlmProvider {
    id: String,
    capabilities: agentrt_domain::capability::LlmCapabilities,
}

impl MockLlmProvider {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            capabilities: agentrt_domain::capability::LlmCapabilities {
                supports_tools: agentrt_domain::capability::ToolSupport::Basic,
                supports_streaming: true,
                supports_json_mode: true,
                supports_vision: true,
                context_window_tokens: Some(128_000),
                max_output_tokens: Some(4_096),
            },
        }
    }
}

#[async_trait::async_trait]
impl crate::llm::LlmProvider for MockLlmProvider {
    async fn chat(&self, req: &crate::llm::ChatRequest) -> Result<crate::llm::ChatResponse> {
        let last_user = req
            .messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, agentrt_domain::tool::Role::User))
            .and_then(|m| m.content.text().map(String::from))
            .unwrap_or_default();
        Ok(crate::llm::ChatResponse {
            content: format!("mock response to: {last_user}"),
            tool_calls: Vec::new(),
            usage: None,
            model: "mock".into(),
            finish_reason: Some("stop".into()),
        })
    }

    async fn chat_stream(
        &self,
        req: &crate::llm::ChatRequest,
    ) -> Result<agentrt_domain::stream::BoxStream<'static, Result<agentrt_domain::stream::StreamEvent>>> {
        let resp = self.chat(req).await?;
        let events = vec![
            Ok(agentrt_domain::stream::StreamEvent::Token { text: resp.content }),
            Ok(agentrt_domain::stream::StreamEvent::Done { usage: None, finish_reason: resp.finish_reason }),
        ];
        Ok(Box::pin(futures_util::stream::iter(events)))
    }

    async fn embeddings(&self, req: crate::llm::EmbeddingsRequest) -> Result<crate::llm::EmbeddingsResponse> {
        Ok(crate::llm::EmbeddingsResponse { embeddings: req.input.iter().map(|_| vec![0.0_f32; 8]).collect() })
    }

    fn capabilities(&self) -> &agentrt_domain::capability::LlmCapabilities {
        &self.capabilities
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}
