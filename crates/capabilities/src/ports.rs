//! Capability ports other than the LLM port: image/video/music
//! generation, object storage, the document DB, the vector index, long-term
//! memory, web search, and HTTP fetch. Each is a narrow async trait; the
//! rest of the core depends only on these, never on a concrete SDK.

use agentrt_domain::error::Result;
use async_trait::async_trait;
use serde_json::Value;

// ── Generators (image / video / music) ─────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    pub model: Option<String>,
    /// Input media URIs for edit/extend/interpolate/character-reference
    /// modes (image-to-video, edit-or-compose, frame interpolation).
    pub input_media: Vec<String>,
    pub extra: Value,
}

#[derive(Debug, Clone)]
pub struct GeneratedMedia {
    pub uri: String,
    pub mime_type: String,
}

/// A handle to an asynchronous, provider-hosted operation (video/music
/// generation, website crawl). Opaque to everything except the adapter that
/// issued it and the Long-Running Job Tracker that polls it.
#[derive(Debug, Clone)]
pub struct OpHandle {
    pub id: String,
    pub provider: String,
}

#[derive(Debug, Clone)]
pub enum PollOutcome {
    Pending,
    Done(GeneratedMedia),
    /// Dangling: a post-hoc verification should be attempted before this is
    /// treated as a real failure.
    Failed { message: String, dangling: bool },
}

#[async_trait]
pub trait ImageGenPort: Send + Sync {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<GeneratedMedia>;
}

#[async_trait]
pub trait VideoGenPort: Send + Sync {
    async fn start(&self, prompt: &str, params: &GenerationParams) -> Result<OpHandle>;
    async fn poll(&self, op: &OpHandle) -> Result<PollOutcome>;
}

#[async_trait]
pub trait MusicGenPort: Send + Sync {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<GeneratedMedia>;
}

// ── Object store ─────────────────────────────────────────────────────

#[async_trait]
pub trait ObjectStorePort: Send + Sync {
    async fn put(&self, bytes: Vec<u8>, content_type: &str, folder: &str) -> Result<String>;
    async fn get(&self, uri: &str) -> Result<Vec<u8>>;
}

// ── Document DB ──────────────────────────────────────────────────────

/// A hierarchical, per-tenant document store: `brands/{brandId}/media`,
/// `generationJobs/{jobId}`, `users/{userId}/memories/{factId}`, etc.
/// `collection` is the slash-joined path up to but not including the
/// document id.
#[async_trait]
pub trait DocumentDbPort: Send + Sync {
    async fn put(&self, collection: &str, doc_id: &str, value: Value) -> Result<()>;
    async fn get(&self, collection: &str, doc_id: &str) -> Result<Option<Value>>;
    async fn delete(&self, collection: &str, doc_id: &str) -> Result<()>;
    /// Shallow listing of every document in a collection.
    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>>;
}

// ── Vector index ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct VectorDoc {
    pub id: String,
    pub text: String,
    pub metadata: Value,
}

#[derive(Debug, Clone)]
pub struct VectorHit {
    pub id: String,
    pub score: f32,
    pub metadata: Value,
}

#[async_trait]
pub trait VectorIndexPort: Send + Sync {
    /// Returns the provider-assigned backing name, which may be
    /// timestamp-suffixed and differ from the canonical `brandId`.
    async fn create_index(&self, brand_id: &str) -> Result<String>;
    async fn delete_index(&self, backing_uri: &str) -> Result<()>;
    /// Post-delete verification: `true` means the index is confirmed absent.
    async fn get_index(&self, backing_uri: &str) -> Result<bool>;
    async fn upsert(&self, backing_uri: &str, docs: Vec<VectorDoc>) -> Result<()>;
    async fn search(&self, backing_uri: &str, query: &str, k: usize) -> Result<Vec<VectorHit>>;
}

// ── Long-term memory ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RemoteFact {
    pub text: String,
}

#[async_trait]
pub trait MemoryProviderPort: Send + Sync {
    /// Returns the full resource name (`remoteId`); its final `/`-segment
    /// becomes the local `factId`.
    async fn append(&self, user_id: &str, fact_text: &str) -> Result<String>;
    async fn search(&self, user_id: &str, query: &str) -> Result<Vec<RemoteFact>>;
    /// `Ok(())` covers both "deleted" and "already absent" — the caller
    /// (Memory Store) treats both as success.
    async fn delete(&self, user_id: &str, remote_id: &str) -> Result<()>;
}

// ── Web search ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WebSearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[async_trait]
pub trait WebSearchPort: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<WebSearchResult>>;
}

// ── HTTP fetch ───────────────────────────────────────────────────────

#[async_trait]
pub trait HttpFetchPort: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<(Vec<u8>, String)>;
}
