//! Capability ports and concrete adapters: the LLM router plus every
//! other vendor-facing port the Agent Runtime calls through, and the
//! in-process defaults used when no external vendor is configured.

pub mod anthropic;
pub mod bedrock;
pub mod google;
pub mod http_fetch;
pub mod llm;
pub mod mock;
pub mod openai_compat;
pub mod ports;
pub mod registry;
pub mod router;
mod sse;
pub mod util;

pub use llm::{ChatRequest, ChatResponse, EmbeddingsRequest, EmbeddingsResponse, LlmProvider};
pub use ports::{
    DocumentDbPort, GeneratedMedia, GenerationParams, HttpFetchPort, ImageGenPort,
    MemoryProviderPort, MusicGenPort, ObjectStorePort, OpHandle, PollOutcome, RemoteFact,
    VectorDoc, VectorHit, VectorIndexPort, VideoGenPort, WebSearchPort, WebSearchResult,
};
pub use registry::{ProviderInitError, ProviderRegistry};
pub use router::LlmRouter;
