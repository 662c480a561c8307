//! The LLM Port: the capability the Agent Loop drives its
//! reason/act cycle over.

use agentrt_domain::capability::LlmCapabilities;
use agentrt_domain::error::Result;
use agentrt_domain::stream::{BoxStream, StreamEvent, Usage};
use agentrt_domain::tool::{Message, ToolCall, ToolDefinition};

/// A provider-agnostic chat completion request. Carries system instruction
/// and history as `messages`, the tool schemas the model may invoke, and
/// generation config; the model identifier may be overridden per call.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub json_mode: bool,
    pub model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<Usage>,
    pub model: String,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmbeddingsRequest {
    pub input: Vec<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmbeddingsResponse {
    pub embeddings: Vec<Vec<f32>>,
}

/// Trait every LLM adapter must implement. Fails with
/// `Error::Provider{retriable}` (rate-limit/timeout/5xx vs. 4xx),
/// `Error::Validation` (malformed request), or `Error::Timeout`
/// (context-window-exceeded is reported as a non-retriable `Provider` error
/// by adapters, since it is a property of the request, not transient state).
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse>;

    async fn chat_stream(&self, req: &ChatRequest) -> Result<BoxStream<'static, Result<StreamEvent>>>;

    async fn embeddings(&self, req: EmbeddingsRequest) -> Result<EmbeddingsResponse>;

    fn capabilities(&self) -> &LlmCapabilities;

    fn provider_id(&self) -> &str;
}
