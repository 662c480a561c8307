//! AWS Bedrock stub adapter.
//!
//! Native Bedrock SigV4 auth requires the `aws-sigv4`/`aws-config` crates,
//! which this workspace does not pull in. The provider registers so the
//! `aws_bedrock` config kind is recognized, but every call returns an
//! actionable error pointing at Bedrock's OpenAI-compatible gateway, which
//! `OpenAiCompatProvider` already talks to.

use crate::llm::{ChatRequest, ChatResponse, EmbeddingsRequest, EmbeddingsResponse, LlmProvider};
use agentrt_domain::capability::LlmCapabilities;
use agentrt_domain::config::ProviderConfig;
use agentrt_domain::error::{Error, Result};
use agentrt_domain::stream::{BoxStream, StreamEvent};

const STUB_MSG: &str = "native AWS Bedrock SigV4 auth is not implemented; configure this \
provider with kind = \"openai_compat\" against Bedrock's OpenAI-compatible runtime endpoint instead";

pub struct BedrockProvider {
    id: String,
    capabilities: LlmCapabilities,
}

impl BedrockProvider {
    pub fn from_config(cfg: &ProviderConfig) -> Result<Self> {
        tracing::warn!(provider_id = %cfg.id, "AWS Bedrock provider registered as a stub");
        Ok(Self { id: cfg.id.clone(), capabilities: LlmCapabilities::default() })
    }

    fn stub_error(&self) -> Error {
        Error::Provider { provider: self.id.clone(), message: STUB_MSG.into(), retriable: false }
    }
}

#[async_trait::async_trait]
impl LlmProvider for BedrockProvider {
    async fn chat(&self, _req: &ChatRequest) -> Result<ChatResponse> {
        Err(self.stub_error())
    }

    async fn chat_stream(&self, _req: &ChatRequest) -> Result<BoxStream<'static, Result<StreamEvent>>> {
        Err(self.stub_error())
    }

    async fn embeddings(&self, _req: EmbeddingsRequest) -> Result<EmbeddingsResponse> {
        Err(self.stub_error())
    }

    fn capabilities(&self) -> &LlmCapabilities { &self.capabilities }
    fn provider_id(&self) -> &str { &self.id }
}
