//! Capability-driven LLM router: resolves a provider/model, retries
//! transient failures with exponential backoff, and falls back through
//! `LlmConfig.fallbacks` in order.

use crate::llm::{ChatRequest, ChatResponse, LlmProvider};
use crate::registry::ProviderRegistry;
use agentrt_domain::config::LlmConfig;
use agentrt_domain::error::{Error, Result};
use agentrt_domain::stream::{BoxStream, StreamEvent};
use agentrt_domain::trace::TraceEvent;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Maximum retry attempts for a single provider, with exponential backoff,
/// before moving to the next fallback candidate.
const MAX_RETRIES: u32 = 3;

pub struct LlmRouter {
    registry: ProviderRegistry,
    default_model: String,
    default_timeout_ms: u64,
    fallbacks: Vec<String>,
}

impl LlmRouter {
    pub fn from_config(llm_config: &LlmConfig) -> Result<Self> {
        let registry = ProviderRegistry::from_config(llm_config)?;
        Ok(Self {
            registry,
            default_model: llm_config.default_text_model.clone(),
            default_timeout_ms: llm_config.default_timeout_ms,
            fallbacks: llm_config.fallbacks.iter().map(|f| f.model.clone()).collect(),
        })
    }

    pub fn registry(&self) -> &ProviderRegistry { &self.registry }

    /// Builds a router directly around an already-constructed registry
    /// (e.g. [`ProviderRegistry::from_providers`] for the mock/no-credentials
    /// deployment), bypassing `LlmConfig`-driven provider instantiation.
    pub fn with_registry(registry: ProviderRegistry, default_model: String, default_timeout_ms: u64, fallbacks: Vec<String>) -> Self {
        Self { registry, default_model, default_timeout_ms, fallbacks }
    }

    /// Non-streaming chat for a given model override (falls back to the
    /// configured default, then to `LlmConfig.fallbacks` in order).
    pub async fn chat(&self, model_override: Option<&str>, req: ChatRequest) -> Result<ChatResponse> {
        let primary = model_override.map(String::from).unwrap_or_else(|| self.default_model.clone());
        let mut candidates = vec![primary];
        candidates.extend(self.fallbacks.clone());

        let mut last_err = None;
        for (idx, model_spec) in candidates.iter().enumerate() {
            let (provider_id, model_name) = split_model(model_spec);
            let Some(provider) = self.registry.get(provider_id) else {
                tracing::warn!(provider_id, "candidate provider not registered, skipping");
                continue;
            };
            if idx > 0 {
                TraceEvent::LlmFallback {
                    from_provider: candidates[0].clone(),
                    from_model: candidates[0].clone(),
                    to_provider: provider_id.to_string(),
                    to_model: model_name.to_string(),
                    reason: "primary model exhausted retries".into(),
                }
                .emit();
            }

            let mut req_for_provider = req.clone();
            req_for_provider.model = if model_name.is_empty() { None } else { Some(model_name.to_string()) };

            match self.try_with_retries(&provider, &req_for_provider).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    tracing::warn!(provider_id, model = model_name, error = %e, "candidate exhausted retries");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Provider {
            provider: "router".into(),
            message: "no LLM provider candidates were available".into(),
            retriable: false,
        }))
    }

    pub async fn chat_stream(&self, model_override: Option<&str>, req: ChatRequest) -> Result<BoxStream<'static, Result<StreamEvent>>> {
        let model_spec = model_override.map(String::from).unwrap_or_else(|| self.default_model.clone());
        let (provider_id, model_name) = split_model(&model_spec);
        let provider = self.registry.get(provider_id).ok_or_else(|| Error::Config(format!("provider '{provider_id}' not registered")))?;
        let mut req = req;
        req.model = if model_name.is_empty() { None } else { Some(model_name.to_string()) };
        let timeout = Duration::from_millis(self.default_timeout_ms);
        match tokio::time::timeout(timeout, provider.chat_stream(&req)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!("provider '{provider_id}' timed out opening stream after {}ms", self.default_timeout_ms))),
        }
    }

    async fn try_with_retries(&self, provider: &Arc<dyn LlmProvider>, req: &ChatRequest) -> Result<ChatResponse> {
        let timeout = Duration::from_millis(self.default_timeout_ms);
        let mut attempt = 0;
        loop {
            let start = Instant::now();
            let outcome = match tokio::time::timeout(timeout, provider.chat(req)).await {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout(format!("provider '{}' timed out after {}ms", provider.provider_id(), self.default_timeout_ms))),
            };
            let duration_ms = start.elapsed().as_millis() as u64;
            match outcome {
                Ok(resp) => {
                    TraceEvent::LlmRequest {
                        provider: provider.provider_id().to_string(),
                        model: resp.model.clone(),
                        streaming: false,
                        duration_ms,
                        prompt_tokens: resp.usage.as_ref().map(|u| u.prompt_tokens),
                        completion_tokens: resp.usage.as_ref().map(|u| u.completion_tokens),
                    }
                    .emit();
                    return Ok(resp);
                }
                Err(e) if e.is_retriable() && attempt < MAX_RETRIES => {
                    attempt += 1;
                    let backoff = Duration::from_millis(200 * 2u64.pow(attempt - 1));
                    tracing::warn!(provider = provider.provider_id(), attempt, backoff_ms = backoff.as_millis() as u64, error = %e, "retrying after transient failure");
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Split a `"provider_id/model_name"` string into its two components. If
/// there is no `/`, the whole string is the provider id and the provider's
/// own default model is used.
fn split_model(model_str: &str) -> (&str, &str) {
    match model_str.split_once('/') {
        Some((provider, model)) => (provider, model),
        None => (model_str, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_model_with_slash() {
        assert_eq!(split_model("anthropic/claude-sonnet-4-5"), ("anthropic", "claude-sonnet-4-5"));
    }

    #[test]
    fn split_model_without_slash() {
        assert_eq!(split_model("anthropic"), ("anthropic", ""));
    }
}
