//! LLM provider registry: constructs and holds all configured provider
//! instances, resolving auth eagerly at startup.

use crate::anthropic::AnthropicProvider;
use crate::bedrock::BedrockProvider;
use crate::google::GoogleProvider;
use crate::llm::LlmProvider;
use crate::openai_compat::OpenAiCompatProvider;
use agentrt_domain::config::{LlmConfig, LlmStartupPolicy, ProviderKind};
use agentrt_domain::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Holds all instantiated LLM providers. When `startup_policy` is
/// `AllowNone`, init failures are recorded rather than aborting boot so the
/// readiness endpoint can report degraded capability ports without
/// failing request handling.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    default_provider: Option<String>,
    init_errors: Vec<ProviderInitError>,
}

#[derive(Debug, Clone)]
pub struct ProviderInitError {
    pub provider_id: String,
    pub kind: String,
    pub error: String,
}

impl ProviderRegistry {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let mut providers: HashMap<String, Arc<dyn LlmProvider>> = HashMap::new();
        let mut init_errors = Vec::new();

        for pc in &config.providers {
            let result: Result<Arc<dyn LlmProvider>> = match pc.kind {
                ProviderKind::OpenaiCompat => OpenAiCompatProvider::from_config(pc).map(|p| Arc::new(p) as Arc<dyn LlmProvider>),
                ProviderKind::Anthropic => AnthropicProvider::from_config(pc).map(|p| Arc::new(p) as Arc<dyn LlmProvider>),
                ProviderKind::Google => GoogleProvider::from_config(pc).map(|p| Arc::new(p) as Arc<dyn LlmProvider>),
                ProviderKind::AwsBedrock => BedrockProvider::from_config(pc).map(|p| Arc::new(p) as Arc<dyn LlmProvider>),
            };
            match result {
                Ok(provider) => {
                    tracing::info!(provider_id = %pc.id, kind = ?pc.kind, "registered LLM provider");
                    providers.insert(pc.id.clone(), provider);
                }
                Err(e) => {
                    tracing::warn!(provider_id = %pc.id, kind = ?pc.kind, error = %e, "failed to initialize LLM provider, skipping");
                    init_errors.push(ProviderInitError { provider_id: pc.id.clone(), kind: format!("{:?}", pc.kind), error: e.to_string() });
                }
            }
        }

        if providers.is_empty() && !config.providers.is_empty() && config.startup_policy == LlmStartupPolicy::RequireOne {
            return Err(Error::Config("all configured LLM providers failed to initialize (startup_policy = require_one)".into()));
        }
        if providers.is_empty() {
            tracing::warn!(failed_providers = init_errors.len(), "no LLM providers initialized; gateway will boot in degraded mode");
        }

        let default_provider = config.providers.first().map(|pc| pc.id.clone());
        Ok(Self { providers, default_provider, init_errors })
    }

    /// Builds a registry directly from already-constructed providers,
    /// bypassing config-driven instantiation. Used for the mock provider
    /// deployments run with no vendor credentials and by tests.
    pub fn from_providers(providers: HashMap<String, Arc<dyn LlmProvider>>, default_provider: Option<String>) -> Self {
        Self { providers, default_provider, init_errors: Vec::new() }
    }

    pub fn get(&self, provider_id: &str) -> Option<Arc<dyn LlmProvider>> {
        self.providers.get(provider_id).cloned()
    }

    pub fn default_provider(&self) -> Option<Arc<dyn LlmProvider>> {
        self.default_provider.as_ref().and_then(|id| self.get(id))
    }

    pub fn len(&self) -> usize { self.providers.len() }
    pub fn is_empty(&self) -> bool { self.providers.is_empty() }

    pub fn list_providers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.providers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn init_errors(&self) -> &[ProviderInitError] { &self.init_errors }
}
