//! Generative Query Expander: produces up to K diverse rewrites of a
//! media-library search phrase via an auxiliary LLM call, degrading to the
//! original phrase alone on failure or deadline overrun.

use std::time::Duration;

use agentrt_capabilities::{ChatRequest, LlmRouter, WebSearchPort};
use agentrt_domain::tool::Message;
use agentrt_domain::trace::TraceEvent;

pub struct QueryExpander<'a> {
    router: &'a LlmRouter,
    web_search: &'a dyn WebSearchPort,
    k: usize,
    deadline_ms: u64,
}

impl<'a> QueryExpander<'a> {
    pub fn new(router: &'a LlmRouter, web_search: &'a dyn WebSearchPort, k: usize, deadline_ms: u64) -> Self {
        Self { router, web_search, k, deadline_ms }
    }

    /// Always returns at least `[original]`. Never fails the caller: any
    /// expansion error just degrades the result.
    pub async fn expand(&self, original: &str) -> Vec<String> {
        if self.k <= 1 {
            return vec![original.to_string()];
        }

        let grounding = self.ground(original).await;
        let prompt = if grounding.is_empty() {
            format!(
                "Rewrite this media search phrase into {} diverse alternative phrasings that preserve its meaning. \
                 Return one phrase per line, with no numbering or extra commentary.\n\nPhrase: {original}",
                self.k - 1
            )
        } else {
            format!(
                "Rewrite this media search phrase into {} diverse alternative phrasings that preserve its meaning, \
                 grounded in what these web results say the phrase actually refers to. \
                 Return one phrase per line, with no numbering or extra commentary.\n\n\
                 Phrase: {original}\n\nWeb context:\n{grounding}",
                self.k - 1
            )
        };
        let request = ChatRequest { messages: vec![Message::user(prompt)], ..Default::default() };

        let deadline = Duration::from_millis(self.deadline_ms);
        let result = tokio::time::timeout(deadline, self.router.chat(None, request)).await;

        let variants = match result {
            Ok(Ok(response)) => parse_variants(&response.content, self.k),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "query expansion failed, degrading to original phrase");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(deadline_ms = self.deadline_ms, "query expansion exceeded deadline, degrading to original phrase");
                Vec::new()
            }
        };

        let degraded = variants.is_empty();
        let mut all = vec![original.to_string()];
        all.extend(variants.into_iter().filter(|v| v != original));
        all.truncate(self.k);

        TraceEvent::QueryExpanded { original: original.to_string(), variant_count: all.len(), degraded }.emit();
        all
    }

    /// Best-effort web search used to ground the rewrite in real content
    /// rather than the phrase alone. A failure here never blocks
    /// expansion — it just falls back to the ungrounded prompt.
    async fn ground(&self, original: &str) -> String {
        let deadline = Duration::from_millis(self.deadline_ms);
        match tokio::time::timeout(deadline, self.web_search.search(original)).await {
            Ok(Ok(results)) => results
                .into_iter()
                .take(3)
                .map(|r| format!("- {}: {}", r.title, r.snippet))
                .collect::<Vec<_>>()
                .join("\n"),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "web-grounding search failed, expanding without grounding");
                String::new()
            }
            Err(_) => {
                tracing::warn!(deadline_ms = self.deadline_ms, "web-grounding search exceeded deadline, expanding without grounding");
                String::new()
            }
        }
    }
}

fn parse_variants(content: &str, k: usize) -> Vec<String> {
    content
        .lines()
        .map(|line| line.trim().trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == '-' || c == ')').trim())
        .filter(|line| !line.is_empty())
        .take(k.saturating_sub(1))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentrt_capabilities::mock::{InMemoryWebSearch, MockLlmProvider};
    use agentrt_capabilities::{LlmProvider, ProviderRegistry};
    use std::collections::HashMap;

    #[test]
    fn parse_variants_strips_numbering() {
        let content = "1. a red sports car\n2) blue automobile\n- a fast vehicle\n";
        let variants = parse_variants(content, 5);
        assert_eq!(variants, vec!["a red sports car", "blue automobile", "a fast vehicle"]);
    }

    #[test]
    fn parse_variants_respects_k() {
        let content = "a\nb\nc\nd\n";
        let variants = parse_variants(content, 3);
        assert_eq!(variants.len(), 2);
    }

    fn router() -> LlmRouter {
        let mut providers: HashMap<String, std::sync::Arc<dyn LlmProvider>> = HashMap::new();
        providers.insert("mock".into(), std::sync::Arc::new(MockLlmProvider::new("mock")));
        let registry = ProviderRegistry::from_providers(providers, Some("mock".into()));
        LlmRouter::with_registry(registry, "mock".into(), 5_000, Vec::new())
    }

    #[tokio::test]
    async fn expand_always_includes_the_original_phrase() {
        let router = router();
        let web_search = InMemoryWebSearch;
        let expander = QueryExpander::new(&router, &web_search, 5, 3_000);
        let variants = expander.expand("a red sports car").await;
        assert_eq!(variants[0], "a red sports car");
    }

    #[tokio::test]
    async fn k_of_one_skips_the_llm_call_entirely() {
        let router = router();
        let web_search = InMemoryWebSearch;
        let expander = QueryExpander::new(&router, &web_search, 1, 3_000);
        let variants = expander.expand("a red sports car").await;
        assert_eq!(variants, vec!["a red sports car"]);
    }
}
