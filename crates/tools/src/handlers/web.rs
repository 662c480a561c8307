//! `webSearch`, `crawlWebsite`, `processYoutubeVideo`: the three tools that
//! reach outside the tenant's own data, via [`WebSearchPort`] and
//! [`HttpFetchPort`].

use agentrt_domain::tool::ToolDefinition;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::ToolContext;
use crate::registry::{ToolHandler, ToolRegistry};
use crate::result::ToolOutcome;

const FETCH_PREVIEW_CHARS: usize = 8_000;

pub fn register(registry: &mut ToolRegistry) {
    registry.register(
        ToolDefinition {
            name: "webSearch".into(),
            description: "Search the web and return a list of matching pages.".into(),
            parameters: json!({
                "type": "object",
                "properties": {"query": {"type": "string"}},
                "required": ["query"]
            }),
        },
        std::sync::Arc::new(WebSearch),
    );

    registry.register(
        ToolDefinition {
            name: "crawlWebsite".into(),
            description: "Fetch a web page and return its text content.".into(),
            parameters: json!({
                "type": "object",
                "properties": {"url": {"type": "string"}},
                "required": ["url"]
            }),
        },
        std::sync::Arc::new(CrawlWebsite),
    );

    registry.register(
        ToolDefinition {
            name: "processYoutubeVideo".into(),
            description: "Fetch a YouTube video page for its available text content (title, description).".into(),
            parameters: json!({
                "type": "object",
                "properties": {"url": {"type": "string"}},
                "required": ["url"]
            }),
        },
        std::sync::Arc::new(ProcessYoutubeVideo),
    );
}

struct WebSearch;

#[async_trait]
impl ToolHandler for WebSearch {
    async fn call(&self, ctx: &ToolContext, args: Value) -> ToolOutcome {
        let Some(query) = args.get("query").and_then(Value::as_str) else {
            return ToolOutcome::error("webSearch requires a 'query' string argument");
        };
        match ctx.caps.web_search.search(query).await {
            Ok(results) => {
                let content = if results.is_empty() {
                    "No results found.".to_string()
                } else {
                    results.iter().map(|r| format!("- {} ({})\n  {}", r.title, r.url, r.snippet)).collect::<Vec<_>>().join("\n")
                };
                let urls: Vec<Value> = results.iter().map(|r| json!(r.url)).collect();
                ToolOutcome::success(content).with_extra("results", json!(urls))
            }
            Err(e) => ToolOutcome::error(format!("webSearch failed: {e}")),
        }
    }
}

struct CrawlWebsite;

#[async_trait]
impl ToolHandler for CrawlWebsite {
    async fn call(&self, ctx: &ToolContext, args: Value) -> ToolOutcome {
        let Some(url) = args.get("url").and_then(Value::as_str) else {
            return ToolOutcome::error("crawlWebsite requires a 'url' string argument");
        };
        fetch_as_text(ctx, url, "crawlWebsite").await
    }
}

struct ProcessYoutubeVideo;

#[async_trait]
impl ToolHandler for ProcessYoutubeVideo {
    async fn call(&self, ctx: &ToolContext, args: Value) -> ToolOutcome {
        let Some(url) = args.get("url").and_then(Value::as_str) else {
            return ToolOutcome::error("processYoutubeVideo requires a 'url' string argument");
        };
        // No dedicated transcript port is wired up; best-effort fetch of the
        // watch page's markup, same path as crawlWebsite.
        fetch_as_text(ctx, url, "processYoutubeVideo").await
    }
}

async fn fetch_as_text(ctx: &ToolContext, url: &str, tool_name: &str) -> ToolOutcome {
    match ctx.caps.http_fetch.fetch(url).await {
        Ok((bytes, content_type)) => {
            let text = String::from_utf8_lossy(&bytes);
            let truncated: String = text.chars().take(FETCH_PREVIEW_CHARS).collect();
            ToolOutcome::success(truncated).with_extra("contentType", json!(content_type)).with_extra("sourceUrl", json!(url))
        }
        Err(e) => ToolOutcome::error(format!("{tool_name} failed: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::mock_capabilities;
    use agentrt_domain::tenant::{Tenant, TenantContext};

    #[tokio::test]
    async fn web_search_returns_results() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        let ctx = ToolContext::new(TenantContext::new(Tenant::new("b1", "u1")), mock_capabilities());
        let outcome = registry.dispatch("webSearch", json!({"query": "rust async"}), &ctx, std::time::Duration::from_secs(5)).await;
        assert!(!outcome.is_error());
    }

    #[tokio::test]
    async fn crawl_website_requires_url() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        let ctx = ToolContext::new(TenantContext::new(Tenant::new("b1", "u1")), mock_capabilities());
        let outcome = registry.dispatch("crawlWebsite", json!({}), &ctx, std::time::Duration::from_secs(5)).await;
        assert!(outcome.is_error());
    }
}
