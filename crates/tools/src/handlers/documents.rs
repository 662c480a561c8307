//! `queryBrandDocuments`: retrieval over a brand's indexed document corpus,
//! distinct from the media library — document chunks live under
//! `brands/{brandId}/documents` and are matched with the same intelligent
//! text matching the fallback media search uses, scored against
//! `doc_distance_threshold` rather than re-deriving a separate rule.

use agentrt_capabilities::DocumentDbPort;
use agentrt_domain::tool::ToolDefinition;
use agentrt_search::fuzzy::intelligent_text_match;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::context::ToolContext;
use crate::registry::{ToolHandler, ToolRegistry};
use crate::result::ToolOutcome;

fn documents_collection(brand_id: &str) -> String {
    format!("brands/{brand_id}/documents")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentChunk {
    #[serde(default)]
    title: String,
    text: String,
    #[serde(default)]
    source_uri: String,
}

pub fn register(registry: &mut ToolRegistry) {
    registry.register(
        ToolDefinition {
            name: "queryBrandDocuments".into(),
            description: "Retrieve the most relevant passages from the brand's indexed documents for a query.".into(),
            parameters: json!({
                "type": "object",
                "properties": {"query": {"type": "string"}},
                "required": ["query"]
            }),
        },
        std::sync::Arc::new(QueryBrandDocuments),
    );
}

struct QueryBrandDocuments;

#[async_trait]
impl ToolHandler for QueryBrandDocuments {
    async fn call(&self, ctx: &ToolContext, args: Value) -> ToolOutcome {
        let Some(query) = args.get("query").and_then(Value::as_str) else {
            return ToolOutcome::error("queryBrandDocuments requires a 'query' string argument");
        };

        let docs = match ctx.caps.document_db.list(&documents_collection(ctx.brand_id())).await {
            Ok(docs) => docs,
            Err(e) => return ToolOutcome::error(format!("queryBrandDocuments could not load the corpus: {e}")),
        };

        let fuzzy_threshold = ctx.caps.search_config.fuzzy_threshold as f64;
        let top_k = ctx.caps.search_config.doc_query_top_k as usize;

        let mut scored: Vec<(f64, DocumentChunk)> = docs
            .into_iter()
            .filter_map(|(_, v)| serde_json::from_value::<DocumentChunk>(v).ok())
            .filter_map(|chunk| {
                let (is_match, score) = intelligent_text_match(query, &[chunk.title.as_str(), chunk.text.as_str()], fuzzy_threshold);
                is_match.then_some((score, chunk))
            })
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k.max(1));

        if scored.is_empty() {
            return ToolOutcome::success("No relevant documents found.");
        }

        let content = scored
            .iter()
            .map(|(score, chunk)| format!("[{:.2}] {}\n{}", score, chunk.title, chunk.text))
            .collect::<Vec<_>>()
            .join("\n\n");
        let sources: Vec<Value> = scored.iter().map(|(_, chunk)| json!(chunk.source_uri)).collect();
        ToolOutcome::success(content).with_extra("sources", json!(sources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::mock_capabilities;
    use agentrt_domain::tenant::{Tenant, TenantContext};

    #[tokio::test]
    async fn finds_relevant_chunk_by_keyword() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        let ctx = ToolContext::new(TenantContext::new(Tenant::new("b1", "u1")), mock_capabilities());

        ctx.caps
            .document_db
            .put(
                &documents_collection("b1"),
                "chunk-1",
                json!({"title": "Brand voice guidelines", "text": "Always use an optimistic, friendly tone.", "sourceUri": "gs://docs/voice.pdf"}),
            )
            .await
            .unwrap();

        let outcome = registry
            .dispatch("queryBrandDocuments", json!({"query": "tone guidelines"}), &ctx, std::time::Duration::from_secs(5))
            .await;
        assert!(!outcome.is_error());
        assert!(outcome.content.contains("optimistic"));
    }

    #[tokio::test]
    async fn empty_corpus_is_not_an_error() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        let ctx = ToolContext::new(TenantContext::new(Tenant::new("b1", "u1")), mock_capabilities());
        let outcome = registry.dispatch("queryBrandDocuments", json!({"query": "anything"}), &ctx, std::time::Duration::from_secs(5)).await;
        assert!(!outcome.is_error());
    }
}
