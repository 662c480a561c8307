//! `searchMediaLibrary` and `indexMediaItem`: the tool-facing surface of
//! the Search Index Manager and its backing `brands/{brandId}/media`
//! document collection.

use agentrt_capabilities::DocumentDbPort;
use agentrt_domain::media::{MediaKind, MediaLibraryItem, MediaSource};
use agentrt_domain::tool::ToolDefinition;
use agentrt_search::QueryExpander;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use crate::context::ToolContext;
use crate::registry::{ToolHandler, ToolRegistry};
use crate::result::ToolOutcome;

fn media_collection(brand_id: &str) -> String {
    format!("brands/{brand_id}/media")
}

pub fn register(registry: &mut ToolRegistry) {
    registry.register(
        ToolDefinition {
            name: "searchMediaLibrary".into(),
            description: "Search the brand's media library for items matching a text query.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"},
                    "limit": {"type": "integer", "description": "Maximum number of results, defaults to 5."}
                },
                "required": ["query"]
            }),
        },
        std::sync::Arc::new(SearchMediaLibrary),
    );

    registry.register(
        ToolDefinition {
            name: "indexMediaItem".into(),
            description: "Add or update a media library item and index it for search.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "mediaId": {"type": "string"},
                    "storageUri": {"type": "string"},
                    "kind": {"type": "string", "enum": ["image", "video", "audio", "pdf", "other"]},
                    "title": {"type": "string"},
                    "description": {"type": "string"},
                    "tags": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["mediaId", "storageUri", "kind", "title"]
            }),
        },
        std::sync::Arc::new(IndexMediaItem),
    );
}

async fn load_library(ctx: &ToolContext) -> Result<Vec<MediaLibraryItem>, String> {
    let docs = ctx
        .caps
        .document_db
        .list(&media_collection(ctx.brand_id()))
        .await
        .map_err(|e| e.to_string())?;
    Ok(docs.into_iter().filter_map(|(_, v)| serde_json::from_value(v).ok()).collect())
}

struct SearchMediaLibrary;

#[async_trait]
impl ToolHandler for SearchMediaLibrary {
    async fn call(&self, ctx: &ToolContext, args: Value) -> ToolOutcome {
        let Some(query) = args.get("query").and_then(Value::as_str) else {
            return ToolOutcome::error("searchMediaLibrary requires a 'query' string argument");
        };
        let limit = args.get("limit").and_then(Value::as_u64).unwrap_or(5) as usize;

        let items = match load_library(ctx).await {
            Ok(items) => items,
            Err(e) => return ToolOutcome::error(format!("searchMediaLibrary could not load the library: {e}")),
        };

        // C12: fan the query out across diverse, web-grounded rewrites
        // before searching, merging by each item's best score across variants.
        let expander = QueryExpander::new(
            &ctx.caps.llm,
            ctx.caps.web_search.as_ref(),
            ctx.caps.search_config.query_expander_k,
            ctx.caps.search_config.query_expander_deadline_ms,
        );
        let variants = expander.expand(query).await;

        match agentrt_search::search_with_variants(&ctx.caps.search, ctx.brand_id(), &variants, &items, limit).await {
            Ok(hits) => {
                if hits.is_empty() {
                    return ToolOutcome::success("No matching media items found.");
                }
                let content = hits.iter().map(|h| format!("- {} (score {:.2})", h.media_id, h.score)).collect::<Vec<_>>().join("\n");
                let results: Vec<Value> = hits.iter().map(|h| json!({"mediaId": h.media_id, "score": h.score})).collect();
                ToolOutcome::success(content).with_extra("results", json!(results))
            }
            Err(e) => ToolOutcome::error(format!("searchMediaLibrary failed: {e}")),
        }
    }
}

struct IndexMediaItem;

#[async_trait]
impl ToolHandler for IndexMediaItem {
    async fn call(&self, ctx: &ToolContext, args: Value) -> ToolOutcome {
        let (Some(media_id), Some(storage_uri), Some(kind_str), Some(title)) = (
            args.get("mediaId").and_then(Value::as_str),
            args.get("storageUri").and_then(Value::as_str),
            args.get("kind").and_then(Value::as_str),
            args.get("title").and_then(Value::as_str),
        ) else {
            return ToolOutcome::error("indexMediaItem requires 'mediaId', 'storageUri', 'kind', and 'title'");
        };
        let kind = match kind_str {
            "image" => MediaKind::Image,
            "video" => MediaKind::Video,
            "audio" => MediaKind::Audio,
            "pdf" => MediaKind::Pdf,
            _ => MediaKind::Other,
        };
        let description = args.get("description").and_then(Value::as_str).unwrap_or("").to_string();
        let tags: Vec<String> = args
            .get("tags")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default();

        let item = MediaLibraryItem {
            media_id: media_id.to_string(),
            brand_id: ctx.brand_id().to_string(),
            kind,
            storage_uri: storage_uri.to_string(),
            thumbnail_uri: None,
            title: title.to_string(),
            description,
            tags,
            source: MediaSource::Uploaded,
            created_at: Utc::now(),
            created_by: ctx.user_id().to_string(),
            vision_description: None,
            vision_keywords: None,
            vision_categories: None,
            enhanced_search_text: None,
        };

        let value = match serde_json::to_value(&item) {
            Ok(v) => v,
            Err(e) => return ToolOutcome::error(format!("indexMediaItem failed to serialize item: {e}")),
        };
        if let Err(e) = ctx.caps.document_db.put(&media_collection(ctx.brand_id()), media_id, value).await {
            return ToolOutcome::error(format!("indexMediaItem failed to store item: {e}"));
        }

        if ctx.caps.search_config.auto_index {
            if let Err(e) = ctx.caps.search.reindex(ctx.brand_id(), vec![item], None).await {
                tracing::warn!(media_id, error = %e, "indexMediaItem stored the item but immediate indexing failed; a later full reindex will pick it up");
            }
        }

        ToolOutcome::success(format!("Indexed media item '{media_id}'.")).with_extra("mediaId", json!(media_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::mock_capabilities;
    use agentrt_domain::tenant::{Tenant, TenantContext};

    #[tokio::test]
    async fn index_then_search_finds_the_item() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        let ctx = ToolContext::new(TenantContext::new(Tenant::new("b1", "u1")), mock_capabilities());

        let index_outcome = registry
            .dispatch(
                "indexMediaItem",
                json!({"mediaId": "m1", "storageUri": "mem://x", "kind": "image", "title": "a red sports car"}),
                &ctx,
                std::time::Duration::from_secs(5),
            )
            .await;
        assert!(!index_outcome.is_error());

        let search_outcome = registry
            .dispatch("searchMediaLibrary", json!({"query": "car"}), &ctx, std::time::Duration::from_secs(5))
            .await;
        assert!(!search_outcome.is_error());
        assert!(search_outcome.extra["results"].as_array().unwrap().iter().any(|r| r["mediaId"] == "m1"));
    }
}
