//! `recallMemory` and `saveMemory`: the tool-facing surface of the Memory
//! Store. Disabled entirely when a tenant has memory bank support
//! turned off, per `memory_bank_enabled`.

use agentrt_domain::tool::ToolDefinition;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::ToolContext;
use crate::registry::{ToolHandler, ToolRegistry};
use crate::result::ToolOutcome;

pub fn register(registry: &mut ToolRegistry) {
    registry.register(
        ToolDefinition {
            name: "recallMemory".into(),
            description: "Recall previously saved long-term facts about the user matching a query.".into(),
            parameters: json!({
                "type": "object",
                "properties": {"query": {"type": "string"}},
                "required": ["query"]
            }),
        },
        std::sync::Arc::new(RecallMemory),
    );

    registry.register(
        ToolDefinition {
            name: "saveMemory".into(),
            description: "Save a new atomic fact about the user to long-term memory.".into(),
            parameters: json!({
                "type": "object",
                "properties": {"fact": {"type": "string"}},
                "required": ["fact"]
            }),
        },
        std::sync::Arc::new(SaveMemory),
    );
}

struct RecallMemory;

#[async_trait]
impl ToolHandler for RecallMemory {
    async fn call(&self, ctx: &ToolContext, args: Value) -> ToolOutcome {
        if !ctx.caps.memory_bank_enabled {
            return ToolOutcome::error("recallMemory is disabled for this tenant");
        }
        let Some(query) = args.get("query").and_then(Value::as_str) else {
            return ToolOutcome::error("recallMemory requires a 'query' string argument");
        };
        match ctx.caps.memory.recall(ctx.user_id(), query).await {
            Ok(facts) => {
                if facts.is_empty() {
                    return ToolOutcome::success("No matching memories found.");
                }
                let content = facts.iter().map(|f| format!("- {}", f.text)).collect::<Vec<_>>().join("\n");
                ToolOutcome::success(content)
            }
            Err(e) => ToolOutcome::error(format!("recallMemory failed: {e}")),
        }
    }
}

struct SaveMemory;

#[async_trait]
impl ToolHandler for SaveMemory {
    async fn call(&self, ctx: &ToolContext, args: Value) -> ToolOutcome {
        if !ctx.caps.memory_bank_enabled {
            return ToolOutcome::error("saveMemory is disabled for this tenant");
        }
        let Some(fact) = args.get("fact").and_then(Value::as_str) else {
            return ToolOutcome::error("saveMemory requires a 'fact' string argument");
        };
        match ctx.caps.memory.extract_and_save(ctx.user_id(), fact).await {
            Ok(saved) => ToolOutcome::success(format!("Saved: {}", saved.text)).with_extra("factId", json!(saved.fact_id)),
            Err(e) => ToolOutcome::error(format!("saveMemory failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::mock_capabilities;
    use agentrt_domain::tenant::{Tenant, TenantContext};

    #[tokio::test]
    async fn save_then_recall_round_trips() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        let ctx = ToolContext::new(TenantContext::new(Tenant::new("b1", "u1")), mock_capabilities());

        let save_outcome = registry
            .dispatch("saveMemory", json!({"fact": "prefers dark mode"}), &ctx, std::time::Duration::from_secs(5))
            .await;
        assert!(!save_outcome.is_error());
        assert!(save_outcome.extra.contains_key("factId"));

        let recall_outcome = registry
            .dispatch("recallMemory", json!({"query": "dark mode"}), &ctx, std::time::Duration::from_secs(5))
            .await;
        assert!(!recall_outcome.is_error());
        assert!(recall_outcome.content.contains("dark mode"));
    }

    #[tokio::test]
    async fn disabled_memory_bank_rejects_both_tools() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        let caps = crate::handlers::test_support::mock_capabilities_with_memory_bank(false);
        let ctx = ToolContext::new(TenantContext::new(Tenant::new("b1", "u1")), caps);
        let outcome = registry.dispatch("saveMemory", json!({"fact": "x"}), &ctx, std::time::Duration::from_secs(5)).await;
        assert!(outcome.is_error());
    }
}
