//! `generateText`: a direct LLM completion tool, for when the agent wants
//! a sub-generation (e.g. drafting copy) without recursing through the
//! full reason/act loop.

use agentrt_capabilities::ChatRequest;
use agentrt_domain::tool::{Message, ToolDefinition};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::ToolContext;
use crate::registry::{ToolHandler, ToolRegistry};
use crate::result::ToolOutcome;

pub fn register(registry: &mut ToolRegistry) {
    registry.register(
        ToolDefinition {
            name: "generateText".into(),
            description: "Generate text from a prompt using the configured language model.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "prompt": {"type": "string", "description": "The instruction or question to send to the model."},
                    "systemInstruction": {"type": "string", "description": "Optional system instruction to steer the generation."}
                },
                "required": ["prompt"]
            }),
        },
        std::sync::Arc::new(GenerateText),
    );
}

struct GenerateText;

#[async_trait]
impl ToolHandler for GenerateText {
    async fn call(&self, ctx: &ToolContext, args: Value) -> ToolOutcome {
        let Some(prompt) = args.get("prompt").and_then(Value::as_str) else {
            return ToolOutcome::error("generateText requires a 'prompt' string argument");
        };

        let mut messages = Vec::new();
        if let Some(system) = args.get("systemInstruction").and_then(Value::as_str) {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(prompt));

        let model = ctx.tenant.settings.text_model.clone();
        let request = ChatRequest { messages, ..Default::default() };
        match ctx.caps.llm.chat(model.as_deref(), request).await {
            Ok(response) => ToolOutcome::success(response.content),
            Err(e) => ToolOutcome::error(format!("generateText failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::mock_capabilities;
    use agentrt_domain::tenant::{Tenant, TenantContext};

    #[tokio::test]
    async fn generates_text_from_prompt() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        let ctx = ToolContext::new(TenantContext::new(Tenant::new("b1", "u1")), mock_capabilities());
        let outcome = registry
            .dispatch("generateText", json!({"prompt": "say hi"}), &ctx, std::time::Duration::from_secs(5))
            .await;
        assert!(!outcome.is_error());
        assert!(outcome.content.contains("say hi"));
    }

    #[tokio::test]
    async fn missing_prompt_is_rejected_before_dispatch() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        let ctx = ToolContext::new(TenantContext::new(Tenant::new("b1", "u1")), mock_capabilities());
        let outcome = registry.dispatch("generateText", json!({}), &ctx, std::time::Duration::from_secs(5)).await;
        assert!(outcome.is_error());
    }
}
