//! `analyzeImage`: a vision-LLM description tool, routed through the same
//! [`LlmRouter`](agentrt_capabilities::LlmRouter) as `generateText` but with
//! an image content part attached to the prompt.

use agentrt_capabilities::ChatRequest;
use agentrt_domain::tool::{ContentPart, Message, MessageContent, Role, ToolDefinition};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::ToolContext;
use crate::registry::{ToolHandler, ToolRegistry};
use crate::result::ToolOutcome;

pub fn register(registry: &mut ToolRegistry) {
    registry.register(
        ToolDefinition {
            name: "analyzeImage".into(),
            description: "Describe or answer a question about an image using a vision-capable model.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "imageUrl": {"type": "string", "description": "URL of the image to analyze."},
                    "question": {"type": "string", "description": "What to look for or answer about the image. Defaults to a general description."}
                },
                "required": ["imageUrl"]
            }),
        },
        std::sync::Arc::new(AnalyzeImage),
    );
}

struct AnalyzeImage;

#[async_trait]
impl ToolHandler for AnalyzeImage {
    async fn call(&self, ctx: &ToolContext, args: Value) -> ToolOutcome {
        let Some(image_url) = args.get("imageUrl").and_then(Value::as_str) else {
            return ToolOutcome::error("analyzeImage requires an 'imageUrl' string argument");
        };
        let question = args.get("question").and_then(Value::as_str).unwrap_or("Describe this image in detail.");

        if !ctx.caps.llm.registry().default_provider().map(|p| p.capabilities().supports_vision).unwrap_or(false) {
            tracing::debug!("analyzeImage: configured provider does not advertise vision support, attempting anyway");
        }

        let message = Message {
            role: Role::User,
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: question.to_string() },
                ContentPart::Image { url: image_url.to_string(), media_type: None },
            ]),
        };
        let request = ChatRequest { messages: vec![message], ..Default::default() };
        match ctx.caps.llm.chat(ctx.tenant.settings.text_model.as_deref(), request).await {
            Ok(response) => ToolOutcome::success(response.content),
            Err(e) => ToolOutcome::error(format!("analyzeImage failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::mock_capabilities;
    use agentrt_domain::tenant::{Tenant, TenantContext};

    #[tokio::test]
    async fn analyze_image_requires_url() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        let ctx = ToolContext::new(TenantContext::new(Tenant::new("b1", "u1")), mock_capabilities());
        let outcome = registry.dispatch("analyzeImage", json!({}), &ctx, std::time::Duration::from_secs(5)).await;
        assert!(outcome.is_error());
    }

    #[tokio::test]
    async fn analyze_image_succeeds_with_mock_provider() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        let ctx = ToolContext::new(TenantContext::new(Tenant::new("b1", "u1")), mock_capabilities());
        let outcome = registry
            .dispatch("analyzeImage", json!({"imageUrl": "https://a/1.png"}), &ctx, std::time::Duration::from_secs(5))
            .await;
        assert!(!outcome.is_error());
    }
}
