//! `generateMusic`: unlike video, the mock/simple providers complete
//! synchronously, so this mirrors `generateImage` rather than `generateVideo`.

use agentrt_capabilities::GenerationParams;
use agentrt_domain::tool::ToolDefinition;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::ToolContext;
use crate::registry::{ToolHandler, ToolRegistry};
use crate::result::ToolOutcome;

pub fn register(registry: &mut ToolRegistry) {
    registry.register(
        ToolDefinition {
            name: "generateMusic".into(),
            description: "Generate a short music clip from a text prompt.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "prompt": {"type": "string", "description": "Description of the music to generate (mood, genre, instrumentation)."}
                },
                "required": ["prompt"]
            }),
        },
        std::sync::Arc::new(GenerateMusic),
    );
}

struct GenerateMusic;

#[async_trait]
impl ToolHandler for GenerateMusic {
    async fn call(&self, ctx: &ToolContext, args: Value) -> ToolOutcome {
        let Some(prompt) = args.get("prompt").and_then(Value::as_str) else {
            return ToolOutcome::error("generateMusic requires a 'prompt' string argument");
        };
        let params = GenerationParams { model: ctx.tenant.settings.music_model.clone(), ..Default::default() };
        match ctx.caps.music_gen.generate(prompt, &params).await {
            Ok(media) => ToolOutcome::media("music", media.uri, Vec::new(), "Music generated."),
            Err(e) => ToolOutcome::error(format!("generateMusic failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::mock_capabilities;
    use agentrt_domain::tenant::{Tenant, TenantContext};

    #[tokio::test]
    async fn generate_music_returns_singular_and_plural_urls() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        let ctx = ToolContext::new(TenantContext::new(Tenant::new("b1", "u1")), mock_capabilities());
        let outcome = registry
            .dispatch("generateMusic", json!({"prompt": "a calm piano loop"}), &ctx, std::time::Duration::from_secs(5))
            .await;
        assert!(!outcome.is_error());
        assert_eq!(outcome.extra["musicUrl"], outcome.extra["musicUrls"][0]);
    }
}
