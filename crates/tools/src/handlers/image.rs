//! `generateImage` and `editOrComposeImage`: both drive the same
//! [`ImageGenPort`](agentrt_capabilities::ImageGenPort), differing only in
//! whether reference images are supplied.

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
            name: "generateImage".into(),
            description: "Generate a new image from a text prompt.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "prompt": {"type": "string", "description": "Description of the image to generate."}
                },
                "required": ["prompt"]
            }),
        },
        std::sync::Arc::new(GenerateImage),
    );

    registry.register(
        ToolDefinition {
            name: "editOrComposeImage".into(),
            description: "Edit or compose one or more existing images according to a prompt.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "prompt": {"type": "string", "description": "Instruction describing the edit or composition."},
                    "imageUrls": {"type": "array", "items": {"type": "string"}, "description": "Source image URLs to edit or compose."}
                },
                "required": ["prompt", "imageUrls"]
            }),
        },
        std::sync::Arc::new(EditOrComposeImage),
    );
}

struct GenerateImage;

#[async_trait]
impl ToolHandler for GenerateImage {
    async fn call(&self, ctx: &ToolContext, args: Value) -> ToolOutcome {
        let Some(prompt) = args.get("prompt").and_then(Value::as_str) else {
            return ToolOutcome::error("generateImage requires a 'prompt' string argument");
        };
        let params = GenerationParams { model: ctx.tenant.settings.image_model.clone(), ..Default::default() };
        match ctx.caps.image_gen.generate(prompt, &params).await {
            Ok(media) => ToolOutcome::media("image", media.uri, Vec::new(), "Image generated."),
            Err(e) => ToolOutcome::error(format!("generateImage failed: {e}")),
        }
    }
}

struct EditOrComposeImage;

#[async_trait]
impl ToolHandler for EditOrComposeImage {
    async fn call(&self, ctx: &ToolContext, args: Value) -> ToolOutcome {
        let Some(prompt) = args.get("prompt").and_then(Value::as_str) else {
            return ToolOutcome::error("editOrComposeImage requires a 'prompt' string argument");
        };
        let Some(urls) = args.get("imageUrls").and_then(Value::as_array) else {
            return ToolOutcome::error("editOrComposeImage requires an 'imageUrls' array argument");
        };
        let input_media: Vec<String> = urls.iter().filter_map(Value::as_str).map(String::from).collect();
        if input_media.is_empty() {
            return ToolOutcome::error("editOrComposeImage requires at least one usable entry in 'imageUrls'");
        }
        let params = GenerationParams { model: ctx.tenant.settings.image_model.clone(), input_media, ..Default::default() };
        match ctx.caps.image_gen.generate(prompt, &params).await {
            Ok(media) => ToolOutcome::media("image", media.uri, Vec::new(), "Image edited."),
            Err(e) => ToolOutcome::error(format!("editOrComposeImage failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::mock_capabilities;
    use agentrt_domain::tenant::{Tenant, TenantContext};

    #[tokio::test]
    async fn generate_image_returns_singular_and_plural_urls() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        let ctx = ToolContext::new(TenantContext::new(Tenant::new("b1", "u1")), mock_capabilities());
        let outcome = registry
            .dispatch("generateImage", json!({"prompt": "a red kite"}), &ctx, std::time::Duration::from_secs(5))
            .await;
        assert!(!outcome.is_error());
        assert_eq!(outcome.extra["imageUrl"], outcome.extra["imageUrls"][0]);
    }

    #[tokio::test]
    async fn edit_requires_image_urls() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        let ctx = ToolContext::new(TenantContext::new(Tenant::new("b1", "u1")), mock_capabilities());
        let outcome = registry
            .dispatch("editOrComposeImage", json!({"prompt": "brighten it", "imageUrls": []}), &ctx, std::time::Duration::from_secs(5))
            .await;
        assert!(outcome.is_error());
    }
}
