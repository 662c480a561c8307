//! `generateVideo`: starts an asynchronous provider operation and hands
//! off tracking to the Long-Running Job Tracker rather than
//! blocking the tool call on completion.
//!
//! The handler's only responsibilities are: mint a [`Job`], start the
//! provider operation, and persist the pairing as a [`PendingOperation`]
//! under `generationJobs/{jobId}` so the tracker (which lives in the
//! runtime crate, never the other way around) can pick it up.

use agentrt_capabilities::{DocumentDbPort, GenerationParams};
use agentrt_domain::job::{Job, JobKind, PendingOperation};
use agentrt_domain::tool::ToolDefinition;
use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::context::ToolContext;
use crate::registry::{ToolHandler, ToolRegistry};
use crate::result::ToolOutcome;

const JOBS_COLLECTION: &str = "generationJobs";

pub fn register(registry: &mut ToolRegistry) {
    registry.register(
        ToolDefinition {
            name: "generateVideo".into(),
            description: "Start generating a video from a prompt. Supports text-to-video, image-to-video, frame interpolation, video extension, and character-reference modes depending on the arguments supplied.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "prompt": {"type": "string", "description": "Description of the video to generate."},
                    "inputMediaUrls": {"type": "array", "items": {"type": "string"}, "description": "Reference images/video for image-to-video, interpolation, extension, or character-reference modes."}
                },
                "required": ["prompt"]
            }),
        },
        std::sync::Arc::new(GenerateVideo),
    );
}

struct GenerateVideo;

#[async_trait]
impl ToolHandler for GenerateVideo {
    async fn call(&self, ctx: &ToolContext, args: Value) -> ToolOutcome {
        let Some(prompt) = args.get("prompt").and_then(Value::as_str) else {
            return ToolOutcome::error("generateVideo requires a 'prompt' string argument");
        };
        let input_media: Vec<String> = args
            .get("inputMediaUrls")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default();

        let params = GenerationParams { model: ctx.tenant.settings.video_model.clone(), input_media, ..Default::default() };
        let op = match ctx.caps.video_gen.start(prompt, &params).await {
            Ok(op) => op,
            Err(e) => return ToolOutcome::error(format!("generateVideo failed to start: {e}")),
        };

        let job_id = Uuid::new_v4().to_string();
        let job = Job::new(job_id.clone(), JobKind::VideoGen);
        let pending = PendingOperation { job, op_id: op.id.clone(), op_provider: op.provider.clone() };

        let value = match serde_json::to_value(&pending) {
            Ok(value) => value,
            Err(e) => return ToolOutcome::error(format!("generateVideo could not persist job state: {e}")),
        };
        if let Err(e) = ctx.caps.document_db.put(JOBS_COLLECTION, &job_id, value).await {
            return ToolOutcome::error(format!("generateVideo could not persist job state: {e}"));
        }

        ToolOutcome::success("Video generation started.").with_extra("jobId", json!(job_id)).with_extra("status", json!("processing"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::mock_capabilities;
    use agentrt_domain::tenant::{Tenant, TenantContext};

    #[tokio::test]
    async fn generate_video_returns_a_job_id() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        let ctx = ToolContext::new(TenantContext::new(Tenant::new("b1", "u1")), mock_capabilities());
        let outcome = registry
            .dispatch("generateVideo", json!({"prompt": "a drone shot of the coastline"}), &ctx, std::time::Duration::from_secs(5))
            .await;
        assert!(!outcome.is_error());
        assert!(outcome.extra.contains_key("jobId"));

        let job_id = outcome.extra["jobId"].as_str().unwrap();
        let stored = ctx.caps.document_db.get(JOBS_COLLECTION, job_id).await.unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn missing_prompt_is_rejected() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        let ctx = ToolContext::new(TenantContext::new(Tenant::new("b1", "u1")), mock_capabilities());
        let outcome = registry.dispatch("generateVideo", json!({}), &ctx, std::time::Duration::from_secs(5)).await;
        assert!(outcome.is_error());
    }
}
