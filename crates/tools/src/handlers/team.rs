//! `createTeamEvent`: delegates to the configured LLM as a stand-in
//! "external collaborator" to synthesize a multi-post content plan, then
//! records it under `brands/{brandId}/teamEvents`.

use agentrt_capabilities::{ChatRequest, DocumentDbPort};
use agentrt_domain::tool::{Message, ToolDefinition};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::context::ToolContext;
use crate::registry::{ToolHandler, ToolRegistry};
use crate::result::ToolOutcome;

fn team_events_collection(brand_id: &str) -> String {
    format!("brands/{brand_id}/teamEvents")
}

pub fn register(registry: &mut ToolRegistry) {
    registry.register(
        ToolDefinition {
            name: "createTeamEvent".into(),
            description: "Draft a multi-post content plan for the team from a campaign brief.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "brief": {"type": "string", "description": "The campaign brief or goal to plan content around."},
                    "postCount": {"type": "integer", "description": "Number of posts to plan, defaults to 3."}
                },
                "required": ["brief"]
            }),
        },
        std::sync::Arc::new(CreateTeamEvent),
    );
}

struct CreateTeamEvent;

#[async_trait]
impl ToolHandler for CreateTeamEvent {
    async fn call(&self, ctx: &ToolContext, args: Value) -> ToolOutcome {
        let Some(brief) = args.get("brief").and_then(Value::as_str) else {
            return ToolOutcome::error("createTeamEvent requires a 'brief' string argument");
        };
        let post_count = args.get("postCount").and_then(Value::as_u64).unwrap_or(3);

        let team_context = ctx.tenant.team_context.as_ref().map(|v| v.to_string()).unwrap_or_default();
        let prompt = format!(
            "Draft a {post_count}-post content plan for this brief. For each post give a one-line hook and a short body.\n\nBrief: {brief}\nTeam context: {team_context}"
        );
        let request = ChatRequest { messages: vec![Message::user(prompt)], ..Default::default() };

        let plan = match ctx.caps.llm.chat(ctx.tenant.settings.text_model.as_deref(), request).await {
            Ok(response) => response.content,
            Err(e) => return ToolOutcome::error(format!("createTeamEvent failed to synthesize a plan: {e}")),
        };

        let event_id = Uuid::new_v4().to_string();
        let record = json!({
            "eventId": event_id,
            "brandId": ctx.brand_id(),
            "createdBy": ctx.user_id(),
            "brief": brief,
            "plan": plan,
            "createdAt": Utc::now().to_rfc3339(),
        });
        if let Err(e) = ctx.caps.document_db.put(&team_events_collection(ctx.brand_id()), &event_id, record).await {
            tracing::warn!(event_id, error = %e, "createTeamEvent synthesized a plan but failed to persist the team event record");
        }

        ToolOutcome::success(plan).with_extra("eventId", json!(event_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::mock_capabilities;
    use agentrt_domain::tenant::{Tenant, TenantContext};

    #[tokio::test]
    async fn creates_a_plan_and_persists_it() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        let ctx = ToolContext::new(TenantContext::new(Tenant::new("b1", "u1")), mock_capabilities());
        let outcome = registry
            .dispatch("createTeamEvent", json!({"brief": "launch the summer collection"}), &ctx, std::time::Duration::from_secs(5))
            .await;
        assert!(!outcome.is_error());
        let event_id = outcome.extra["eventId"].as_str().unwrap();
        let stored = ctx.caps.document_db.get(&team_events_collection("b1"), event_id).await.unwrap();
        assert!(stored.is_some());
    }
}
