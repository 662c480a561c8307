//! The registry itself: named tools with typed schemas and handlers.
//! Validates argument presence before dispatch so a malformed call
//! never reaches a handler — it is answered with an error `toolResult` and
//! the loop continues.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use agentrt_domain::tool::ToolDefinition;
use async_trait::async_trait;
use serde_json::Value;

use crate::context::ToolContext;
use crate::result::ToolOutcome;

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, ctx: &ToolContext, args: Value) -> ToolOutcome;
}

struct RegisteredTool {
    definition: ToolDefinition,
    handler: Arc<dyn ToolHandler>,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: ToolDefinition, handler: Arc<dyn ToolHandler>) {
        self.tools.insert(definition.name.clone(), RegisteredTool { definition, handler });
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| t.definition.clone()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Validates `args` against the tool's schema, then dispatches with a bounded
    /// timeout. Never panics: an unknown tool, a schema violation, a
    /// handler timeout, or a handler error all become `ToolOutcome::error`.
    pub async fn dispatch(&self, name: &str, args: Value, ctx: &ToolContext, timeout: Duration) -> ToolOutcome {
        let Some(tool) = self.tools.get(name) else {
            return ToolOutcome::error(format!("unknown tool '{name}'"));
        };

        if let Err(missing) = validate_required(&tool.definition.parameters, &args) {
            return ToolOutcome::error(format!(
                "tool '{name}' call missing required argument(s): {}",
                missing.join(", ")
            ));
        }

        match tokio::time::timeout(timeout, tool.handler.call(ctx, args)).await {
            Ok(outcome) => outcome,
            Err(_) => ToolOutcome::error(format!("tool '{name}' timed out after {}s", timeout.as_secs())),
        }
    }
}

/// Checks that every key in the schema's top-level `required` array is
/// present in `args`. Returns the list of missing keys, or `Ok(())`.
fn validate_required(schema: &Value, args: &Value) -> Result<(), Vec<String>> {
    let Some(required) = schema.get("required").and_then(Value::as_array) else {
        return Ok(());
    };
    let missing: Vec<String> = required
        .iter()
        .filter_map(Value::as_str)
        .filter(|key| !args.get(key).is_some_and(|v| !v.is_null()))
        .map(String::from)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoHandler;

    #[async_trait]
    impl ToolHandler for EchoHandler {
        async fn call(&self, _ctx: &ToolContext, args: Value) -> ToolOutcome {
            ToolOutcome::success(args.to_string())
        }
    }

    fn schema() -> Value {
        json!({"type": "object", "properties": {"prompt": {"type": "string"}}, "required": ["prompt"]})
    }

    #[test]
    fn missing_required_field_is_detected() {
        let result = validate_required(&schema(), &json!({}));
        assert_eq!(result, Err(vec!["prompt".to_string()]));
    }

    #[test]
    fn present_required_field_passes() {
        assert!(validate_required(&schema(), &json!({"prompt": "hi"})).is_ok());
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error_outcome_not_a_panic() {
        let registry = ToolRegistry::new();
        let tenant = agentrt_domain::tenant::TenantContext::new(agentrt_domain::tenant::Tenant::new("b1", "u1"));
        let caps = crate::handlers::test_support::mock_capabilities();
        let ctx = ToolContext::new(tenant, caps);
        let outcome = registry.dispatch("nope", json!({}), &ctx, Duration::from_secs(1)).await;
        assert!(outcome.is_error());
    }

    #[tokio::test]
    async fn registered_tool_dispatches() {
        let mut registry = ToolRegistry::new();
        registry.register(
            ToolDefinition { name: "echo".into(), description: "echoes".into(), parameters: schema() },
            Arc::new(EchoHandler),
        );
        let tenant = agentrt_domain::tenant::TenantContext::new(agentrt_domain::tenant::Tenant::new("b1", "u1"));
        let caps = crate::handlers::test_support::mock_capabilities();
        let ctx = ToolContext::new(tenant, caps);
        let outcome = registry.dispatch("echo", json!({"prompt": "hi"}), &ctx, Duration::from_secs(1)).await;
        assert!(!outcome.is_error());
    }
}
