//! Anthropic-native adapter (Messages API), including tool use and streaming.

use crate::llm::{ChatRequest, ChatResponse, EmbeddingsRequest, EmbeddingsResponse, LlmProvider};
use crate::sse::sse_response_stream;
use crate::util::{from_reqwest, resolve_api_key};
use agentrt_domain::capability::{LlmCapabilities, ToolSupport};
use agentrt_domain::config::ProviderConfig;
use agentrt_domain::error::{Error, Result};
use agentrt_domain::stream::{BoxStream, StreamEvent, Usage};
use agentrt_domain::tool::{ContentPart, Message, MessageContent, Role, ToolCall, ToolDefinition};
use serde_json::Value;

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    id: String,
    base_url: String,
    api_key: String,
    default_model: String,
    capabilities: LlmCapabilities,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn from_config(cfg: &ProviderConfig) -> Result<Self> {
        let api_key = resolve_api_key(&cfg.auth)?;
        let default_model = cfg
            .default_model
            .clone()
            .unwrap_or_else(|| "claude-sonnet-4-5".into());

        let capabilities = LlmCapabilities {
            supports_tools: ToolSupport::StrictJson,
            supports_streaming: true,
            supports_json_mode: false,
            supports_vision: true,
            context_window_tokens: Some(200_000),
            max_output_tokens: Some(8_192),
        };

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| from_reqwest(&cfg.id, e))?;

        Ok(Self {
            id: cfg.id.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            default_model,
            capabilities,
            client,
        })
    }

    fn authed_post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
    }

    fn build_body(&self, req: &ChatRequest, stream: bool) -> Value {
        let model = req.model.clone().unwrap_or_else(|| self.default_model.clone());

        let mut system_parts = Vec::new();
        let mut api_messages = Vec::new();
        for msg in &req.messages {
            match msg.role {
                Role::System => system_parts.push(msg.content.extract_all_text()),
                Role::User => api_messages.push(user_msg_to_anthropic(msg)),
                Role::Assistant => api_messages.push(assistant_msg_to_anthropic(msg)),
                Role::Tool => api_messages.push(tool_result_to_anthropic(msg)),
            }
        }

        let mut body = serde_json::json!({
            "model": model,
            "messages": api_messages,
            "stream": stream,
            "max_tokens": req.max_tokens.unwrap_or(4096),
        });
        if !system_parts.is_empty() {
            body["system"] = Value::String(system_parts.join("\n\n"));
        }
        if let Some(t) = req.temperature {
            body["temperature"] = serde_json::json!(t);
        }
        if !req.tools.is_empty() {
            body["tools"] = Value::Array(req.tools.iter().map(tool_def_to_anthropic).collect());
        }
        body
    }

    fn parse_response(&self, body: Value) -> Result<ChatResponse> {
        if let Some(err) = body.get("error") {
            return Err(Error::Provider {
                provider: self.id.clone(),
                message: err.get("message").and_then(|m| m.as_str()).unwrap_or("unknown error").to_string(),
                retriable: err.get("type").and_then(|t| t.as_str()) == Some("overloaded_error"),
            });
        }
        let model = body.get("model").and_then(|m| m.as_str()).unwrap_or_default().to_string();
        let mut content = String::new();
        let mut tool_calls = Vec::new();
        if let Some(blocks) = body.get("content").and_then(|c| c.as_array()) {
            for block in blocks {
                match block.get("type").and_then(|t| t.as_str()) {
                    Some("text") => {
                        if let Some(t) = block.get("text").and_then(|t| t.as_str()) {
                            content.push_str(t);
                        }
                    }
                    Some("tool_use") => {
                        tool_calls.push(ToolCall {
                            call_id: block.get("id").and_then(|i| i.as_str()).unwrap_or_default().to_string(),
                            tool_name: block.get("name").and_then(|n| n.as_str()).unwrap_or_default().to_string(),
                            arguments: block.get("input").cloned().unwrap_or(Value::Null),
                        });
                    }
                    _ => {}
                }
            }
        }
        let usage = body.get("usage").map(|u| {
            let input = u.get("input_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
            let output = u.get("output_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
            Usage { prompt_tokens: input, completion_tokens: output, total_tokens: input + output }
        });
        Ok(ChatResponse {
            content,
            tool_calls,
            usage,
            model,
            finish_reason: body.get("stop_reason").and_then(|s| s.as_str()).map(String::from),
        })
    }
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        let body = self.build_body(req, false);
        let resp = self
            .authed_post(&format!("{}/v1/messages", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| from_reqwest(&self.id, e))?;
        let status = resp.status();
        let json: Value = resp.json().await.map_err(|e| from_reqwest(&self.id, e))?;
        if !status.is_success() {
            return Err(Error::Provider {
                provider: self.id.clone(),
                message: json.get("error").and_then(|e| e.get("message")).and_then(|m| m.as_str()).unwrap_or("request failed").to_string(),
                retriable: status.is_server_error() || status.as_u16() == 429,
            });
        }
        self.parse_response(json)
    }

    async fn chat_stream(&self, req: &ChatRequest) -> Result<BoxStream<'static, Result<StreamEvent>>> {
        let body = self.build_body(req, true);
        let resp = self
            .authed_post(&format!("{}/v1/messages", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| from_reqwest(&self.id, e))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Provider {
                provider: self.id.clone(),
                message: format!("HTTP {status}: {text}"),
                retriable: status.is_server_error() || status.as_u16() == 429,
            });
        }
        let mut state = AnthropicStreamState::default();
        Ok(sse_response_stream(self.id.clone(), resp, move |data| parse_anthropic_event(data, &mut state)))
    }

    async fn embeddings(&self, _req: EmbeddingsRequest) -> Result<EmbeddingsResponse> {
        Err(Error::Provider {
            provider: self.id.clone(),
            message: "Anthropic does not expose an embeddings endpoint".into(),
            retriable: false,
        })
    }

    fn capabilities(&self) -> &LlmCapabilities {
        &self.capabilities
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}

#[derive(Default)]
struct AnthropicStreamState {
    current_tool_id: Option<String>,
    current_tool_name: Option<String>,
}

fn parse_anthropic_event(data: &str, state: &mut AnthropicStreamState) -> Vec<Result<StreamEvent>> {
    if data == "[DONE]" {
        return vec![Ok(StreamEvent::Done { usage: None, finish_reason: Some("stop".into()) })];
    }
    let value: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(_) => return vec![],
    };
    match value.get("type").and_then(|t| t.as_str()) {
        Some("content_block_start") => {
            if let Some(block) = value.get("content_block") {
                if block.get("type").and_then(|t| t.as_str()) == Some("tool_use") {
                    let id = block.get("id").and_then(|i| i.as_str()).unwrap_or_default().to_string();
                    let name = block.get("name").and_then(|n| n.as_str()).unwrap_or_default().to_string();
                    state.current_tool_id = Some(id.clone());
                    state.current_tool_name = Some(name.clone());
                    return vec![Ok(StreamEvent::ToolCallStarted { call_id: id, tool_name: name })];
                }
            }
            vec![]
        }
        Some("content_block_delta") => {
            if let Some(delta) = value.get("delta") {
                match delta.get("type").and_then(|t| t.as_str()) {
                    Some("text_delta") => {
                        let text = delta.get("text").and_then(|t| t.as_str()).unwrap_or_default().to_string();
                        return vec![Ok(StreamEvent::Token { text })];
                    }
                    Some("input_json_delta") => {
                        let partial = delta.get("partial_json").and_then(|t| t.as_str()).unwrap_or_default().to_string();
                        if let Some(id) = &state.current_tool_id {
                            return vec![Ok(StreamEvent::ToolCallDelta { call_id: id.clone(), delta: partial })];
                        }
                    }
                    _ => {}
                }
            }
            vec![]
        }
        Some("message_delta") => {
            let usage = value.get("usage").map(|u| Usage {
                prompt_tokens: 0,
                completion_tokens: u.get("output_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
                total_tokens: u.get("output_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
            });
            let finish_reason = value
                .get("delta")
                .and_then(|d| d.get("stop_reason"))
                .and_then(|s| s.as_str())
                .map(String::from);
            vec![Ok(StreamEvent::Done { usage, finish_reason })]
        }
        _ => vec![],
    }
}

fn tool_def_to_anthropic(def: &ToolDefinition) -> Value {
    serde_json::json!({
        "name": def.name,
        "description": def.description,
        "input_schema": def.parameters,
    })
}

fn user_msg_to_anthropic(msg: &Message) -> Value {
    match &msg.content {
        MessageContent::Text(t) => serde_json::json!({ "role": "user", "content": t }),
        MessageContent::Parts(parts) => serde_json::json!({
            "role": "user",
            "content": parts.iter().map(part_to_anthropic).collect::<Vec<_>>(),
        }),
    }
}

fn assistant_msg_to_anthropic(msg: &Message) -> Value {
    match &msg.content {
        MessageContent::Text(t) => serde_json::json!({ "role": "assistant", "content": t }),
        MessageContent::Parts(parts) => serde_json::json!({
            "role": "assistant",
            "content": parts.iter().map(part_to_anthropic).collect::<Vec<_>>(),
        }),
    }
}

fn tool_result_to_anthropic(msg: &Message) -> Value {
    let parts = match &msg.content {
        MessageContent::Parts(p) => p.clone(),
        MessageContent::Text(t) => vec![ContentPart::Text { text: t.clone() }],
    };
    serde_json::json!({
        "role": "user",
        "content": parts.iter().map(part_to_anthropic).collect::<Vec<_>>(),
    })
}

fn part_to_anthropic(part: &ContentPart) -> Value {
    match part {
        ContentPart::Text { text } => serde_json::json!({ "type": "text", "text": text }),
        ContentPart::ToolUse { id, name, input } => {
            serde_json::json!({ "type": "tool_use", "id": id, "name": name, "input": input })
        }
        ContentPart::ToolResult { tool_use_id, content, is_error } => serde_json::json!({
            "type": "tool_result",
            "tool_use_id": tool_use_id,
            "content": content,
            "is_error": is_error,
        }),
        ContentPart::Image { url, media_type } => serde_json::json!({
            "type": "image",
            "source": { "type": "url", "url": url, "media_type": media_type },
        }),
    }
}
