//! OpenAI-compatible adapter: works with OpenAI, Azure-style, Ollama, vLLM,
//! LM Studio, Together, and any endpoint following the chat-completions wire
//! format.

use crate::llm::{ChatRequest, ChatResponse, EmbeddingsRequest, EmbeddingsResponse, LlmProvider};
use crate::sse::sse_response_stream;
use crate::util::{from_reqwest, resolve_api_key};
use agentrt_domain::capability::{LlmCapabilities, ToolSupport};
use agentrt_domain::config::ProviderConfig;
use agentrt_domain::error::{Error, Result};
use agentrt_domain::stream::{BoxStream, StreamEvent, Usage};
use agentrt_domain::tool::{ContentPart, Message, MessageContent, Role, ToolCall, ToolDefinition};
use serde_json::Value;

pub struct OpenAiCompatProvider {
    id: String,
    base_url: String,
    api_key: String,
    auth_header: String,
    auth_prefix: String,
    default_model: String,
    capabilities: LlmCapabilities,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    pub fn from_config(cfg: &ProviderConfig) -> Result<Self> {
        let api_key = resolve_api_key(&cfg.auth)?;
        let auth_header = cfg.auth.header.clone().unwrap_or_else(|| "Authorization".into());
        let auth_prefix = cfg.auth.prefix.clone().unwrap_or_else(|| "Bearer ".into());
        let default_model = cfg.default_model.clone().unwrap_or_else(|| "gpt-4o-mini".into());
        let capabilities = LlmCapabilities {
            supports_tools: ToolSupport::Basic,
            supports_streaming: true,
            supports_json_mode: true,
            supports_vision: true,
            context_window_tokens: Some(128_000),
            max_output_tokens: Some(16_384),
        };
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| from_reqwest(&cfg.id, e))?;
        Ok(Self { id: cfg.id.clone(), base_url: cfg.base_url.trim_end_matches('/').to_string(), api_key, auth_header, auth_prefix, default_model, capabilities, client })
    }

    fn authed_post(&self, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(url).header("Content-Type", "application/json");
        if !self.api_key.is_empty() {
            builder = builder.header(self.auth_header.as_str(), format!("{}{}", self.auth_prefix, self.api_key));
        }
        builder
    }

    fn build_body(&self, req: &ChatRequest, stream: bool) -> Value {
        let model = req.model.clone().unwrap_or_else(|| self.default_model.clone());
        let messages: Vec<Value> = req.messages.iter().map(message_to_openai).collect();
        let mut body = serde_json::json!({ "model": model, "messages": messages, "stream": stream });
        if let Some(t) = req.temperature {
            body["temperature"] = serde_json::json!(t);
        }
        if let Some(m) = req.max_tokens {
            body["max_tokens"] = serde_json::json!(m);
        }
        if req.json_mode {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }
        if !req.tools.is_empty() {
            body["tools"] = Value::Array(req.tools.iter().map(tool_def_to_openai).collect());
        }
        body
    }

    fn parse_response(&self, body: Value) -> Result<ChatResponse> {
        if let Some(err) = body.get("error") {
            return Err(Error::Provider {
                provider: self.id.clone(),
                message: err.get("message").and_then(|m| m.as_str()).unwrap_or("unknown error").to_string(),
                retriable: err.get("type").and_then(|t| t.as_str()).map(|t| t.contains("rate_limit") || t.contains("server_error")).unwrap_or(false),
            });
        }
        let choice = body.get("choices").and_then(|c| c.as_array()).and_then(|a| a.first());
        let message = choice.and_then(|c| c.get("message"));
        let content = message.and_then(|m| m.get("content")).and_then(|c| c.as_str()).unwrap_or_default().to_string();
        let tool_calls = message
            .and_then(|m| m.get("tool_calls"))
            .and_then(|tc| tc.as_array())
            .map(|arr| arr.iter().filter_map(|tc| {
                let id = tc.get("id").and_then(|i| i.as_str())?.to_string();
                let f = tc.get("function")?;
                let name = f.get("name").and_then(|n| n.as_str())?.to_string();
                let args_str = f.get("arguments").and_then(|a| a.as_str()).unwrap_or("{}");
                let arguments = serde_json::from_str(args_str).unwrap_or(Value::Null);
                Some(ToolCall { call_id: id, tool_name: name, arguments })
            }).collect())
            .unwrap_or_default();
        let usage = body.get("usage").map(|u| Usage {
            prompt_tokens: u.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
            completion_tokens: u.get("completion_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
            total_tokens: u.get("total_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        });
        Ok(ChatResponse {
            content,
            tool_calls,
            usage,
            model: body.get("model").and_then(|m| m.as_str()).unwrap_or_default().to_string(),
            finish_reason: choice.and_then(|c| c.get("finish_reason")).and_then(|f| f.as_str()).map(String::from),
        })
    }
}

fn message_to_openai(msg: &Message) -> Value {
    let role = match msg.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };
    let content = match &msg.content {
        MessageContent::Text(t) => Value::String(t.clone()),
        MessageContent::Parts(parts) if parts.iter().any(|p| matches!(p, ContentPart::Image { .. })) => {
            Value::Array(parts.iter().map(|p| match p {
                ContentPart::Text { text } => serde_json::json!({ "type": "text", "text": text }),
                ContentPart::Image { url, .. } => serde_json::json!({ "type": "image_url", "image_url": { "url": url } }),
                _ => serde_json::json!({ "type": "text", "text": "" }),
            }).collect())
        }
        MessageContent::Parts(_) => Value::String(msg.content.extract_all_text()),
    };
    serde_json::json!({ "role": role, "content": content })
}

fn tool_def_to_openai(def: &ToolDefinition) -> Value {
    serde_json::json!({
        "type": "function",
        "function": { "name": def.name, "description": def.description, "parameters": def.parameters },
    })
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiCompatProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        let body = self.build_body(req, false);
        let resp = self.authed_post(&format!("{}/chat/completions", self.base_url)).json(&body).send().await.map_err(|e| from_reqwest(&self.id, e))?;
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
        let resp = self.authed_post(&format!("{}/chat/completions", self.base_url)).json(&body).send().await.map_err(|e| from_reqwest(&self.id, e))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Provider { provider: self.id.clone(), message: format!("HTTP {status}: {text}"), retriable: status.is_server_error() || status.as_u16() == 429 });
        }
        let mut tool_calls: Vec<Option<(String, String, String)>> = Vec::new();
        Ok(sse_response_stream(self.id.clone(), resp, move |data| parse_openai_event(data, &mut tool_calls)))
    }

    async fn embeddings(&self, req: EmbeddingsRequest) -> Result<EmbeddingsResponse> {
        let model = req.model.unwrap_or_else(|| "text-embedding-3-small".into());
        let body = serde_json::json!({ "model": model, "input": req.input });
        let resp = self.authed_post(&format!("{}/embeddings", self.base_url)).json(&body).send().await.map_err(|e| from_reqwest(&self.id, e))?;
        let json: Value = resp.json().await.map_err(|e| from_reqwest(&self.id, e))?;
        let embeddings = json.get("data").and_then(|d| d.as_array()).map(|arr| arr.iter().map(|e| {
            e.get("embedding").and_then(|v| v.as_array()).map(|vals| vals.iter().filter_map(|f| f.as_f64().map(|f| f as f32)).collect()).unwrap_or_default()
        }).collect()).unwrap_or_default();
        Ok(EmbeddingsResponse { embeddings })
    }

    fn capabilities(&self) -> &LlmCapabilities { &self.capabilities }
    fn provider_id(&self) -> &str { &self.id }
}

fn parse_openai_event(data: &str, tool_calls: &mut Vec<Option<(String, String, String)>>) -> Vec<Result<StreamEvent>> {
    if data == "[DONE]" {
        return vec![Ok(StreamEvent::Done { usage: None, finish_reason: Some("stop".into()) })];
    }
    let value: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(_) => return vec![],
    };
    let mut events = Vec::new();
    if let Some(choice) = value.get("choices").and_then(|c| c.as_array()).and_then(|a| a.first()) {
        if let Some(delta) = choice.get("delta") {
            if let Some(text) = delta.get("content").and_then(|c| c.as_str()) {
                events.push(Ok(StreamEvent::Token { text: text.to_string() }));
            }
            if let Some(tcs) = delta.get("tool_calls").and_then(|t| t.as_array()) {
                for tc in tcs {
                    let idx = tc.get("index").and_then(|i| i.as_u64()).unwrap_or(0) as usize;
                    while tool_calls.len() <= idx {
                        tool_calls.push(None);
                    }
                    let entry = tool_calls[idx].get_or_insert_with(|| (String::new(), String::new(), String::new()));
                    if let Some(id) = tc.get("id").and_then(|i| i.as_str()) {
                        entry.0 = id.to_string();
                    }
                    if let Some(f) = tc.get("function") {
                        if let Some(name) = f.get("name").and_then(|n| n.as_str()) {
                            entry.1 = name.to_string();
                        }
                        if let Some(args) = f.get("arguments").and_then(|a| a.as_str()) {
                            entry.2.push_str(args);
                        }
                    }
                }
            }
        }
        if let Some(finish) = choice.get("finish_reason").and_then(|f| f.as_str()) {
            for entry in tool_calls.iter().flatten() {
                let arguments = serde_json::from_str(&entry.2).unwrap_or(Value::Null);
                events.push(Ok(StreamEvent::ToolCallFinished { call_id: entry.0.clone(), tool_name: entry.1.clone(), arguments }));
            }
            let usage = value.get("usage").map(|u| Usage {
                prompt_tokens: u.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
                completion_tokens: u.get("completion_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
                total_tokens: u.get("total_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
            });
            events.push(Ok(StreamEvent::Done { usage, finish_reason: Some(finish.to_string()) }));
        }
    }
    events
}
