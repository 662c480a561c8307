//! Google Gemini adapter (`generateContent` / `streamGenerateContent`).
//! Auth is an API key passed as the `key` query parameter.

use crate::llm::{ChatRequest, ChatResponse, EmbeddingsRequest, EmbeddingsResponse, LlmProvider};
use crate::sse::sse_response_stream;
use crate::util::{from_reqwest, resolve_api_key};
use agentrt_domain::capability::{LlmCapabilities, ToolSupport};
use agentrt_domain::config::ProviderConfig;
use agentrt_domain::error::{Error, Result};
use agentrt_domain::stream::{BoxStream, StreamEvent, Usage};
use agentrt_domain::tool::{ContentPart, Message, MessageContent, Role, ToolCall, ToolDefinition};
use serde_json::Value;

pub struct GoogleProvider {
    id: String,
    base_url: String,
    api_key: String,
    default_model: String,
    capabilities: LlmCapabilities,
    client: reqwest::Client,
}

impl GoogleProvider {
    pub fn from_config(cfg: &ProviderConfig) -> Result<Self> {
        let api_key = resolve_api_key(&cfg.auth)?;
        let default_model = cfg.default_model.clone().unwrap_or_else(|| "gemini-2.0-flash".into());
        let capabilities = LlmCapabilities {
            supports_tools: ToolSupport::Basic,
            supports_streaming: true,
            supports_json_mode: true,
            supports_vision: true,
            context_window_tokens: Some(1_000_000),
            max_output_tokens: Some(8_192),
        };
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| from_reqwest(&cfg.id, e))?;
        Ok(Self { id: cfg.id.clone(), base_url: cfg.base_url.trim_end_matches('/').to_string(), api_key, default_model, capabilities, client })
    }

    fn build_body(&self, req: &ChatRequest) -> Value {
        let mut contents = Vec::new();
        let mut system_instruction = None;
        for msg in &req.messages {
            match msg.role {
                Role::System => {
                    let text = msg.content.extract_all_text();
                    system_instruction = Some(serde_json::json!({ "parts": [{ "text": text }] }));
                }
                Role::User | Role::Tool => contents.push(serde_json::json!({
                    "role": "user",
                    "parts": parts_for(&msg.content),
                })),
                Role::Assistant => contents.push(serde_json::json!({
                    "role": "model",
                    "parts": parts_for(&msg.content),
                })),
            }
        }
        let mut body = serde_json::json!({ "contents": contents });
        if let Some(si) = system_instruction {
            body["systemInstruction"] = si;
        }
        let mut gen_config = serde_json::Map::new();
        if let Some(t) = req.temperature {
            gen_config.insert("temperature".into(), serde_json::json!(t));
        }
        if let Some(m) = req.max_tokens {
            gen_config.insert("maxOutputTokens".into(), serde_json::json!(m));
        }
        if req.json_mode {
            gen_config.insert("responseMimeType".into(), serde_json::json!("application/json"));
        }
        if !gen_config.is_empty() {
            body["generationConfig"] = Value::Object(gen_config);
        }
        if !req.tools.is_empty() {
            body["tools"] = serde_json::json!([{
                "functionDeclarations": req.tools.iter().map(|t| serde_json::json!({
                    "name": t.name, "description": t.description, "parameters": t.parameters,
                })).collect::<Vec<_>>(),
            }]);
        }
        body
    }

    fn model_name(&self, req: &ChatRequest) -> String {
        req.model.clone().unwrap_or_else(|| self.default_model.clone())
    }

    fn parse_response(&self, body: Value) -> Result<ChatResponse> {
        if let Some(err) = body.get("error") {
            return Err(Error::Provider {
                provider: self.id.clone(),
                message: err.get("message").and_then(|m| m.as_str()).unwrap_or("unknown error").to_string(),
                retriable: err.get("code").and_then(|c| c.as_i64()).map(|c| c >= 500 || c == 429).unwrap_or(false),
            });
        }
        let candidate = body.get("candidates").and_then(|c| c.as_array()).and_then(|a| a.first());
        let mut content = String::new();
        let mut tool_calls = Vec::new();
        if let Some(parts) = candidate.and_then(|c| c.get("content")).and_then(|c| c.get("parts")).and_then(|p| p.as_array()) {
            for (i, part) in parts.iter().enumerate() {
                if let Some(t) = part.get("text").and_then(|t| t.as_str()) {
                    content.push_str(t);
                }
                if let Some(fc) = part.get("functionCall") {
                    tool_calls.push(ToolCall {
                        call_id: format!("call_{i}"),
                        tool_name: fc.get("name").and_then(|n| n.as_str()).unwrap_or_default().to_string(),
                        arguments: fc.get("args").cloned().unwrap_or(Value::Null),
                    });
                }
            }
        }
        let finish_reason = candidate.and_then(|c| c.get("finishReason")).and_then(|f| f.as_str()).map(String::from);
        let usage = body.get("usageMetadata").map(|u| {
            let prompt = u.get("promptTokenCount").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
            let completion = u.get("candidatesTokenCount").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
            Usage { prompt_tokens: prompt, completion_tokens: completion, total_tokens: prompt + completion }
        });
        Ok(ChatResponse { content, tool_calls, usage, model: self.default_model.clone(), finish_reason })
    }
}

fn parts_for(content: &MessageContent) -> Vec<Value> {
    match content {
        MessageContent::Text(t) => vec![serde_json::json!({ "text": t })],
        MessageContent::Parts(parts) => parts.iter().map(|p| match p {
            ContentPart::Text { text } => serde_json::json!({ "text": text }),
            ContentPart::ToolUse { name, input, .. } => serde_json::json!({ "functionCall": { "name": name, "args": input } }),
            ContentPart::ToolResult { content, .. } => serde_json::json!({ "functionResponse": { "name": "tool", "response": { "content": content } } }),
            ContentPart::Image { url, media_type } => serde_json::json!({ "fileData": { "fileUri": url, "mimeType": media_type } }),
        }).collect(),
    }
}

#[async_trait::async_trait]
impl LlmProvider for GoogleProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        let model = self.model_name(req);
        let url = format!("{}/v1beta/models/{}:generateContent?key={}", self.base_url, model, self.api_key);
        let body = self.build_body(req);
        let resp = self.client.post(&url).json(&body).send().await.map_err(|e| from_reqwest(&self.id, e))?;
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
        let model = self.model_name(req);
        let url = format!("{}/v1beta/models/{}:streamGenerateContent?alt=sse&key={}", self.base_url, model, self.api_key);
        let body = self.build_body(req);
        let resp = self.client.post(&url).json(&body).send().await.map_err(|e| from_reqwest(&self.id, e))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Provider { provider: self.id.clone(), message: format!("HTTP {status}: {text}"), retriable: status.is_server_error() || status.as_u16() == 429 });
        }
        Ok(sse_response_stream(self.id.clone(), resp, parse_google_event))
    }

    async fn embeddings(&self, req: EmbeddingsRequest) -> Result<EmbeddingsResponse> {
        let model = req.model.unwrap_or_else(|| "text-embedding-004".into());
        let url = format!("{}/v1beta/models/{}:batchEmbedContents?key={}", self.base_url, model, self.api_key);
        let requests: Vec<Value> = req.input.iter().map(|t| serde_json::json!({
            "model": format!("models/{model}"),
            "content": { "parts": [{ "text": t }] },
        })).collect();
        let resp = self.client.post(&url).json(&serde_json::json!({ "requests": requests })).send().await.map_err(|e| from_reqwest(&self.id, e))?;
        let json: Value = resp.json().await.map_err(|e| from_reqwest(&self.id, e))?;
        let embeddings = json
            .get("embeddings")
            .and_then(|e| e.as_array())
            .map(|arr| arr.iter().map(|e| {
                e.get("values").and_then(|v| v.as_array()).map(|vals| vals.iter().filter_map(|f| f.as_f64().map(|f| f as f32)).collect()).unwrap_or_default()
            }).collect())
            .unwrap_or_default();
        Ok(EmbeddingsResponse { embeddings })
    }

    fn capabilities(&self) -> &LlmCapabilities { &self.capabilities }
    fn provider_id(&self) -> &str { &self.id }
}

fn parse_google_event(data: &str) -> Vec<Result<StreamEvent>> {
    let value: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(_) => return vec![],
    };
    let mut events = Vec::new();
    if let Some(parts) = value
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
    {
        for part in parts {
            if let Some(t) = part.get("text").and_then(|t| t.as_str()) {
                events.push(Ok(StreamEvent::Token { text: t.to_string() }));
            }
            if let Some(fc) = part.get("functionCall") {
                let name = fc.get("name").and_then(|n| n.as_str()).unwrap_or_default().to_string();
                let args = fc.get("args").cloned().unwrap_or(Value::Null);
                events.push(Ok(StreamEvent::ToolCallFinished { call_id: uuid::Uuid::new_v4().to_string(), tool_name: name, arguments: args }));
            }
        }
    }
    if let Some(finish) = value
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .and_then(|c| c.get("finishReason"))
        .and_then(|f| f.as_str())
    {
        let usage = value.get("usageMetadata").map(|u| Usage {
            prompt_tokens: u.get("promptTokenCount").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
            completion_tokens: u.get("candidatesTokenCount").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
            total_tokens: u.get("totalTokenCount").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        });
        events.push(Ok(StreamEvent::Done { usage, finish_reason: Some(finish.to_string()) }));
    }
    events
}
