//! Event Stream Encoder: newline-delimited JSON frames emitted by the
//! Agent Loop. Every frame is `{type, ...}`; the caller must flush
//! after each one so progress is visible in real time — encoding alone
//! can't guarantee that, so [`Frame::to_ndjson_line`] is the unit callers
//! write, and it is the writer's job to flush immediately after.

use agentrt_domain::media::MediaHandle;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Frame {
    #[serde(rename = "log")]
    Log { content: String },

    #[serde(rename = "thought")]
    Thought { content: String },

    #[serde(rename = "tool_call")]
    ToolCall { name: String, args: Value },

    #[serde(rename = "tool_result")]
    ToolResult {
        name: String,
        status: String,
        content: String,
        #[serde(flatten)]
        extra: serde_json::Map<String, Value>,
    },

    #[serde(rename = "text_delta")]
    TextDelta { delta: String },

    #[serde(rename = "context_update")]
    ContextUpdate {
        #[serde(rename = "tokenUsage")]
        token_usage: u32,
        #[serde(rename = "activeMedia")]
        active_media: Vec<MediaHandle>,
    },

    #[serde(rename = "final_response")]
    FinalResponse {
        content: String,
        #[serde(rename = "imageUrls", skip_serializing_if = "Option::is_none")]
        image_urls: Option<Vec<String>>,
        #[serde(rename = "videoUrls", skip_serializing_if = "Option::is_none")]
        video_urls: Option<Vec<String>>,
        #[serde(rename = "musicUrls", skip_serializing_if = "Option::is_none")]
        music_urls: Option<Vec<String>>,
    },

    #[serde(rename = "error")]
    Error { message: String },
}

impl Frame {
    /// One NDJSON line, newline included.
    pub fn to_ndjson_line(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"failed to encode frame: {e}"}}"#)
        });
        line.push('\n');
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_call_frame_serializes_name_and_args() {
        let frame = Frame::ToolCall { name: "generateImage".into(), args: json!({"prompt": "a cat"}) };
        let line = frame.to_ndjson_line();
        assert!(line.ends_with('\n'));
        let value: Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["type"], "tool_call");
        assert_eq!(value["name"], "generateImage");
    }

    #[test]
    fn final_response_omits_absent_media_fields() {
        let frame = Frame::FinalResponse { content: "done".into(), image_urls: None, video_urls: None, music_urls: None };
        let value: Value = serde_json::from_str(frame.to_ndjson_line().trim_end()).unwrap();
        assert!(value.get("imageUrls").is_none());
    }

    #[test]
    fn final_response_includes_present_media_fields() {
        let frame = Frame::FinalResponse {
            content: "done".into(),
            image_urls: Some(vec!["https://x/1.png".into()]),
            video_urls: None,
            music_urls: None,
        };
        let value: Value = serde_json::from_str(frame.to_ndjson_line().trim_end()).unwrap();
        assert_eq!(value["imageUrls"][0], "https://x/1.png");
    }
}
