//! The tool result envelope:
//!
//! ```text
//! { status: "success"|"error",
//!   content: <text/markdown for display>,
//!   message: <short summary>,
//!   … tool-specific fields … }
//! ```
//!
//! `content` is what the runtime surfaces to the caller; `message` exists
//! for backward compatibility. Image/video/music-producing tools must
//! return both a singular and a plural URL field, with the singular field
//! equal to the first element of the plural one — [`ToolOutcome::media`]
//! makes that structurally true rather than relying on each handler to get
//! it right.

use agentrt_domain::error::Error;
use serde::Serialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub status: ToolStatus,
    pub content: String,
    pub message: String,
    /// Tool-specific fields (imageUrl/imageUrls, jobId, etc.), merged
    /// alongside status/content/message at serialization.
    pub extra: Map<String, Value>,
}

impl ToolOutcome {
    pub fn success(content: impl Into<String>) -> Self {
        let content = content.into();
        Self { status: ToolStatus::Success, message: summarize(&content), content, extra: Map::new() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        Self { status: ToolStatus::Error, content: message.clone(), message, extra: Map::new() }
    }

    /// A singular/plural pair of URL fields for an image/video/music tool.
    /// `kind` is `"image"`, `"video"`, or `"music"`. The first URL is
    /// non-optional so `imageUrl == imageUrls[0]` holds by construction.
    pub fn media(kind: &str, first_url: String, mut rest: Vec<String>, content: impl Into<String>) -> Self {
        let mut urls = Vec::with_capacity(1 + rest.len());
        urls.push(first_url.clone());
        urls.append(&mut rest);
        let content = content.into();
        let mut outcome = Self::success(content);
        outcome.extra.insert(format!("{kind}Url"), json!(first_url));
        outcome.extra.insert(format!("{kind}Urls"), json!(urls));
        outcome
    }

    pub fn with_extra(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    pub fn to_json(&self) -> Value {
        let mut map = self.extra.clone();
        map.insert("status".into(), json!(match self.status { ToolStatus::Success => "success", ToolStatus::Error => "error" }));
        map.insert("content".into(), json!(self.content));
        map.insert("message".into(), json!(self.message));
        Value::Object(map)
    }

    pub fn is_error(&self) -> bool {
        self.status == ToolStatus::Error
    }
}

impl From<Error> for ToolOutcome {
    fn from(e: Error) -> Self {
        ToolOutcome::error(e.to_string())
    }
}

fn summarize(content: &str) -> String {
    const MAX: usize = 140;
    if content.len() <= MAX {
        content.to_string()
    } else {
        let mut cut = MAX;
        while !content.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}…", &content[..cut])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_singular_equals_first_plural_element() {
        let outcome = ToolOutcome::media("image", "https://a/1.png".into(), vec!["https://a/2.png".into()], "done");
        assert_eq!(outcome.extra["imageUrl"], json!("https://a/1.png"));
        assert_eq!(outcome.extra["imageUrls"][0], json!("https://a/1.png"));
        assert_eq!(outcome.extra["imageUrls"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn error_outcome_reports_error_status() {
        let outcome = ToolOutcome::error("missing argument 'prompt'");
        assert!(outcome.is_error());
        assert_eq!(outcome.to_json()["status"], json!("error"));
    }
}
