use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tool::ToolCall;

/// One entry in a session's append-only event log. Events form the sole
/// durable record of a conversation: ordinals are strictly increasing and
/// contiguous, and an event is never rewritten once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub ordinal: u64,
    pub author: EventAuthor,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAuthor {
    User,
    Model,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    UserTurn {
        text: String,
    },
    ModelThought {
        text: String,
    },
    ToolCall {
        call: ToolCall,
    },
    ToolResult {
        call_id: String,
        tool_name: String,
        status: ToolResultStatus,
        content: String,
    },
    ModelText {
        text: String,
    },
    SystemNotice {
        text: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolResultStatus {
    Success,
    Error,
}

impl Event {
    /// A `toolCall`/`toolResult` pair must never be split by trimming. This
    /// returns the invocation id that links a `ToolCall` or `ToolResult`
    /// event to its counterpart, or `None` for event kinds with no pairing.
    pub fn pair_id(&self) -> Option<&str> {
        match &self.kind {
            EventKind::ToolCall { call } => Some(call.call_id.as_str()),
            EventKind::ToolResult { call_id, .. } => Some(call_id.as_str()),
            _ => None,
        }
    }

    pub fn is_tool_call(&self) -> bool {
        matches!(self.kind, EventKind::ToolCall { .. })
    }

    pub fn is_tool_result(&self) -> bool {
        matches!(self.kind, EventKind::ToolResult { .. })
    }
}
