//! Tool Registry: the catalogue of named, schema-typed tools the Agent
//! Loop dispatches LLM tool calls through.
//!
//! Every handler receives the current [`context::ToolContext`] (tenant plus
//! the capability ports it needs) and returns a [`result::ToolOutcome`] —
//! the `{status, content, message, ...}` envelope that becomes a
//! `toolResult` event. The image/video/music singular-plural duality is
//! enforced structurally by [`result::ToolOutcome::media`], not by
//! convention.

pub mod context;
pub mod handlers;
pub mod registry;
pub mod result;

pub use context::{ToolCapabilities, ToolContext};
pub use registry::ToolRegistry;
pub use result::{ToolOutcome, ToolStatus};
