use std::sync::Arc;

use agentrt_domain::config::Config;
use agentrt_sessions::{SessionStore, TokenCounter};
use agentrt_tools::{ToolCapabilities, ToolRegistry};

use agentrt_runtime::{AgentRuntime, CancelMap};

/// Shared application state passed to every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub runtime: Arc<AgentRuntime>,
    pub sessions: Arc<SessionStore>,
    pub tools: Arc<ToolRegistry>,
    pub caps: Arc<ToolCapabilities>,
    pub cancel_map: Arc<CancelMap>,
    pub token_counter: Arc<dyn TokenCounter>,
}
