use serde::{Deserialize, Serialize};

/// Request Coordinator / HTTP binding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "d_bind_addr")]
    pub bind_addr: String,
    /// Per-request wall-clock timeout, in seconds.
    #[serde(default = "d_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Per-tool-call timeout, in seconds.
    #[serde(default = "d_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
    /// Per-LLM-chunk inactivity timeout, in seconds.
    #[serde(default = "d_chunk_inactivity_secs")]
    pub llm_chunk_inactivity_secs: u64,
    /// Hard cap on how long a job may remain in `processing`, in seconds.
    #[serde(default = "d_job_max_duration_secs")]
    pub job_max_duration_secs: u64,
    /// Base directory for the append-only per-tenant session log.
    #[serde(default = "d_state_dir")]
    pub state_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: d_bind_addr(),
            request_timeout_secs: d_request_timeout_secs(),
            tool_timeout_secs: d_tool_timeout_secs(),
            llm_chunk_inactivity_secs: d_chunk_inactivity_secs(),
            job_max_duration_secs: d_job_max_duration_secs(),
            state_dir: d_state_dir(),
        }
    }
}

fn d_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}
fn d_request_timeout_secs() -> u64 {
    300
}
fn d_tool_timeout_secs() -> u64 {
    180
}
fn d_chunk_inactivity_secs() -> u64 {
    60
}
fn d_job_max_duration_secs() -> u64 {
    1_800
}
fn d_state_dir() -> String {
    "./data/sessions".to_string()
}
