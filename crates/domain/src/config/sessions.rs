use serde::{Deserialize, Serialize};

/// Session Store trimming policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Soft token budget before trimming kicks in.
    #[serde(default = "d_token_budget")]
    pub session_token_budget: u64,
    /// Batch of oldest events considered per trim pass, to bound the cost
    /// of a single trim on a very long history.
    #[serde(default = "d_trim_batch")]
    pub trim_batch_size: usize,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            session_token_budget: d_token_budget(),
            trim_batch_size: d_trim_batch(),
        }
    }
}

fn d_token_budget() -> u64 {
    30_000
}
fn d_trim_batch() -> usize {
    50
}
