use serde::{Deserialize, Serialize};

/// Memory Store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// When false, `recall`/`extractAndSave` are no-ops.
    #[serde(default = "d_true")]
    pub enable_memory_bank: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enable_memory_bank: d_true(),
        }
    }
}

fn d_true() -> bool {
    true
}
