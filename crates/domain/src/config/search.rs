use serde::{Deserialize, Serialize};

/// Search Index Manager configuration: index lifecycle policy plus the
/// vector-backend parameters and fallback-match thresholds carried over
/// from the original retrieval service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Whether new media items are upserted into the vector index on
    /// creation, rather than requiring an explicit reindex.
    #[serde(default = "d_true")]
    pub auto_index: bool,
    /// Reindex batch size.
    #[serde(default = "d_batch_size")]
    pub reindex_batch_size: usize,
    #[serde(default = "d_chunk_size")]
    pub doc_chunk_size: u32,
    #[serde(default = "d_chunk_overlap")]
    pub doc_chunk_overlap: u32,
    #[serde(default = "d_top_k")]
    pub doc_query_top_k: u32,
    #[serde(default = "d_distance_threshold")]
    pub doc_distance_threshold: f32,
    /// Fuzzy-match ratio threshold for the fallback text index (0-1).
    #[serde(default = "d_fuzzy_threshold")]
    pub fuzzy_threshold: f32,
    /// Max query rewrites produced by the generative query expander
    /// (including the original phrase).
    #[serde(default = "d_expander_k")]
    pub query_expander_k: usize,
    #[serde(default = "d_expander_deadline_ms")]
    pub query_expander_deadline_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            auto_index: d_true(),
            reindex_batch_size: d_batch_size(),
            doc_chunk_size: d_chunk_size(),
            doc_chunk_overlap: d_chunk_overlap(),
            doc_query_top_k: d_top_k(),
            doc_distance_threshold: d_distance_threshold(),
            fuzzy_threshold: d_fuzzy_threshold(),
            query_expander_k: d_expander_k(),
            query_expander_deadline_ms: d_expander_deadline_ms(),
        }
    }
}

fn d_true() -> bool {
    true
}
fn d_batch_size() -> usize {
    10
}
fn d_chunk_size() -> u32 {
    512
}
fn d_chunk_overlap() -> u32 {
    100
}
fn d_top_k() -> u32 {
    5
}
fn d_distance_threshold() -> f32 {
    0.5
}
fn d_fuzzy_threshold() -> f32 {
    0.9
}
fn d_expander_k() -> usize {
    5
}
fn d_expander_deadline_ms() -> u64 {
    3_000
}
