//! Search Index Manager and Generative Query Expander: per-tenant
//! vector/fallback search, reindex job execution, and multi-query fan-out.

pub mod fuzzy;
pub mod index;
pub mod query_expander;

pub use index::{MediaSearchHit, SearchIndexManager};
pub use query_expander::QueryExpander;

use std::collections::HashMap;

use agentrt_domain::error::Result;
use agentrt_domain::media::MediaLibraryItem;

/// Fans a query out across `variants` (typically produced by
/// [`QueryExpander`]) and merges results by keeping each media item's best
/// score across all variants.
pub async fn search_with_variants(
    manager: &SearchIndexManager,
    brand_id: &str,
    variants: &[String],
    items: &[MediaLibraryItem],
    k: usize,
) -> Result<Vec<MediaSearchHit>> {
    let mut best: HashMap<String, f32> = HashMap::new();
    for variant in variants {
        let hits = manager.search(brand_id, variant, items, k).await?;
        for hit in hits {
            best.entry(hit.media_id).and_modify(|s| *s = s.max(hit.score)).or_insert(hit.score);
        }
    }
    let mut merged: Vec<MediaSearchHit> = best.into_iter().map(|(media_id, score)| MediaSearchHit { media_id, score }).collect();
    merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    merged.truncate(k);
    Ok(merged)
}
