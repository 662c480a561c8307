//! Search Index Manager: per-tenant vector index lifecycle, reindex
//! job execution, and the search path that prefers the vector index and
//! falls back to fuzzy text matching.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use agentrt_capabilities::{DocumentDbPort, VectorDoc, VectorIndexPort};
use agentrt_domain::config::SearchConfig;
use agentrt_domain::error::{Error, Result};
use agentrt_domain::index::{IndexDescriptor, IndexState};
use agentrt_domain::job::{Job, JobKind, JobState};
use agentrt_domain::media::MediaLibraryItem;
use agentrt_domain::trace::TraceEvent;

use crate::fuzzy::intelligent_text_match;

fn descriptor_collection(brand_id: &str) -> String {
    format!("brands/{brand_id}/searchIndex")
}

const DESCRIPTOR_DOC_ID: &str = "descriptor";
const JOBS_COLLECTION: &str = "jobs";

#[derive(Debug, Clone)]
pub struct MediaSearchHit {
    pub media_id: String,
    pub score: f32,
}

pub struct SearchIndexManager {
    vector: Arc<dyn VectorIndexPort>,
    docs: Arc<dyn DocumentDbPort>,
    config: SearchConfig,
    /// `brandId -> backingUri`, installed on `creating -> active` so later
    /// calls find the provider's actual (possibly timestamp-suffixed) name.
    cache: RwLock<HashMap<String, String>>,
}

impl SearchIndexManager {
    pub fn new(vector: Arc<dyn VectorIndexPort>, docs: Arc<dyn DocumentDbPort>, config: SearchConfig) -> Self {
        Self { vector, docs, config, cache: RwLock::new(HashMap::new()) }
    }

    async fn load_descriptor(&self, brand_id: &str) -> Result<IndexDescriptor> {
        match self.docs.get(&descriptor_collection(brand_id), DESCRIPTOR_DOC_ID).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(IndexDescriptor::new_absent(brand_id)),
        }
    }

    async fn save_descriptor(&self, descriptor: &IndexDescriptor) -> Result<()> {
        self.docs.put(&descriptor_collection(&descriptor.brand_id), DESCRIPTOR_DOC_ID, serde_json::to_value(descriptor)?).await
    }

    fn transition(&self, descriptor: &mut IndexDescriptor, to: IndexState) {
        let from = descriptor.state;
        descriptor.state = to;
        if from != to {
            TraceEvent::IndexStateChanged { brand_id: descriptor.brand_id.clone(), from: format!("{from:?}"), to: format!("{to:?}") }.emit();
        }
    }

    /// `absent -> creating -> active`. Installs the cache entry once the
    /// provider reports readiness.
    pub async fn create(&self, brand_id: &str) -> Result<IndexDescriptor> {
        let mut descriptor = self.load_descriptor(brand_id).await?;
        self.transition(&mut descriptor, IndexState::Creating);
        self.save_descriptor(&descriptor).await?;

        match self.vector.create_index(brand_id).await {
            Ok(backing_uri) => {
                self.cache.write().insert(brand_id.to_string(), backing_uri.clone());
                descriptor.backing_uri = Some(backing_uri);
                self.transition(&mut descriptor, IndexState::Active);
                self.save_descriptor(&descriptor).await?;
                Ok(descriptor)
            }
            Err(e) => {
                self.transition(&mut descriptor, IndexState::Error);
                self.save_descriptor(&descriptor).await?;
                Err(e)
            }
        }
    }

    /// If `autoIndex` is configured and the tenant has no index yet,
    /// implicitly creates one on first use.
    pub async fn ensure_active(&self, brand_id: &str) -> Result<IndexDescriptor> {
        let descriptor = self.load_descriptor(brand_id).await?;
        if descriptor.is_usable() {
            return Ok(descriptor);
        }
        if descriptor.state == IndexState::Absent && self.config.auto_index {
            return self.create(brand_id).await;
        }
        Ok(descriptor)
    }

    fn backing_uri_for(&self, brand_id: &str, descriptor: &IndexDescriptor) -> Option<String> {
        self.cache.read().get(brand_id).cloned().or_else(|| descriptor.backing_uri.clone())
    }

    /// `active -> deleting -> absent`. Delete is verified by a subsequent
    /// `get_index` call: `not found` is success even if the provider's
    /// delete left a dangling long-running operation.
    pub async fn delete(&self, brand_id: &str, force_recreate: bool) -> Result<IndexDescriptor> {
        let mut descriptor = self.load_descriptor(brand_id).await?;
        let backing_uri = self.backing_uri_for(brand_id, &descriptor);
        self.transition(&mut descriptor, IndexState::Deleting);
        self.save_descriptor(&descriptor).await?;

        if let Some(backing_uri) = backing_uri {
            if let Err(e) = self.vector.delete_index(&backing_uri).await {
                tracing::warn!(brand_id, error = %e, "vector index delete call failed, verifying absence before treating as an error");
            }
            match self.vector.get_index(&backing_uri).await {
                Ok(confirmed_absent) if !confirmed_absent => {
                    self.transition(&mut descriptor, IndexState::Error);
                    self.save_descriptor(&descriptor).await?;
                    return Err(Error::Provider { provider: "vector_index".into(), message: format!("index for brand '{brand_id}' still present after delete"), retriable: true });
                }
                Err(e) => {
                    self.transition(&mut descriptor, IndexState::Error);
                    self.save_descriptor(&descriptor).await?;
                    return Err(e);
                }
                _ => {}
            }
        }

        self.cache.write().remove(brand_id);
        let mut descriptor = IndexDescriptor::new_absent(brand_id);
        self.transition(&mut descriptor, IndexState::Absent);
        self.save_descriptor(&descriptor).await?;

        if force_recreate {
            return self.create(brand_id).await;
        }
        Ok(descriptor)
    }

    /// Batches all of a brand's media items through the vector port,
    /// reporting monotonic progress. A batch failure doesn't abort the job;
    /// it's recorded and subsequent batches still run.
    pub async fn reindex(&self, brand_id: &str, items: Vec<MediaLibraryItem>, job_id: Option<String>) -> Result<Job> {
        let job_id = job_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut job = Job::new(job_id.clone(), JobKind::Reindex);
        job.state = JobState::Processing;
        self.save_job(&job).await?;

        if items.is_empty() {
            job.advance_progress(100);
            job.state = JobState::Completed;
            job.completed_at = Some(chrono::Utc::now());
            self.save_job(&job).await?;
            self.finish_job_trace(&job, brand_id);
            return Ok(job);
        }

        let descriptor = self.ensure_active(brand_id).await?;
        let backing_uri = self.backing_uri_for(brand_id, &descriptor);
        let total = items.len();
        let mut processed = 0usize;
        let mut any_batch_succeeded = false;
        let mut failing_media_ids = Vec::new();

        for batch in items.chunks(self.config.reindex_batch_size.max(1)) {
            let batch_result: Result<()> = if let Some(backing_uri) = &backing_uri {
                let docs: Vec<VectorDoc> = batch
                    .iter()
                    .map(|item| VectorDoc {
                        id: item.media_id.clone(),
                        text: searchable_text(item),
                        metadata: serde_json::to_value(item).unwrap_or(serde_json::Value::Null),
                    })
                    .collect();
                self.vector.upsert(backing_uri, docs).await
            } else {
                // Fallback text index: nothing to upsert, progress is merely
                // simulated.
                Ok(())
            };

            match batch_result {
                Ok(()) => {
                    any_batch_succeeded = true;
                    processed += batch.len();
                }
                Err(e) => {
                    tracing::warn!(brand_id, error = %e, batch_size = batch.len(), "reindex batch failed, continuing with remaining batches");
                    failing_media_ids.extend(batch.iter().map(|i| i.media_id.clone()));
                    processed += batch.len();
                }
            }

            let progress = ((processed as f64 / total as f64) * 100.0).floor() as u8;
            job.advance_progress(progress);
            self.save_job(&job).await?;
            TraceEvent::ReindexProgress { job_id: job.job_id.clone(), brand_id: brand_id.to_string(), progress: job.progress, processed, total }.emit();
        }

        job.state = if any_batch_succeeded { JobState::Completed } else { JobState::Failed };
        job.advance_progress(100);
        job.completed_at = Some(chrono::Utc::now());
        if !failing_media_ids.is_empty() {
            job.message = Some(format!("{} item(s) failed to index: {}", failing_media_ids.len(), failing_media_ids.join(", ")));
        }
        self.save_job(&job).await?;

        let mut descriptor = self.load_descriptor(brand_id).await?;
        descriptor.doc_count = total as u64;
        descriptor.last_reindexed_at = Some(chrono::Utc::now());
        self.save_descriptor(&descriptor).await?;

        self.finish_job_trace(&job, brand_id);
        Ok(job)
    }

    fn finish_job_trace(&self, job: &Job, _brand_id: &str) {
        TraceEvent::JobTerminal { job_id: job.job_id.clone(), kind: "reindex".into(), state: format!("{:?}", job.state).to_lowercase(), message: job.message.clone() }.emit();
    }

    async fn save_job(&self, job: &Job) -> Result<()> {
        self.docs.put(JOBS_COLLECTION, &job.job_id, serde_json::to_value(job)?).await
    }

    pub async fn get_job(&self, job_id: &str) -> Result<Option<Job>> {
        Ok(self.docs.get(JOBS_COLLECTION, job_id).await?.and_then(|v| serde_json::from_value(v).ok()))
    }

    /// Current lifecycle state for a tenant's index, for the status endpoint.
    pub async fn get_descriptor(&self, brand_id: &str) -> Result<IndexDescriptor> {
        self.load_descriptor(brand_id).await
    }

    /// Runs the vector search path if an active index exists, otherwise the
    /// fallback fuzzy text scan over the brand's media library.
    pub async fn search(&self, brand_id: &str, query: &str, items: &[MediaLibraryItem], k: usize) -> Result<Vec<MediaSearchHit>> {
        let descriptor = self.load_descriptor(brand_id).await?;
        if let Some(backing_uri) = self.backing_uri_for(brand_id, &descriptor) {
            if descriptor.is_usable() {
                let hits = self.vector.search(&backing_uri, query, k).await?;
                return Ok(hits.into_iter().map(|h| MediaSearchHit { media_id: h.id, score: h.score }).collect());
            }
        }
        Ok(self.fallback_search(query, items, k))
    }

    fn fallback_search(&self, query: &str, items: &[MediaLibraryItem], k: usize) -> Vec<MediaSearchHit> {
        let mut hits: Vec<MediaSearchHit> = items
            .iter()
            .filter_map(|item| {
                let fields: Vec<&str> = vec![
                    item.title.as_str(),
                    item.description.as_str(),
                    item.enhanced_search_text.as_deref().unwrap_or(""),
                    item.vision_description.as_deref().unwrap_or(""),
                ];
                let (is_match, score) = intelligent_text_match(query, &fields, self.config.fuzzy_threshold as f64);
                let tags_joined = item.tags.join(" ");
                let keywords_joined = item.vision_keywords.as_ref().map(|k| k.join(" ")).unwrap_or_default();
                let (tag_match, tag_score) = intelligent_text_match(query, &[tags_joined.as_str(), keywords_joined.as_str()], self.config.fuzzy_threshold as f64);
                if is_match || tag_match {
                    Some(MediaSearchHit { media_id: item.media_id.clone(), score: score.max(tag_score) as f32 })
                } else {
                    None
                }
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        hits
    }
}

fn searchable_text(item: &MediaLibraryItem) -> String {
    let mut parts = vec![item.title.clone(), item.description.clone()];
    parts.extend(item.tags.iter().cloned());
    if let Some(text) = &item.enhanced_search_text {
        parts.push(text.clone());
    }
    if let Some(desc) = &item.vision_description {
        parts.push(desc.clone());
    }
    if let Some(keywords) = &item.vision_keywords {
        parts.extend(keywords.iter().cloned());
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentrt_capabilities::mock::{InMemoryDocumentDb, InMemoryVectorIndex};
    use agentrt_domain::media::{MediaKind, MediaSource};

    fn manager() -> SearchIndexManager {
        SearchIndexManager::new(Arc::new(InMemoryVectorIndex::new()), Arc::new(InMemoryDocumentDb::new()), SearchConfig::default())
    }

    fn item(id: &str, title: &str) -> MediaLibraryItem {
        MediaLibraryItem {
            media_id: id.into(),
            brand_id: "b1".into(),
            kind: MediaKind::Image,
            storage_uri: "mem://x".into(),
            thumbnail_uri: None,
            title: title.into(),
            description: String::new(),
            tags: Vec::new(),
            source: MediaSource::Uploaded,
            created_at: chrono::Utc::now(),
            created_by: "u1".into(),
            vision_description: None,
            vision_keywords: None,
            vision_categories: None,
            enhanced_search_text: None,
        }
    }

    #[tokio::test]
    async fn create_transitions_absent_to_active() {
        let manager = manager();
        let descriptor = manager.create("b1").await.unwrap();
        assert_eq!(descriptor.state, IndexState::Active);
        assert!(descriptor.backing_uri.is_some());
    }

    #[tokio::test]
    async fn delete_returns_to_absent() {
        let manager = manager();
        manager.create("b1").await.unwrap();
        let descriptor = manager.delete("b1", false).await.unwrap();
        assert_eq!(descriptor.state, IndexState::Absent);
    }

    #[tokio::test]
    async fn reindex_with_no_items_completes_immediately() {
        let manager = manager();
        let job = manager.reindex("b1", Vec::new(), None).await.unwrap();
        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.progress, 100);
    }

    #[tokio::test]
    async fn reindex_reports_monotonic_progress() {
        let manager = manager();
        let items: Vec<MediaLibraryItem> = (0..25).map(|i| item(&format!("m{i}"), "photo")).collect();
        let job = manager.reindex("b1", items, None).await.unwrap();
        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.progress, 100);
    }

    #[tokio::test]
    async fn fallback_search_matches_by_title() {
        let manager = manager();
        let items = vec![item("m1", "a red car in the desert"), item("m2", "a blue plane over the ocean")];
        let hits = manager.search("b1", "car", &items, 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].media_id, "m1");
    }
}
