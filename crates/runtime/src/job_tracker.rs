//! Long-Running Job Tracker: polls provider operations backing
//! asynchronous tool calls (video/music generation, website crawl) to
//! terminal state, updating `Job.progress`/`Job.state` in the document DB
//! as it goes.
//!
//! Tool handlers that start such an operation persist a
//! [`PendingOperation`] under `generationJobs/{jobId}` and return
//! immediately; this tracker is what actually drives the job to
//! completion. It runs on its own background task per `jobId`, independent of the HTTP request that started it.

use std::sync::Arc;
use std::time::Duration;

use agentrt_capabilities::{DocumentDbPort, MusicGenPort, PollOutcome, VideoGenPort};
use agentrt_domain::job::{Job, JobKind, JobState, PendingOperation};
use agentrt_domain::trace::TraceEvent;

const JOBS_COLLECTION: &str = "generationJobs";

/// Poll interval between checks of an in-flight operation.
const POLL_INTERVAL: Duration = Duration::from_secs(3);

pub struct JobTracker {
    docs: Arc<dyn DocumentDbPort>,
    video_gen: Arc<dyn VideoGenPort>,
    music_gen: Arc<dyn MusicGenPort>,
    /// Hard cap past which a job that never reaches a terminal state is
    /// marked `failed` outright — applied to every long-running kind the
    /// tracker drives, not just reindex. Comes from `server.job_max_duration_secs`.
    max_duration: Duration,
}

impl JobTracker {
    pub fn new(
        docs: Arc<dyn DocumentDbPort>,
        video_gen: Arc<dyn VideoGenPort>,
        music_gen: Arc<dyn MusicGenPort>,
        max_duration: Duration,
    ) -> Self {
        Self { docs, video_gen, music_gen, max_duration }
    }

    /// Spawns the polling loop for one job as its own background task.
    /// Returns immediately; the caller (a tool handler, right after
    /// persisting the `PendingOperation`) does not await completion.
    pub fn spawn_poll(self: &Arc<Self>, job_id: String) {
        let this = self.clone();
        tokio::spawn(async move {
            this.poll_to_terminal(&job_id).await;
        });
    }

    async fn poll_to_terminal(&self, job_id: &str) {
        let deadline = tokio::time::Instant::now() + self.max_duration;
        loop {
            let pending = match self.load(job_id).await {
                Ok(Some(pending)) => pending,
                Ok(None) => {
                    tracing::warn!(job_id, "job tracker found no pending operation to poll, stopping");
                    return;
                }
                Err(e) => {
                    tracing::warn!(job_id, error = %e, "job tracker failed to load pending operation, stopping");
                    return;
                }
            };
            if pending.job.is_terminal() {
                return;
            }

            if tokio::time::Instant::now() >= deadline {
                self.finish(pending.job, JobState::Failed, Some("job exceeded the maximum polling duration".into())).await;
                return;
            }

            let outcome = match pending.job.kind {
                JobKind::VideoGen => self.video_gen.poll(&op_handle(&pending)).await,
                JobKind::MusicGen => self.music_gen.poll(&op_handle(&pending)).await,
                // Reindex progress is driven synchronously by the Search
                // Index Manager itself; crawl has no poll-capable port in
                // this capability set and is treated as already terminal
                // by the handler that starts it.
                JobKind::Reindex | JobKind::Crawl | JobKind::ImageGen => return,
            };

            match outcome {
                Ok(PollOutcome::Pending) => {
                    tokio::time::sleep(POLL_INTERVAL).await;
                    continue;
                }
                Ok(PollOutcome::Done(media)) => {
                    let mut job = pending.job;
                    job.advance_progress(100);
                    if let Err(e) = self.save_result(job.job_id.clone(), &media.uri, &media.mime_type).await {
                        tracing::warn!(job_id, error = %e, "failed to persist completed job result");
                    }
                    self.finish(job, JobState::Completed, None).await;
                    return;
                }
                Ok(PollOutcome::Failed { message, dangling }) => {
                    if dangling {
                        tracing::warn!(job_id, %message, "long-running operation dangling, treating as failed (no verification path for this port)");
                    }
                    self.finish(pending.job, JobState::Failed, Some(message)).await;
                    return;
                }
                Err(e) => {
                    tracing::warn!(job_id, error = %e, "polling the provider operation failed, stopping tracker for this job");
                    self.finish(pending.job, JobState::Failed, Some(format!("polling failed: {e}"))).await;
                    return;
                }
            }
        }
    }

    async fn load(&self, job_id: &str) -> agentrt_domain::error::Result<Option<PendingOperation>> {
        Ok(self.docs.get(JOBS_COLLECTION, job_id).await?.and_then(|v| serde_json::from_value(v).ok()))
    }

    async fn save_result(&self, job_id: String, uri: &str, mime_type: &str) -> agentrt_domain::error::Result<()> {
        if let Some(mut pending) = self.load(&job_id).await? {
            pending.job.message = Some(format!("{mime_type}: {uri}"));
            self.docs.put(JOBS_COLLECTION, &job_id, serde_json::to_value(&pending)?).await?;
        }
        Ok(())
    }

    async fn finish(&self, mut job: Job, state: JobState, message: Option<String>) {
        job.state = state;
        if message.is_some() {
            job.message = message;
        }
        job.completed_at = Some(chrono::Utc::now());
        let job_id = job.job_id.clone();
        if let Ok(Some(mut pending)) = self.load(&job_id).await {
            pending.job = job.clone();
            if let Err(e) = self.docs.put(JOBS_COLLECTION, &job_id, serde_json::to_value(&pending).unwrap_or_default()).await {
                tracing::warn!(job_id, error = %e, "failed to persist terminal job state");
            }
        } else if let Err(e) = self.docs.put(JOBS_COLLECTION, &job_id, serde_json::to_value(&job).unwrap_or_default()).await {
            tracing::warn!(job_id, error = %e, "failed to persist terminal job state");
        }
        TraceEvent::JobTerminal {
            job_id,
            kind: format!("{:?}", job.kind).to_lowercase(),
            state: format!("{:?}", job.state).to_lowercase(),
            message: job.message.clone(),
        }
        .emit();
    }
}

fn op_handle(pending: &PendingOperation) -> agentrt_capabilities::OpHandle {
    agentrt_capabilities::OpHandle { id: pending.op_id.clone(), provider: pending.op_provider.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentrt_capabilities::mock::{InMemoryDocumentDb, InMemoryObjectStore, MockMusicGen, MockVideoGen};

    fn tracker() -> (Arc<JobTracker>, Arc<InMemoryDocumentDb>) {
        let docs = Arc::new(InMemoryDocumentDb::new());
        let object_store = Arc::new(InMemoryObjectStore::new());
        let tracker = Arc::new(JobTracker::new(
            docs.clone(),
            Arc::new(MockVideoGen::new(object_store.clone())),
            Arc::new(MockMusicGen::new(object_store)),
            Duration::from_secs(1_800),
        ));
        (tracker, docs)
    }

    #[tokio::test]
    async fn polling_a_video_job_reaches_completed() {
        let (tracker, docs) = tracker();
        let video_gen = MockVideoGen::new(Arc::new(InMemoryObjectStore::new()));
        let op = video_gen.start("a cat", &agentrt_capabilities::GenerationParams::default()).await.unwrap();
        let job = Job::new("job-1", JobKind::VideoGen);
        let pending = PendingOperation { job, op_id: op.id, op_provider: op.provider };
        docs.put("generationJobs", "job-1", serde_json::to_value(&pending).unwrap()).await.unwrap();

        // The mock video generator completes on first poll, so this
        // resolves without needing to wait out the poll interval.
        tracker.poll_to_terminal("job-1").await;

        let stored: PendingOperation = serde_json::from_value(docs.get("generationJobs", "job-1").await.unwrap().unwrap()).unwrap();
        assert_eq!(stored.job.state, JobState::Completed);
        assert_eq!(stored.job.progress, 100);
    }

    #[tokio::test]
    async fn missing_pending_operation_returns_without_panicking() {
        let (tracker, _docs) = tracker();
        tracker.poll_to_terminal("ghost").await;
    }
}
