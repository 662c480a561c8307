use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Reindex,
    VideoGen,
    ImageGen,
    MusicGen,
    Crawl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Processing,
    Completed,
    Failed,
}

/// Tracks a long-running, externally-hosted operation associated with a
/// tool invocation (video generation, reindex, website crawl). `progress`
/// must be monotonically non-decreasing once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub kind: JobKind,
    pub state: JobState,
    pub progress: u8,
    #[serde(default)]
    pub message: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(job_id: impl Into<String>, kind: JobKind) -> Self {
        Self {
            job_id: job_id.into(),
            kind,
            state: JobState::Queued,
            progress: 0,
            message: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, JobState::Completed | JobState::Failed)
    }

    /// Advance progress, refusing to move it backwards. Returns the applied
    /// value (the max of the current and requested progress).
    pub fn advance_progress(&mut self, requested: u8) -> u8 {
        self.progress = self.progress.max(requested.min(100));
        self.progress
    }
}

/// A `Job` paired with the opaque provider operation handle backing it,
/// persisted under `generationJobs/{jobId}` so the Long-Running Job Tracker
/// can resume polling after a restart without the tool handler that
/// started the operation staying alive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOperation {
    pub job: Job,
    pub op_id: String,
    pub op_provider: String,
}
