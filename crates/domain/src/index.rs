use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexState {
    Absent,
    Creating,
    Active,
    Deleting,
    Error,
}

/// Per-tenant vector index lifecycle record. `backing_uri` may be a
/// timestamp-suffixed name assigned by the remote index provider; an
/// in-memory cache maps `brand_id -> backing_uri` so later operations can
/// find the provider's actual name rather than guessing a canonical one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub brand_id: String,
    pub index_id: String,
    pub state: IndexState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backing_uri: Option<String>,
    pub created_at: DateTime<Utc>,
    pub doc_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reindexed_at: Option<DateTime<Utc>>,
}

impl IndexDescriptor {
    pub fn new_absent(brand_id: impl Into<String>) -> Self {
        let brand_id = brand_id.into();
        Self {
            index_id: format!("momentum-media-{brand_id}"),
            brand_id,
            state: IndexState::Absent,
            backing_uri: None,
            created_at: Utc::now(),
            doc_count: 0,
            last_reindexed_at: None,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.state == IndexState::Active && self.backing_uri.is_some()
    }
}
