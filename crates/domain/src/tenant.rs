use serde::{Deserialize, Serialize};

use crate::media::{MediaHandle, ResolvedMediaSet};

/// A `(brandId, userId)` pair. All user-facing state is partitioned by
/// `brand_id`; user-specific memory is additionally partitioned by
/// `user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tenant {
    pub brand_id: String,
    pub user_id: String,
}

impl Tenant {
    pub fn new(brand_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            brand_id: brand_id.into(),
            user_id: user_id.into(),
        }
    }

    /// `brandId_userId`, the session store's key format. Delimiter-safety is
    /// the caller's responsibility: components must not themselves contain
    /// an underscore, or a different delimiter must be used.
    pub fn session_key(&self) -> String {
        format!("{}_{}", self.brand_id, self.user_id)
    }
}

/// Per-request settings a caller may override for the duration of one call
/// (model identifiers, primarily).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_model: Option<String>,
}

/// Per-request scoped record. Never mutated after construction; each
/// capability port and tool handler takes it by value or shared reference
/// and must not leak it to another request's invocation.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant: Tenant,
    pub settings: RequestSettings,
    pub team_context: Option<serde_json::Value>,
    pub attachments: Vec<MediaHandle>,
    pub resolved_media: Option<ResolvedMediaSet>,
}

impl TenantContext {
    pub fn new(tenant: Tenant) -> Self {
        Self {
            tenant,
            settings: RequestSettings::default(),
            team_context: None,
            attachments: Vec::new(),
            resolved_media: None,
        }
    }

    pub fn session_key(&self) -> String {
        self.tenant.session_key()
    }
}
