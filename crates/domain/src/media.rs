use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Pdf,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSource {
    Uploaded,
    Generated,
    Reinjected,
    LibraryLookup,
    BrandSoul,
}

/// A concrete media reference in scope for a turn, along with why it is in
/// scope. `uri` is a signed URL or object-store reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaHandle {
    pub id: String,
    pub kind: MediaKind,
    pub uri: String,
    pub mime_type: String,
    pub source: MediaSource,
    /// Why this handle is in scope, e.g. "attached by user", "last image in
    /// prior turn", "resolved from phrase 'the logo'".
    pub provenance: String,
}

/// A tenant's media library entry. Vision fields are populated by an
/// offline analysis step and are searchable by the fallback text index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaLibraryItem {
    pub media_id: String,
    pub brand_id: String,
    pub kind: MediaKind,
    pub storage_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_uri: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub source: MediaSource,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision_keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision_categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced_search_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    ExplicitUpload,
    LastImage,
    IndexedReference,
    LibraryLookup,
    None,
}

/// The concrete, ordered media set the runtime commits to for a turn,
/// produced by the Media Resolver and consumed by the Tool Registry /
/// Agent Loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedMediaSet {
    pub items: Vec<MediaHandle>,
    pub method: ResolutionMethod,
    pub confidence: f32,
    pub user_intent: String,
}

impl ResolvedMediaSet {
    pub fn none(user_intent: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            method: ResolutionMethod::None,
            confidence: 0.0,
            user_intent: user_intent.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
