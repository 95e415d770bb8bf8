//! File entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::FileCategory;
use crate::entity::EntityId;

/// A file (leaf resource) in the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    /// Unique file identifier.
    pub id: EntityId,
    /// The file name (including extension).
    pub name: String,
    /// The containing folder (None for root-level files).
    pub parent_id: Option<EntityId>,
    /// File size in bytes.
    pub size: u64,
    /// MIME type of the content.
    pub mime_type: String,
    /// Where the content can be downloaded from.
    pub source_url: String,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
    /// When the file was last renamed or moved.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    /// True only for placeholders of unconfirmed mutations.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_optimistic: bool,
}

impl File {
    /// Create a live file stamped with the current time.
    pub fn new(
        id: impl Into<EntityId>,
        name: impl Into<String>,
        parent_id: Option<EntityId>,
        size: u64,
        mime_type: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        let id = id.into();
        Self {
            source_url: format!("/files/{id}/content"),
            id,
            name: name.into(),
            parent_id,
            size,
            mime_type: mime_type.into(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
            is_optimistic: false,
        }
    }

    /// The category bucket this file is listed under.
    pub fn category(&self) -> FileCategory {
        FileCategory::from_mime(&self.mime_type)
    }

    /// Get the file extension (lowercase), if any.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit('.')
            .next()
            .filter(|ext| *ext != self.name)
            .map(|ext| ext.to_lowercase())
    }
}
