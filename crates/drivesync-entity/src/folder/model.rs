//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::color::ColorTag;
use crate::entity::EntityId;

/// A folder in the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Parent folder (None for root-level folders).
    pub parent_id: Option<EntityId>,
    /// Number of direct child folders.
    #[serde(default)]
    pub child_folder_count: u64,
    /// Number of direct child files.
    #[serde(default)]
    pub child_file_count: u64,
    /// Optional color label.
    #[serde(default)]
    pub color_tag: Option<ColorTag>,
    /// Sum of descendant file sizes in bytes.
    #[serde(default)]
    pub size: u64,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last renamed, moved, or recolored.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    /// True only for placeholders of unconfirmed mutations.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_optimistic: bool,
}

impl Folder {
    /// Create an empty, live folder stamped with the current time.
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>, parent_id: Option<EntityId>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            parent_id,
            child_folder_count: 0,
            child_file_count: 0,
            color_tag: None,
            size: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            is_optimistic: false,
        }
    }

    /// Check if this is a root-level folder.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
