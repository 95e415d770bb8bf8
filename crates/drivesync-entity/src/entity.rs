//! The `Entity = Folder | File` tagged union and its identifier.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::file::File;
use crate::folder::Folder;

/// Opaque entity identifier assigned by the remote system.
///
/// Optimistic placeholders carry a locally minted temporary id
/// (`temp-1`, `temp-2`, ...) until the server answers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty id never names a real entity.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Discriminant of [`Entity`], used by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A folder.
    Folder,
    /// A file.
    File,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Folder => write!(f, "folder"),
            Self::File => write!(f, "file"),
        }
    }
}

/// A node of the hierarchical store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entity {
    /// A folder.
    Folder(Folder),
    /// A file.
    File(File),
}

impl Entity {
    /// The entity id.
    pub fn id(&self) -> &EntityId {
        match self {
            Self::Folder(f) => &f.id,
            Self::File(f) => &f.id,
        }
    }

    /// Which variant this is.
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Folder(_) => EntityKind::Folder,
            Self::File(_) => EntityKind::File,
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        match self {
            Self::Folder(f) => &f.name,
            Self::File(f) => &f.name,
        }
    }

    /// Containing folder, `None` at root.
    pub fn parent_id(&self) -> Option<&EntityId> {
        match self {
            Self::Folder(f) => f.parent_id.as_ref(),
            Self::File(f) => f.parent_id.as_ref(),
        }
    }

    /// Byte size (cumulative for folders).
    pub fn size(&self) -> u64 {
        match self {
            Self::Folder(f) => f.size,
            Self::File(f) => f.size,
        }
    }

    /// When the entity was last renamed, moved, or recolored.
    pub fn updated_at(&self) -> DateTime<Utc> {
        match self {
            Self::Folder(f) => f.updated_at,
            Self::File(f) => f.updated_at,
        }
    }

    /// Soft-delete marker.
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Folder(f) => f.deleted_at,
            Self::File(f) => f.deleted_at,
        }
    }

    /// Live entities are the ones without a soft-delete marker.
    pub fn is_live(&self) -> bool {
        self.deleted_at().is_none()
    }

    /// Whether this is an unconfirmed placeholder.
    pub fn is_optimistic(&self) -> bool {
        match self {
            Self::Folder(f) => f.is_optimistic,
            Self::File(f) => f.is_optimistic,
        }
    }

    /// Borrow the folder variant.
    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            Self::Folder(f) => Some(f),
            Self::File(_) => None,
        }
    }

    /// Borrow the file variant.
    pub fn as_file(&self) -> Option<&File> {
        match self {
            Self::File(f) => Some(f),
            Self::Folder(_) => None,
        }
    }

    /// Rename and bump `updated_at`.
    pub fn set_name(&mut self, name: impl Into<String>, at: DateTime<Utc>) {
        let name = name.into();
        match self {
            Self::Folder(f) => {
                f.name = name;
                f.updated_at = at;
            }
            Self::File(f) => {
                f.name = name;
                f.updated_at = at;
            }
        }
    }

    /// Re-parent and bump `updated_at`.
    pub fn set_parent(&mut self, parent_id: Option<EntityId>, at: DateTime<Utc>) {
        match self {
            Self::Folder(f) => {
                f.parent_id = parent_id;
                f.updated_at = at;
            }
            Self::File(f) => {
                f.parent_id = parent_id;
                f.updated_at = at;
            }
        }
    }

    /// Set or clear the soft-delete marker.
    pub fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
        match self {
            Self::Folder(f) => f.deleted_at = at,
            Self::File(f) => f.deleted_at = at,
        }
    }

    /// Turn this entity into a placeholder with a temporary id.
    ///
    /// Timestamps are reset, since a placeholder stands for a new entity.
    pub fn into_placeholder(mut self, temp_id: EntityId, at: DateTime<Utc>) -> Self {
        match &mut self {
            Self::Folder(f) => {
                f.id = temp_id;
                f.is_optimistic = true;
                f.created_at = at;
                f.updated_at = at;
                f.deleted_at = None;
            }
            Self::File(f) => {
                f.id = temp_id;
                f.is_optimistic = true;
                f.created_at = at;
                f.updated_at = at;
                f.deleted_at = None;
            }
        }
        self
    }
}

impl From<Folder> for Entity {
    fn from(folder: Folder) -> Self {
        Self::Folder(folder)
    }
}

impl From<File> for Entity {
    fn from(file: File) -> Self {
        Self::File(file)
    }
}
