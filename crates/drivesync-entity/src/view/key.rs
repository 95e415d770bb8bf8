//! View keys: named, parameterized projections over the entity store.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId};
use crate::file::FileCategory;

/// Identifies one derived view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "view", content = "param", rename_all = "lowercase")]
pub enum ViewKey {
    /// Direct children of a folder (`None` is the root listing).
    Contents(Option<EntityId>),
    /// Recently updated files.
    Recent,
    /// Live files of one category.
    Category(FileCategory),
    /// Soft-deleted entities.
    Trash,
    /// Aggregate storage numbers.
    Stats,
}

impl ViewKey {
    /// The root listing.
    pub fn root() -> Self {
        Self::Contents(None)
    }

    /// Listing of a folder, or of root when `folder` is `None`.
    pub fn contents(folder: Option<&EntityId>) -> Self {
        Self::Contents(folder.cloned())
    }

    /// Views over live entities. Soft-deleted entities never appear in them.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Contents(_) | Self::Recent | Self::Category(_))
    }

    /// Whether the payload is a row list rather than aggregate numbers.
    pub fn holds_rows(&self) -> bool {
        !matches!(self, Self::Stats)
    }

    /// Visibility predicate: could `entity` belong to this view?
    ///
    /// Membership also depends on ordering and limits owned by the remote
    /// system (e.g. the size of `recent`), so `true` means "eligible", not
    /// "present".
    pub fn admits(&self, entity: &Entity) -> bool {
        match self {
            Self::Contents(folder) => entity.is_live() && entity.parent_id() == folder.as_ref(),
            Self::Recent => entity.is_live() && entity.as_file().is_some(),
            Self::Category(category) => {
                entity.is_live()
                    && entity
                        .as_file()
                        .is_some_and(|file| file.category() == *category)
            }
            Self::Trash => !entity.is_live(),
            Self::Stats => false,
        }
    }
}

impl fmt::Display for ViewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contents(None) => write!(f, "contents:root"),
            Self::Contents(Some(id)) => write!(f, "contents:{id}"),
            Self::Recent => write!(f, "recent"),
            Self::Category(category) => write!(f, "category:{category}"),
            Self::Trash => write!(f, "trash"),
            Self::Stats => write!(f, "stats"),
        }
    }
}
