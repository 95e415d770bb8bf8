//! # drivesync-entity
//!
//! Entity models for the DriveSync client cache. An [`Entity`] is either a
//! [`Folder`] or a [`File`]; views are named projections over entities
//! keyed by [`ViewKey`]. All types derive `Debug`, `Clone`, `Serialize`,
//! and `Deserialize`.

pub mod entity;
pub mod file;
pub mod folder;
pub mod view;

pub use entity::{Entity, EntityId, EntityKind};
pub use file::{File, FileCategory};
pub use folder::{ColorTag, Folder};
pub use view::{
    FetchedView, StorageStats, ViewKey, ViewPayload, ViewRow, ViewSnapshot, ViewStatus,
};
