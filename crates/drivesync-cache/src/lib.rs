//! # drivesync-cache
//!
//! The two in-memory halves of the client cache:
//!
//! - [`EntityStore`]: canonical, normalized entities keyed by id
//! - [`ViewIndex`]: named views derived from the store, with optimistic
//!   overlays, stale-while-revalidate status, and watch-based observation
//!
//! Nothing in this crate talks to the remote system; refetches are driven
//! from `drivesync-service`.

pub mod store;
pub mod view;

pub use store::EntityStore;
pub use view::{PatchFn, QueryFn, ViewIndex, ViewSnapshotSet};
