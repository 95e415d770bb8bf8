//! # drivesync-service
//!
//! Client-side orchestration over the cache: the remote resource API,
//! optimistic mutations with rollback, coalesced view invalidation, the
//! clipboard, and the [`DriveClient`] facade that wires them together.
//!
//! Components take their collaborators at construction time as `Arc`s or
//! cheaply clonable handles.

pub mod client;
pub mod clipboard;
pub mod events;
pub mod invalidation;
pub mod mutation;
pub mod remote;

mod sync;

pub use client::DriveClient;
pub use clipboard::{Clipboard, ClipboardAction, ClipboardItem, Selection, UiState};
pub use events::EventBus;
pub use invalidation::{FlushSummary, InvalidationScheduler};
pub use mutation::{
    BulkError, BulkOutcome, MutationCoordinator, MutationDescriptor, MutationError, MutationKind,
    MutationOutcome, PendingMutation,
};
pub use remote::{MemoryRemote, RemoteOp, RemoteResourceApi, TimeoutRemote};
