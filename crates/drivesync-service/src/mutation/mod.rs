//! Optimistic mutations over the entity store and its views.

pub mod bulk;
pub mod coordinator;
pub mod descriptor;
pub mod error;
mod projection;
mod validate;

pub use bulk::{BulkError, BulkOutcome};
pub use coordinator::{MutationCoordinator, MutationOutcome, PendingMutation};
pub use descriptor::{MutationDescriptor, MutationKind};
pub use error::MutationError;

pub(crate) use coordinator::settle;
