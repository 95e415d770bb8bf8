//! Errors surfaced by the mutation coordinator.

use thiserror::Error;

use drivesync_core::error::{AppError, ErrorKind};
use drivesync_core::types::MutationId;

use super::descriptor::MutationDescriptor;

/// Why a mutation did not commit.
#[derive(Debug, Clone, Error)]
pub enum MutationError {
    /// The descriptor would break a tree rule or names an unknown target.
    /// Raised before any snapshot or patch, so nothing changed.
    #[error("invalid {label} mutation: {reason}")]
    InvalidOperation {
        /// The refused mutation.
        mutation_id: MutationId,
        /// Kind label.
        label: &'static str,
        /// What rule it breaks.
        reason: String,
    },

    /// The remote call failed. Every affected view was restored to its
    /// pre-mutation payload before this was returned.
    #[error("{} mutation failed: {cause}", .descriptor.label())]
    Failed {
        /// The descriptor that was rolled back.
        descriptor: Box<MutationDescriptor>,
        /// The remote error.
        #[source]
        cause: AppError,
    },

    /// Local state could not absorb the server's answer.
    #[error("invariant violated while committing {label}: {cause}")]
    InvariantViolation {
        /// The mutation being committed.
        mutation_id: MutationId,
        /// Kind label.
        label: &'static str,
        /// The underlying store error.
        #[source]
        cause: AppError,
    },
}

impl MutationError {
    /// The mutation this error belongs to.
    pub fn mutation_id(&self) -> MutationId {
        match self {
            Self::InvalidOperation { mutation_id, .. }
            | Self::InvariantViolation { mutation_id, .. } => *mutation_id,
            Self::Failed { descriptor, .. } => descriptor.id,
        }
    }

    /// The matching [`ErrorKind`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidOperation { .. } => ErrorKind::InvalidOperation,
            Self::Failed { .. } => ErrorKind::MutationFailed,
            Self::InvariantViolation { .. } => ErrorKind::InvariantViolation,
        }
    }

    /// Whether the views were rolled back.
    pub fn is_rolled_back(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl From<MutationError> for AppError {
    fn from(err: MutationError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        AppError::with_source(kind, message, err)
    }
}
