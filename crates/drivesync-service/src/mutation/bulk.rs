//! Results of applying several mutations at once.

use thiserror::Error;

use drivesync_core::error::{AppError, ErrorKind};

use super::coordinator::MutationOutcome;
use super::error::MutationError;

/// Per-item results of a bulk submission. Each list keeps the order the
/// items were submitted in.
#[derive(Debug, Clone, Default)]
pub struct BulkOutcome {
    /// Mutations the remote confirmed.
    pub committed: Vec<MutationOutcome>,
    /// Mutations refused or rolled back. Each rollback only undid its own
    /// views; committed siblings stay committed.
    pub failed: Vec<MutationError>,
}

impl BulkOutcome {
    /// Number of items submitted.
    pub fn len(&self) -> usize {
        self.committed.len() + self.failed.len()
    }

    /// Whether nothing was submitted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every item committed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Collapse into a single result for callers that want all-or-error.
    pub fn into_result(self) -> Result<Vec<MutationOutcome>, BulkError> {
        match (self.committed.is_empty(), self.failed.is_empty()) {
            (_, true) => Ok(self.committed),
            (true, false) => Err(BulkError::AllFailed {
                failed: self.failed,
            }),
            (false, false) => Err(BulkError::Partial {
                committed: self.committed,
                failed: self.failed,
            }),
        }
    }
}

/// A bulk submission that did not fully commit.
#[derive(Debug, Clone, Error)]
pub enum BulkError {
    /// Some items committed and the others failed.
    #[error("{} of {} mutations failed", .failed.len(), .failed.len() + .committed.len())]
    Partial {
        /// Items the remote confirmed.
        committed: Vec<MutationOutcome>,
        /// Items refused or rolled back.
        failed: Vec<MutationError>,
    },
    /// Every item failed.
    #[error("all {} mutations failed", .failed.len())]
    AllFailed {
        /// Items refused or rolled back.
        failed: Vec<MutationError>,
    },
}

impl BulkError {
    /// The failed items.
    pub fn failures(&self) -> &[MutationError] {
        match self {
            Self::Partial { failed, .. } | Self::AllFailed { failed } => failed,
        }
    }
}

impl From<BulkError> for AppError {
    fn from(err: BulkError) -> Self {
        let kind = match err {
            BulkError::Partial { .. } => ErrorKind::PartialBulkFailure,
            BulkError::AllFailed { .. } => ErrorKind::MutationFailed,
        };
        AppError::new(kind, err.to_string())
    }
}
