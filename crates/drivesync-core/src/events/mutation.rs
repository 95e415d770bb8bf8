//! Mutation lifecycle events.

use serde::{Deserialize, Serialize};

use crate::types::MutationId;

/// Events describing the progress of a submitted mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MutationEvent {
    /// The optimistic projection was applied and the remote call is pending.
    Submitted {
        /// The mutation ID.
        mutation_id: MutationId,
        /// Mutation kind label (`"rename"`, `"move"`, ...).
        kind: String,
        /// The targeted entity, if any.
        target_id: Option<String>,
    },
    /// The remote system confirmed the mutation.
    Committed {
        /// The mutation ID.
        mutation_id: MutationId,
        /// Mutation kind label.
        kind: String,
    },
    /// The remote call failed and the pre-mutation views were restored.
    RolledBack {
        /// The mutation ID.
        mutation_id: MutationId,
        /// Mutation kind label.
        kind: String,
        /// The underlying cause.
        reason: String,
    },
    /// The descriptor was refused before touching any state.
    Rejected {
        /// The mutation ID.
        mutation_id: MutationId,
        /// Mutation kind label.
        kind: String,
        /// Why the descriptor was refused.
        reason: String,
    },
}

impl MutationEvent {
    /// The mutation this event refers to.
    pub fn mutation_id(&self) -> MutationId {
        match self {
            Self::Submitted { mutation_id, .. }
            | Self::Committed { mutation_id, .. }
            | Self::RolledBack { mutation_id, .. }
            | Self::Rejected { mutation_id, .. } => *mutation_id,
        }
    }
}
