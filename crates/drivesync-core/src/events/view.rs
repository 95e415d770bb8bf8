//! View lifecycle events.

use serde::{Deserialize, Serialize};

/// Events emitted as views go stale and get refetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ViewEvent {
    /// A view was marked stale and queued for refetch.
    Stale {
        /// Rendered view key (`"contents:root"`, `"trash"`, ...).
        view: String,
    },
    /// A refetch landed and replaced the view payload.
    Refetched {
        /// Rendered view key.
        view: String,
        /// Number of rows (0 for aggregate views).
        rows: usize,
    },
    /// A refetch failed; the view keeps its last-known payload.
    RefetchFailed {
        /// Rendered view key.
        view: String,
        /// The underlying cause.
        reason: String,
    },
}
