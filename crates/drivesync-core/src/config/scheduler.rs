//! Invalidation scheduler configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Coalescing settings for view refetches.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SchedulerConfig {
    /// Window in milliseconds during which repeated stale marks for the
    /// same view collapse into one refetch.
    #[serde(default = "default_coalesce_window")]
    #[validate(range(min = 1, max = 5000))]
    pub coalesce_window_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            coalesce_window_ms: default_coalesce_window(),
        }
    }
}

fn default_coalesce_window() -> u64 {
    16
}
