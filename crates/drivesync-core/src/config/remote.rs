//! Remote resource API configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Settings applied to calls against the remote resource API.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RemoteConfig {
    /// Per-call timeout in milliseconds.
    #[serde(default = "default_timeout")]
    #[validate(range(min = 10, max = 600_000))]
    pub timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    10_000
}
