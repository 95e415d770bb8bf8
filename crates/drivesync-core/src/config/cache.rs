//! Entity store and view index configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Settings for the client cache and its optimistic projections.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CacheConfig {
    /// Maximum number of rows the `recent` view holds.
    #[serde(default = "default_recent_limit")]
    #[validate(range(min = 1, max = 500))]
    pub recent_limit: usize,
    /// Prefix for temporary ids given to optimistic placeholders.
    #[serde(default = "default_temp_id_prefix")]
    #[validate(length(min = 1))]
    pub temp_id_prefix: String,
    /// Suffix appended to the name of an optimistic copy placeholder.
    #[serde(default = "default_copy_suffix")]
    pub copy_suffix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            recent_limit: default_recent_limit(),
            temp_id_prefix: default_temp_id_prefix(),
            copy_suffix: default_copy_suffix(),
        }
    }
}

fn default_recent_limit() -> usize {
    20
}

fn default_temp_id_prefix() -> String {
    "temp".to_string()
}

fn default_copy_suffix() -> String {
    " (Copy)".to_string()
}
