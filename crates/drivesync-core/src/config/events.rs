//! Event bus configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Settings for the in-process domain event bus.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EventsConfig {
    /// Capacity of the broadcast buffer. Slow subscribers lag past this.
    #[serde(default = "default_buffer_size")]
    #[validate(range(min = 1, max = 65_536))]
    pub buffer_size: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
        }
    }
}

fn default_buffer_size() -> usize {
    256
}
