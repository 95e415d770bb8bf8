//! Invalidation scheduling.

pub mod scheduler;

pub use scheduler::{FlushSummary, InvalidationScheduler};
