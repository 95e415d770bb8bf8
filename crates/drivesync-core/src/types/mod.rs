//! Core type definitions used across the DriveSync workspace.

pub mod id;

pub use id::{EventId, MutationId};
