//! # drivesync-core
//!
//! Core crate for DriveSync. Contains configuration schemas, typed
//! identifiers, domain events, and the unified error system.
//!
//! This crate has **no** internal dependencies on other DriveSync crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
