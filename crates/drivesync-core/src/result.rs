//! Convenience result type alias for DriveSync.

use crate::error::AppError;

/// A specialized `Result` type for DriveSync operations.
pub type AppResult<T> = Result<T, AppError>;
