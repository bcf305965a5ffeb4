//! Storage error types.
//!
//! Returned by every gateway operation; callers do not distinguish causes.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
