//! Store error types.

use thiserror::Error;

use super::validate::ValidationError;

/// Errors produced by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),

    /// An inbound record is missing fields the schema requires.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
