//! Datastore and listing errors

use sg_core::GridError;

/// Error type for datastore operations
#[derive(Debug, thiserror::Error)]
pub enum DatastoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to decode row: {0}")]
    Decode(String),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unsupported query: {0}")]
    InvalidQuery(String),
}

/// Result type for datastore operations
pub type DatastoreResult<T> = Result<T, DatastoreError>;

/// Failure of a grid listing: rejected criteria or a failed execution
#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error(transparent)]
    Criteria(#[from] GridError),

    #[error(transparent)]
    Datastore(#[from] DatastoreError),
}

impl ListingError {
    /// HTTP status a caller should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Criteria(err) => err.status_code(),
            Self::Datastore(_) => 500,
        }
    }
}
