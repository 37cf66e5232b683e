//! Error types for the groomq waiting-list store.

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
///
/// The first three variants are the domain taxonomy surfaced to API
/// callers; the rest are storage-level failures reported as opaque
/// internal errors at the HTTP boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),
}

impl StoreError {
    /// True for storage-level failures that must not leak details to callers.
    pub fn is_internal(&self) -> bool {
        !matches!(
            self,
            Self::InvalidInput(_) | Self::NotFound(_) | Self::Conflict(_)
        )
    }
}
