/// Unified error types for the content store
use thiserror::Error;

/// Main error type for content persistence
#[derive(Error, Debug)]
pub enum CmsError {
    /// Referenced document, nested album or image position does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Document database write/delete failed (network, permission, quota)
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Blob upload rejected by the underlying store
    #[error("Storage write error: {0}")]
    StorageWrite(String),

    /// Blob transport errors other than writes
    #[error("Blob storage error: {0}")]
    BlobStorage(String),

    /// Input rejected before any write was attempted
    #[error("Validation error: {0}")]
    Validation(String),

    /// Document body could not be converted to or from a typed record
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CmsError {
    /// True when the error only says the target is absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, CmsError::NotFound(_))
    }
}

/// Result type alias for content store operations
pub type CmsResult<T> = Result<T, CmsError>;
