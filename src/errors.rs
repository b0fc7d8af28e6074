// src/errors.rs
// DOCUMENTATION: Custom error types for the blob store and geo index
// PURPOSE: Centralized error handling for entire library

use thiserror::Error;

/// Library-specific error types
/// DOCUMENTATION: Every storage and query operation returns this enum.
/// Caller errors (InvalidPayload, InvalidPoint, InvalidInput) are never retried;
/// CorruptBlob is always fatal to the read that raised it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid point: {0}")]
    InvalidPoint(String),

    #[error("Metadata extraction failed: {0}")]
    MetadataExtraction(String),

    #[error("Corrupt blob {id}: {reason}")]
    CorruptBlob { id: String, reason: String },

    #[error("Spatial index missing on {0}")]
    IndexMissing(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl StoreError {
    /// Stable machine-readable code for logs and CLI output
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "NOT_FOUND",
            StoreError::InvalidPayload(_) => "INVALID_PAYLOAD",
            StoreError::InvalidPoint(_) => "INVALID_POINT",
            StoreError::MetadataExtraction(_) => "METADATA_EXTRACTION_ERROR",
            StoreError::CorruptBlob { .. } => "CORRUPT_BLOB",
            StoreError::IndexMissing(_) => "INDEX_MISSING",
            StoreError::InvalidInput(_) => "INVALID_INPUT",
            StoreError::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    /// Whether the caller supplied bad input (as opposed to a store failure)
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidPayload(_)
                | StoreError::InvalidPoint(_)
                | StoreError::InvalidInput(_)
        )
    }
}
