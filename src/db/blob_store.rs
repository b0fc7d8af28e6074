// src/db/blob_store.rs
// DOCUMENTATION: Blob store contract
// PURPOSE: Chunked photo storage with per-object metadata, independent of engine

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::models::{Photo, PhotoBlob, PhotoId, PhotoMetadata, PlaceId};

/// Chunked storage for photo payloads
/// DOCUMENTATION: Payload and content type are fixed at creation; only
/// `PhotoMetadata` changes afterwards. Implementations must make create and
/// delete atomic and must never hand out a partially assembled payload.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist a payload as chunks plus one file record, returning the new id
    async fn create(
        &self,
        payload: Vec<u8>,
        content_type: &str,
        metadata: PhotoMetadata,
    ) -> Result<PhotoId, StoreError>;

    /// Replace the metadata of an existing photo (idempotent)
    async fn update_metadata(&self, id: PhotoId, metadata: PhotoMetadata)
        -> Result<(), StoreError>;

    /// Replace only the place reference, leaving the location untouched
    async fn update_place(&self, id: PhotoId, place: Option<PlaceId>) -> Result<(), StoreError>;

    /// File record and reassembled payload
    async fn get(&self, id: PhotoId) -> Result<PhotoBlob, StoreError>;

    /// File record only
    async fn find(&self, id: PhotoId) -> Result<Photo, StoreError>;

    /// File records in insertion order; offset/limit apply after ordering
    async fn list(&self, offset: Option<usize>, limit: Option<usize>)
        -> Result<Vec<Photo>, StoreError>;

    /// File records referencing `place`, in insertion order
    async fn find_by_place(&self, place: PlaceId) -> Result<Vec<Photo>, StoreError>;

    /// Remove the file record and every chunk
    async fn delete(&self, id: PhotoId) -> Result<(), StoreError>;
}

/// Shared create-time checks
pub(crate) fn validate_new_blob(payload: &[u8], content_type: &str) -> Result<(), StoreError> {
    if payload.is_empty() {
        return Err(StoreError::InvalidPayload("payload is empty".to_string()));
    }

    if content_type.trim().is_empty() {
        return Err(StoreError::InvalidInput(
            "content_type is required".to_string(),
        ));
    }

    Ok(())
}
