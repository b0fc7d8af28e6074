// src/db/memory_photo_store.rs
// DOCUMENTATION: In-process blob store engine
// PURPOSE: File records plus chunk records behind one RwLock, laid out like the Postgres tables

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::blob_store::{validate_new_blob, BlobStore};
use super::chunking::{reassemble, split_payload, Chunk, DEFAULT_CHUNK_SIZE};
use crate::errors::StoreError;
use crate::models::{Photo, PhotoBlob, PhotoId, PhotoMetadata, PlaceId};

#[derive(Default)]
struct PhotoTables {
    /// File records keyed by insertion sequence
    files: BTreeMap<u64, Photo>,
    /// id -> insertion sequence
    seqs: HashMap<PhotoId, u64>,
    /// Chunk records keyed by (parent id, n)
    chunks: BTreeMap<(PhotoId, u32), Vec<u8>>,
    next_seq: u64,
}

impl PhotoTables {
    fn file(&self, id: PhotoId) -> Option<&Photo> {
        self.seqs.get(&id).and_then(|seq| self.files.get(seq))
    }

    fn chunks_of(&self, id: PhotoId) -> impl Iterator<Item = Chunk> + '_ {
        self.chunks
            .range((id, 0)..=(id, u32::MAX))
            .map(|((_, n), data)| Chunk {
                n: *n,
                data: data.clone(),
            })
    }
}

/// Blob store kept entirely in memory
/// DOCUMENTATION: Writers take the write lock for the whole operation, so a
/// create or delete is visible all at once. `get` reassembles under a read
/// lock and therefore always sees a consistent snapshot.
pub struct MemoryPhotoStore {
    tables: RwLock<PhotoTables>,
    chunk_size: usize,
}

impl MemoryPhotoStore {
    pub fn new(chunk_size: usize) -> Result<Self, StoreError> {
        if chunk_size == 0 {
            return Err(StoreError::InvalidInput(
                "chunk size must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            tables: RwLock::new(PhotoTables::default()),
            chunk_size,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Total chunk records across all photos
    pub async fn chunk_count(&self) -> usize {
        self.tables.read().await.chunks.len()
    }

    #[cfg(test)]
    async fn drop_chunk(&self, id: PhotoId, n: u32) {
        self.tables.write().await.chunks.remove(&(id, n));
    }
}

impl Default for MemoryPhotoStore {
    fn default() -> Self {
        Self {
            tables: RwLock::new(PhotoTables::default()),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[async_trait]
impl BlobStore for MemoryPhotoStore {
    async fn create(
        &self,
        payload: Vec<u8>,
        content_type: &str,
        metadata: PhotoMetadata,
    ) -> Result<PhotoId, StoreError> {
        validate_new_blob(&payload, content_type)?;

        let id = PhotoId::new();
        let photo = Photo {
            id,
            content_type: content_type.to_string(),
            length: payload.len() as u64,
            chunk_size: self.chunk_size,
            upload_date: Utc::now(),
            metadata,
        };
        let chunks = split_payload(&payload, self.chunk_size);
        let chunk_total = chunks.len();

        let mut tables = self.tables.write().await;
        let seq = tables.next_seq;
        tables.next_seq += 1;
        for chunk in chunks {
            tables.chunks.insert((id, chunk.n), chunk.data);
        }
        tables.seqs.insert(id, seq);
        tables.files.insert(seq, photo);

        log::info!(
            "Stored photo {} ({} bytes in {} chunks)",
            id,
            payload.len(),
            chunk_total
        );
        Ok(id)
    }

    async fn update_metadata(
        &self,
        id: PhotoId,
        metadata: PhotoMetadata,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let seq = *tables
            .seqs
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("photo {}", id)))?;

        if let Some(photo) = tables.files.get_mut(&seq) {
            photo.metadata = metadata;
        }

        log::debug!("Updated metadata for photo {}", id);
        Ok(())
    }

    async fn update_place(&self, id: PhotoId, place: Option<PlaceId>) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let seq = *tables
            .seqs
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("photo {}", id)))?;

        if let Some(photo) = tables.files.get_mut(&seq) {
            photo.metadata.place = place;
        }

        log::debug!("Updated place reference for photo {}", id);
        Ok(())
    }

    async fn get(&self, id: PhotoId) -> Result<PhotoBlob, StoreError> {
        let tables = self.tables.read().await;
        let photo = tables
            .file(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("photo {}", id)))?;

        let payload = reassemble(&photo, tables.chunks_of(id)).map_err(|e| {
            log::error!("Failed to reassemble photo {}: {}", id, e);
            e
        })?;

        Ok(PhotoBlob { photo, payload })
    }

    async fn find(&self, id: PhotoId) -> Result<Photo, StoreError> {
        self.tables
            .read()
            .await
            .file(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("photo {}", id)))
    }

    async fn list(
        &self,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<Photo>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .files
            .values()
            .skip(offset.unwrap_or(0))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn find_by_place(&self, place: PlaceId) -> Result<Vec<Photo>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .files
            .values()
            .filter(|p| p.metadata.place == Some(place))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: PhotoId) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let seq = tables
            .seqs
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound(format!("photo {}", id)))?;
        tables.files.remove(&seq);

        let keys: Vec<(PhotoId, u32)> = tables
            .chunks
            .range((id, 0)..=(id, u32::MAX))
            .map(|(key, _)| *key)
            .collect();
        for key in &keys {
            tables.chunks.remove(key);
        }

        log::info!("Deleted photo {} and {} chunks", id, keys.len());
        Ok(())
    }
}
