// src/services/photo_service.rs
// DOCUMENTATION: Business logic linking photos to places
// PURPOSE: Intermediary between callers, the blob store and the geo index

use std::sync::Arc;

use crate::db::{BlobStore, GeoIndex};
use crate::errors::StoreError;
use crate::models::{Photo, PhotoBlob, PhotoId, PhotoMetadata, Place, PlaceId, Point};
use crate::services::LocationExtractor;

/// Content type recorded for photos whose location came from EXIF data
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Photo workflows over injected store, index and extractor handles
/// DOCUMENTATION: The two stores never reference each other; this service
/// copies a PlaceId from the geo index into photo metadata.
pub struct PhotoService {
    photos: Arc<dyn BlobStore>,
    places: Arc<dyn GeoIndex>,
    extractor: Arc<dyn LocationExtractor>,
}

impl PhotoService {
    pub fn new(
        photos: Arc<dyn BlobStore>,
        places: Arc<dyn GeoIndex>,
        extractor: Arc<dyn LocationExtractor>,
    ) -> Self {
        Self {
            photos,
            places,
            extractor,
        }
    }

    pub fn photos(&self) -> &Arc<dyn BlobStore> {
        &self.photos
    }

    pub fn places(&self) -> &Arc<dyn GeoIndex> {
        &self.places
    }

    /// Store a new photo, taking its location from embedded GPS data
    /// DOCUMENTATION: Extraction runs before anything is written, so a payload
    /// without a location leaves no file or chunk records behind.
    pub async fn create_photo(
        &self,
        payload: Vec<u8>,
        content_type: &str,
        place: Option<PlaceId>,
    ) -> Result<PhotoId, StoreError> {
        if payload.is_empty() {
            return Err(StoreError::InvalidPayload("payload is empty".to_string()));
        }

        let location = self.extractor.extract_location(&payload).map_err(|e| {
            log::warn!("Location extraction failed: {}", e);
            e
        })?;

        let metadata = PhotoMetadata::at(location).with_place(place);
        self.photos.create(payload, content_type, metadata).await
    }

    /// Store a new photo with caller-supplied metadata (no extraction)
    pub async fn create_photo_with(
        &self,
        payload: Vec<u8>,
        content_type: &str,
        metadata: PhotoMetadata,
    ) -> Result<PhotoId, StoreError> {
        self.photos.create(payload, content_type, metadata).await
    }

    pub async fn find(&self, id: PhotoId) -> Result<Photo, StoreError> {
        self.photos.find(id).await
    }

    pub async fn all(
        &self,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<Photo>, StoreError> {
        self.photos.list(offset, limit).await
    }

    /// Photo record plus its payload
    pub async fn contents(&self, id: PhotoId) -> Result<PhotoBlob, StoreError> {
        self.photos.get(id).await
    }

    /// Metadata-only save of an existing photo
    pub async fn save_metadata(
        &self,
        id: PhotoId,
        metadata: PhotoMetadata,
    ) -> Result<(), StoreError> {
        self.photos.update_metadata(id, metadata).await
    }

    /// Point the photo at `place` (or clear the reference), keeping its location
    pub async fn set_place(
        &self,
        id: PhotoId,
        place: Option<PlaceId>,
    ) -> Result<(), StoreError> {
        self.photos.update_place(id, place).await
    }

    /// Id of the single nearest place within `max_distance_m`
    pub async fn find_nearest_place_id(
        &self,
        location: &Point,
        max_distance_m: f64,
    ) -> Result<Option<PlaceId>, StoreError> {
        let nearest = self.places.near(location, max_distance_m, 1).await?;
        Ok(nearest.first().map(PlaceId::from))
    }

    /// Look up the nearest place for a stored photo and record it in its metadata
    /// DOCUMENTATION: Stores None when nothing is within range; fails with
    /// InvalidInput when the photo has no location.
    pub async fn link_nearest_place(
        &self,
        id: PhotoId,
        max_distance_m: f64,
    ) -> Result<Option<PlaceId>, StoreError> {
        let photo = self.photos.find(id).await?;
        let location = photo.location().ok_or_else(|| {
            StoreError::InvalidInput(format!("photo {} has no location", id))
        })?;

        // Only the reference is written; a location saved meanwhile is kept
        let place = self.find_nearest_place_id(&location, max_distance_m).await?;
        self.photos.update_place(id, place).await?;

        match place {
            Some(place_id) => log::info!("Linked photo {} to place {}", id, place_id),
            None => log::info!(
                "No place within {}m of photo {}; reference cleared",
                max_distance_m,
                id
            ),
        }

        Ok(place)
    }

    /// The place a photo references, if any
    /// DOCUMENTATION: A reference to a place that has since been deleted yields None
    pub async fn place_for_photo(&self, id: PhotoId) -> Result<Option<Place>, StoreError> {
        let photo = self.photos.find(id).await?;
        match photo.place() {
            Some(place_id) => match self.places.get(place_id).await {
                Ok(place) => Ok(Some(place)),
                Err(StoreError::NotFound(_)) => {
                    log::warn!("Photo {} references missing place {}", id, place_id);
                    Ok(None)
                }
                Err(e) => Err(e),
            },
            None => Ok(None),
        }
    }

    pub async fn photos_for_place(&self, place: PlaceId) -> Result<Vec<Photo>, StoreError> {
        self.photos.find_by_place(place).await
    }

    pub async fn destroy(&self, id: PhotoId) -> Result<(), StoreError> {
        self.photos.delete(id).await
    }
}
