// src/db/geo_index.rs
// DOCUMENTATION: Geo index contract
// PURPOSE: Place storage with proximity and address-component queries

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::errors::StoreError;
use crate::models::{NewPlace, Place, PlaceId, Point};

/// Name reported by IndexMissing errors
pub const SPATIAL_INDEX_NAME: &str = "places.geometry.geolocation";

/// Point-tagged place records
/// DOCUMENTATION: `near` requires the spatial index and fails with
/// IndexMissing otherwise; every other query works without it.
/// Distances are great-circle meters on the mean earth sphere and ties are
/// broken by the lowest PlaceId.
#[async_trait]
pub trait GeoIndex: Send + Sync {
    async fn insert(&self, place: NewPlace) -> Result<PlaceId, StoreError>;

    async fn get(&self, id: PlaceId) -> Result<Place, StoreError>;

    async fn list(&self, offset: Option<usize>, limit: Option<usize>)
        -> Result<Vec<Place>, StoreError>;

    /// Up to `limit` places within `max_distance_m` of `point`, nearest first
    async fn near(
        &self,
        point: &Point,
        max_distance_m: f64,
        limit: usize,
    ) -> Result<Vec<Place>, StoreError>;

    /// Places with any address component whose short_name equals `name`
    async fn find_by_short_name(&self, name: &str) -> Result<Vec<Place>, StoreError>;

    /// long_name of every country component across all places
    async fn distinct_country_names(&self) -> Result<BTreeSet<String>, StoreError>;

    /// Ids of places whose country component has short_name `code`
    async fn find_ids_by_country_code(&self, code: &str) -> Result<Vec<PlaceId>, StoreError>;

    async fn delete(&self, id: PlaceId) -> Result<(), StoreError>;

    /// Idempotent
    async fn create_spatial_index(&self) -> Result<(), StoreError>;

    /// Idempotent
    async fn drop_spatial_index(&self) -> Result<(), StoreError>;

    async fn has_spatial_index(&self) -> Result<bool, StoreError>;
}

/// Shared radius check for `near`
pub(crate) fn validate_radius(max_distance_m: f64) -> Result<(), StoreError> {
    if !max_distance_m.is_finite() || max_distance_m < 0.0 {
        return Err(StoreError::InvalidInput(format!(
            "max distance must be a finite, non-negative number of meters, got {}",
            max_distance_m
        )));
    }
    Ok(())
}
