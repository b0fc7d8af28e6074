// src/db/mod.rs
// DOCUMENTATION: Database module organization
// PURPOSE: Store contracts, chunking rules and both storage engines

pub mod blob_store;
pub mod chunking;
pub mod geo_index;
pub mod memory_photo_store;
pub mod memory_place_index;
pub mod photo_repository;
pub mod place_repository;
pub mod schema;

pub use blob_store::BlobStore;
pub use chunking::DEFAULT_CHUNK_SIZE;
pub use geo_index::GeoIndex;
pub use memory_photo_store::MemoryPhotoStore;
pub use memory_place_index::MemoryPlaceIndex;
pub use photo_repository::PhotoRepository;
pub use place_repository::PlaceRepository;
pub use schema::ensure_schema;
