// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod location_extractor;
pub mod photo_service;
pub mod place_loader;

pub use location_extractor::{ExifLocationExtractor, LocationExtractor};
pub use photo_service::{PhotoService, JPEG_CONTENT_TYPE};
pub use place_loader::{load_places, DuplicatePolicy, LoadSummary};
