// src/models/photo.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PhotoId, PlaceId, Point};

/// Mutable metadata attached to a stored photo
/// DOCUMENTATION: The only part of a photo that may change after creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoMetadata {
    pub location: Option<Point>,
    pub place: Option<PlaceId>,
}

impl PhotoMetadata {
    pub fn at(location: Point) -> Self {
        Self {
            location: Some(location),
            place: None,
        }
    }

    pub fn with_place(mut self, place: impl Into<Option<PlaceId>>) -> Self {
        self.place = place.into();
        self
    }
}

/// File record of a stored photo (payload excluded)
/// DOCUMENTATION: Serialized as {_id, content_type, length, chunk_size, upload_date, metadata}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    #[serde(rename = "_id")]
    pub id: PhotoId,
    pub content_type: String,
    pub length: u64,
    pub chunk_size: usize,
    pub upload_date: DateTime<Utc>,
    pub metadata: PhotoMetadata,
}

impl Photo {
    pub fn location(&self) -> Option<Point> {
        self.metadata.location
    }

    pub fn place(&self) -> Option<PlaceId> {
        self.metadata.place
    }
}

/// A photo together with its reassembled payload
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoBlob {
    pub photo: Photo,
    pub payload: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_shape() {
        let place = PlaceId::new();
        let metadata = PhotoMetadata::at(Point::new(-0.88, 41.65).unwrap()).with_place(place);
        let value = serde_json::to_value(metadata).unwrap();

        assert_eq!(
            value,
            json!({
                "location": {"type": "Point", "coordinates": [-0.88, 41.65]},
                "place": place.to_string()
            })
        );

        let empty = serde_json::to_value(PhotoMetadata::default()).unwrap();
        assert_eq!(empty, json!({"location": null, "place": null}));
    }
}
