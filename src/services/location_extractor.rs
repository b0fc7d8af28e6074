// src/services/location_extractor.rs
// DOCUMENTATION: GPS extraction from image bytes
// PURPOSE: Injected collaborator that turns a photo payload into a Point

use exif::{In, Tag, Value};
use std::io::Cursor;

use crate::errors::StoreError;
use crate::models::Point;

/// Extracts the capture location embedded in an image payload
/// DOCUMENTATION: Implementations return InvalidPayload when the bytes are
/// not a readable image and MetadataExtraction when the image carries no
/// usable GPS position. Plain closures implement this trait too.
pub trait LocationExtractor: Send + Sync {
    fn extract_location(&self, payload: &[u8]) -> Result<Point, StoreError>;
}

impl<F> LocationExtractor for F
where
    F: Fn(&[u8]) -> Result<Point, StoreError> + Send + Sync,
{
    fn extract_location(&self, payload: &[u8]) -> Result<Point, StoreError> {
        self(payload)
    }
}

/// Reads GPSLatitude/GPSLongitude from EXIF data (JPEG, TIFF, HEIF, PNG, WebP)
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifLocationExtractor;

impl LocationExtractor for ExifLocationExtractor {
    fn extract_location(&self, payload: &[u8]) -> Result<Point, StoreError> {
        if payload.is_empty() {
            return Err(StoreError::InvalidPayload("payload is empty".to_string()));
        }

        let exif = exif::Reader::new()
            .read_from_container(&mut Cursor::new(payload))
            .map_err(|e| match e {
                exif::Error::NotFound(_) | exif::Error::BlankValue(_) => {
                    StoreError::MetadataExtraction(format!("no EXIF data: {}", e))
                }
                other => StoreError::InvalidPayload(format!("not a readable image: {}", other)),
            })?;

        let latitude = coordinate(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S')?;
        let longitude = coordinate(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W')?;

        log::debug!("Extracted GPS location ({}, {})", longitude, latitude);
        Point::new(longitude, latitude)
            .map_err(|e| StoreError::MetadataExtraction(format!("unusable GPS position: {}", e)))
    }
}

/// Decimal degrees from a degrees/minutes/seconds rational triple and its N/S or E/W ref
fn coordinate(
    exif: &exif::Exif,
    value_tag: Tag,
    ref_tag: Tag,
    negative_ref: u8,
) -> Result<f64, StoreError> {
    let field = exif
        .get_field(value_tag, In::PRIMARY)
        .ok_or_else(|| StoreError::MetadataExtraction(format!("{} is missing", value_tag)))?;

    let degrees = match &field.value {
        Value::Rational(parts) if !parts.is_empty() => parts
            .iter()
            .take(3)
            .zip([1.0, 60.0, 3600.0])
            .map(|(part, divisor)| part.to_f64() / divisor)
            .sum::<f64>(),
        _ => {
            return Err(StoreError::MetadataExtraction(format!(
                "{} is not a rational triple",
                value_tag
            )))
        }
    };

    let negative = match exif.get_field(ref_tag, In::PRIMARY).map(|f| &f.value) {
        Some(Value::Ascii(refs)) => refs
            .first()
            .and_then(|r| r.first())
            .map(|c| c.to_ascii_uppercase() == negative_ref)
            .unwrap_or(false),
        _ => false,
    };

    if !degrees.is_finite() {
        return Err(StoreError::MetadataExtraction(format!(
            "{} is not a finite number",
            value_tag
        )));
    }

    Ok(if negative { -degrees } else { degrees })
}
