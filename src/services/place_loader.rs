// src/services/place_loader.rs
// DOCUMENTATION: Bulk load of place documents
// PURPOSE: Feed a JSON dataset into the geo index with an explicit duplicate policy

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use std::str::FromStr;
use std::time::Instant;

use crate::db::GeoIndex;
use crate::errors::StoreError;
use crate::models::NewPlace;

/// What to do with a document that matches a place already in the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Skip documents with the same formatted_address at the same location
    #[default]
    Skip,
    /// Insert every document, even exact repeats
    Allow,
}

impl FromStr for DuplicatePolicy {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(DuplicatePolicy::Skip),
            "allow" => Ok(DuplicatePolicy::Allow),
            other => Err(StoreError::InvalidInput(format!(
                "unknown duplicate policy '{}' (expected 'skip' or 'allow')",
                other
            ))),
        }
    }
}

/// Outcome of a bulk load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub inserted: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// Load every place document from `reader` into `index`
/// DOCUMENTATION: Each top-level JSON value is one document or an array of
/// them. The spatial index is created first (duplicate detection uses a
/// zero-radius proximity query). A document that is not a valid place, or
/// that fails to insert, is logged and counted without stopping the load;
/// only a JSON syntax error aborts it.
pub async fn load_places<R: Read>(
    index: &dyn GeoIndex,
    reader: R,
    policy: DuplicatePolicy,
) -> Result<LoadSummary, StoreError> {
    let started = Instant::now();
    index.create_spatial_index().await?;

    let mut summary = LoadSummary::default();
    let stream = serde_json::Deserializer::from_reader(reader).into_iter::<Value>();

    for value in stream {
        let value = value.map_err(|e| {
            log::error!("Place dataset is not valid JSON: {}", e);
            StoreError::InvalidInput(format!("invalid place document: {}", e))
        })?;

        let documents = match value {
            Value::Array(documents) => documents,
            document => vec![document],
        };

        for document in documents {
            let place = match serde_json::from_value::<NewPlace>(document) {
                Ok(place) => place,
                Err(e) => {
                    log::warn!("Rejected place document: {}", e);
                    summary.failed += 1;
                    continue;
                }
            };

            if policy == DuplicatePolicy::Skip && is_duplicate(index, &place).await? {
                log::debug!("Skipping duplicate place: {}", place.formatted_address);
                summary.skipped += 1;
                continue;
            }

            let address = place.formatted_address.clone();
            match index.insert(place).await {
                Ok(_) => summary.inserted += 1,
                Err(e) => {
                    log::warn!("Failed to insert place {}: {}", address, e);
                    summary.failed += 1;
                }
            }
        }
    }

    log::info!(
        "Place load finished in {:.1}s: {} inserted, {} skipped, {} failed",
        started.elapsed().as_secs_f64(),
        summary.inserted,
        summary.skipped,
        summary.failed
    );
    Ok(summary)
}

async fn is_duplicate(index: &dyn GeoIndex, place: &NewPlace) -> Result<bool, StoreError> {
    // Several distinct places may share one point; look at all of them
    let same_point = index.near(&place.location(), 0.0, usize::MAX).await?;
    Ok(same_point
        .iter()
        .any(|existing| existing.formatted_address == place.formatted_address))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryPlaceIndex;
    use std::collections::BTreeSet;

    const DATASET: &str = r#"[
        {
            "_id": {"$oid": "56b1ae7b1f2ea0a4c3b2a5a6"},
            "formatted_address": "Baltimore, MD, USA",
            "address_components": [
                {"long_name": "Baltimore", "short_name": "Baltimore", "types": ["locality", "political"]},
                {"long_name": "Maryland", "short_name": "MD", "types": ["administrative_area_level_1", "political"]},
                {"long_name": "United States", "short_name": "US", "types": ["country", "political"]}
            ],
            "geometry": {"geolocation": {"type": "Point", "coordinates": [-76.6122, 39.2904]}}
        },
        {
            "formatted_address": "Annapolis, MD, USA",
            "address_components": [
                {"long_name": "Maryland", "short_name": "MD", "types": ["administrative_area_level_1", "political"]},
                {"long_name": "United States", "short_name": "US", "types": ["country", "political"]}
            ],
            "geometry": {"geolocation": {"lng": -76.4922, "lat": 38.9784}}
        },
        {
            "formatted_address": "Toronto, ON, Canada",
            "address_components": [
                {"long_name": "Canada", "short_name": "CA", "types": ["country", "political"]}
            ],
            "geometry": {"geolocation": {"type": "Point", "coordinates": [-79.3832, 43.6532]}}
        }
    ]"#;

    #[tokio::test]
    async fn test_load_array() {
        let index = MemoryPlaceIndex::new();
        let summary = load_places(&index, DATASET.as_bytes(), DuplicatePolicy::Skip)
            .await
            .unwrap();

        assert_eq!(
            summary,
            LoadSummary {
                inserted: 3,
                skipped: 0,
                failed: 0
            }
        );
        assert!(index.has_spatial_index().await.unwrap());

        let countries = index.distinct_country_names().await.unwrap();
        let expected: BTreeSet<String> = ["Canada", "United States"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(countries, expected);
        assert_eq!(index.find_ids_by_country_code("US").await.unwrap().len(), 2);
        assert_eq!(index.find_by_short_name("MD").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reload_skips_duplicates() {
        let index = MemoryPlaceIndex::new();
        load_places(&index, DATASET.as_bytes(), DuplicatePolicy::Skip)
            .await
            .unwrap();
        let again = load_places(&index, DATASET.as_bytes(), DuplicatePolicy::Skip)
            .await
            .unwrap();

        assert_eq!(again.inserted, 0);
        assert_eq!(again.skipped, 3);
        assert_eq!(index.len().await, 3);
    }

    #[tokio::test]
    async fn test_reload_allow_duplicates() {
        let index = MemoryPlaceIndex::new();
        load_places(&index, DATASET.as_bytes(), DuplicatePolicy::Allow)
            .await
            .unwrap();
        let again = load_places(&index, DATASET.as_bytes(), DuplicatePolicy::Allow)
            .await
            .unwrap();

        assert_eq!(again.inserted, 3);
        assert_eq!(index.len().await, 6);
    }

    #[tokio::test]
    async fn test_same_point_different_address_is_not_duplicate() {
        let index = MemoryPlaceIndex::new();
        let stream = r#"
            {"formatted_address": "Unit 1", "geometry": {"geolocation": {"lng": 1, "lat": 1}}}
            {"formatted_address": "Unit 2", "geometry": {"geolocation": {"lng": 1, "lat": 1}}}
        "#;

        let summary = load_places(&index, stream.as_bytes(), DuplicatePolicy::Skip)
            .await
            .unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.skipped, 0);
    }

    #[tokio::test]
    async fn test_malformed_json_aborts() {
        let index = MemoryPlaceIndex::new();
        let truncated = "[{\"formatted_address\": ";
        let result = load_places(&index, truncated.as_bytes(), DuplicatePolicy::Skip).await;
        assert!(matches!(result, Err(StoreError::InvalidInput(_))));
        assert!(index.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalid_document_is_counted_and_skipped() {
        let index = MemoryPlaceIndex::new();
        let stream = r#"
            {"formatted_address": "Good", "geometry": {"geolocation": {"lng": 1, "lat": 1}}}
            {"formatted_address": "Bad", "geometry": {"geolocation": {"lng": 500, "lat": 0}}}
            {"formatted_address": "Also good", "geometry": {"geolocation": {"lng": 2, "lat": 2}}}
        "#;

        let summary = load_places(&index, stream.as_bytes(), DuplicatePolicy::Skip)
            .await
            .unwrap();
        assert_eq!(
            summary,
            LoadSummary {
                inserted: 2,
                skipped: 0,
                failed: 1
            }
        );
        assert_eq!(index.len().await, 2);
    }

    #[tokio::test]
    async fn test_invalid_array_element_keeps_the_rest() {
        let index = MemoryPlaceIndex::new();
        let array = r#"[
            {"formatted_address": "A", "geometry": {"geolocation": {"lng": 1, "lat": 1}}},
            {"formatted_address": "No geometry"},
            42,
            {"formatted_address": "B", "geometry": {"geolocation": {"lng": 3, "lat": 3}}}
        ]"#;

        let summary = load_places(&index, array.as_bytes(), DuplicatePolicy::Allow)
            .await
            .unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.failed, 2);

        let names: Vec<String> = index
            .list(None, None)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.formatted_address)
            .collect();
        assert_eq!(names, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("skip".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::Skip);
        assert_eq!(" ALLOW ".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::Allow);
        assert!("dedupe".parse::<DuplicatePolicy>().is_err());
    }
}
