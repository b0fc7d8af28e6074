// src/db/memory_place_index.rs
// DOCUMENTATION: In-process geo index engine
// PURPOSE: Place table plus an optional latitude-band spatial index

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;

use super::geo_index::{validate_radius, GeoIndex, SPATIAL_INDEX_NAME};
use crate::errors::StoreError;
use crate::models::{NewPlace, Place, PlaceId, Point, EARTH_RADIUS_M};

/// Latitude keys are stored in 1e-7 degree units
const LAT_SCALE: f64 = 1e7;

fn lat_key(latitude: f64) -> i64 {
    (latitude * LAT_SCALE).round() as i64
}

/// Places ordered by latitude
/// DOCUMENTATION: Any place within R meters of Q satisfies
/// |lat(P) - lat(Q)| <= R / earth_radius (in radians), so a proximity query
/// only needs to scan that band and then filter by true distance.
/// Cost: O(log n + k) where k is the number of places in the band.
#[derive(Default)]
struct LatitudeBand {
    entries: BTreeMap<i64, BTreeSet<PlaceId>>,
}

impl LatitudeBand {
    fn add(&mut self, place: &Place) {
        self.entries
            .entry(lat_key(place.location().latitude()))
            .or_default()
            .insert(place.id);
    }

    fn remove(&mut self, place: &Place) {
        let key = lat_key(place.location().latitude());
        if let Some(ids) = self.entries.get_mut(&key) {
            ids.remove(&place.id);
            if ids.is_empty() {
                self.entries.remove(&key);
            }
        }
    }

    fn candidates(&self, center: &Point, max_distance_m: f64) -> impl Iterator<Item = &PlaceId> {
        let delta = (max_distance_m / EARTH_RADIUS_M).to_degrees().min(180.0);
        // One key unit of slack on each side absorbs rounding in lat_key
        let low = lat_key((center.latitude() - delta).max(-90.0)) - 1;
        let high = lat_key((center.latitude() + delta).min(90.0)) + 1;

        self.entries.range(low..=high).flat_map(|(_, ids)| ids.iter())
    }
}

#[derive(Default)]
struct PlaceTables {
    /// Place records keyed by insertion sequence
    places: BTreeMap<u64, Place>,
    seqs: HashMap<PlaceId, u64>,
    next_seq: u64,
    spatial: Option<LatitudeBand>,
}

impl PlaceTables {
    fn place(&self, id: &PlaceId) -> Option<&Place> {
        self.seqs.get(id).and_then(|seq| self.places.get(seq))
    }
}

/// Geo index kept entirely in memory
pub struct MemoryPlaceIndex {
    tables: RwLock<PlaceTables>,
}

impl MemoryPlaceIndex {
    /// Empty index without a spatial index
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(PlaceTables::default()),
        }
    }

    /// Empty index with the spatial index already created
    pub fn with_spatial_index() -> Self {
        Self {
            tables: RwLock::new(PlaceTables {
                spatial: Some(LatitudeBand::default()),
                ..PlaceTables::default()
            }),
        }
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.places.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryPlaceIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GeoIndex for MemoryPlaceIndex {
    async fn insert(&self, place: NewPlace) -> Result<PlaceId, StoreError> {
        let id = PlaceId::new();
        let place = place.into_place(id);

        let mut tables = self.tables.write().await;
        let seq = tables.next_seq;
        tables.next_seq += 1;
        if let Some(band) = tables.spatial.as_mut() {
            band.add(&place);
        }
        tables.seqs.insert(id, seq);
        tables.places.insert(seq, place);

        log::debug!("Inserted place {}", id);
        Ok(id)
    }

    async fn get(&self, id: PlaceId) -> Result<Place, StoreError> {
        self.tables
            .read()
            .await
            .place(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("place {}", id)))
    }

    async fn list(
        &self,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<Place>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .places
            .values()
            .skip(offset.unwrap_or(0))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn near(
        &self,
        point: &Point,
        max_distance_m: f64,
        limit: usize,
    ) -> Result<Vec<Place>, StoreError> {
        validate_radius(max_distance_m)?;

        let tables = self.tables.read().await;
        let band = tables
            .spatial
            .as_ref()
            .ok_or_else(|| StoreError::IndexMissing(SPATIAL_INDEX_NAME.to_string()))?;

        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut hits: Vec<(f64, &Place)> = band
            .candidates(point, max_distance_m)
            .filter_map(|id| tables.place(id))
            .map(|place| (point.distance_to(&place.location()), place))
            .filter(|(distance, _)| *distance <= max_distance_m)
            .collect();

        hits.sort_by(|(da, a), (db, b)| da.total_cmp(db).then_with(|| a.id.cmp(&b.id)));
        hits.truncate(limit);

        log::debug!(
            "Near ({}, {}) within {}m: {} results",
            point.longitude(),
            point.latitude(),
            max_distance_m,
            hits.len()
        );

        Ok(hits.into_iter().map(|(_, place)| place.clone()).collect())
    }

    async fn find_by_short_name(&self, name: &str) -> Result<Vec<Place>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .places
            .values()
            .filter(|p| p.has_short_name(name))
            .cloned()
            .collect())
    }

    async fn distinct_country_names(&self) -> Result<BTreeSet<String>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .places
            .values()
            .flat_map(|p| p.countries())
            .map(|c| c.long_name.clone())
            .collect())
    }

    async fn find_ids_by_country_code(&self, code: &str) -> Result<Vec<PlaceId>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .places
            .values()
            .filter(|p| p.in_country(code))
            .map(|p| p.id)
            .collect())
    }

    async fn delete(&self, id: PlaceId) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let seq = tables
            .seqs
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound(format!("place {}", id)))?;

        if let Some(place) = tables.places.remove(&seq) {
            if let Some(band) = tables.spatial.as_mut() {
                band.remove(&place);
            }
        }

        log::info!("Deleted place: {}", id);
        Ok(())
    }

    async fn create_spatial_index(&self) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.spatial.is_some() {
            return Ok(());
        }

        let mut band = LatitudeBand::default();
        for place in tables.places.values() {
            band.add(place);
        }
        tables.spatial = Some(band);

        log::info!("Created spatial index over {} places", tables.places.len());
        Ok(())
    }

    async fn drop_spatial_index(&self) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.spatial.take().is_some() {
            log::info!("Dropped spatial index");
        }
        Ok(())
    }

    async fn has_spatial_index(&self) -> Result<bool, StoreError> {
        Ok(self.tables.read().await.spatial.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AddressComponent;
    use tokio_test::assert_ok;

    fn at(lng: f64, lat: f64) -> Point {
        Point::new(lng, lat).unwrap()
    }

    fn place(name: &str, lng: f64, lat: f64) -> NewPlace {
        NewPlace::new(name, at(lng, lat))
    }

    async fn abc_index() -> (MemoryPlaceIndex, PlaceId, PlaceId, PlaceId) {
        let index = MemoryPlaceIndex::with_spatial_index();
        let a = index.insert(place("A", 0.0, 0.0)).await.unwrap();
        let b = index.insert(place("B", 1.0, 1.0)).await.unwrap();
        let c = index.insert(place("C", 5.0, 5.0)).await.unwrap();
        (index, a, b, c)
    }

    #[tokio::test]
    async fn test_near_nearest_first() {
        let (index, a, b, _) = abc_index().await;

        let nearest = index.near(&at(0.0, 0.0), 200_000.0, 1).await.unwrap();
        assert_eq!(nearest.len(), 1);
        assert_eq!(nearest[0].id, a);

        let within = index.near(&at(0.0, 0.0), 200_000.0, 10).await.unwrap();
        let ids: Vec<PlaceId> = within.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[tokio::test]
    async fn test_near_empty_outside_radius() {
        let (index, _, _, _) = abc_index().await;
        let result = index.near(&at(100.0, -40.0), 1_000.0, 5).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_near_respects_radius() {
        let index = MemoryPlaceIndex::with_spatial_index();
        for i in -10..=10 {
            for j in -10..=10 {
                index
                    .insert(place("grid", i as f64 * 0.37, j as f64 * 0.29))
                    .await
                    .unwrap();
            }
        }

        let center = at(0.4, -0.3);
        for radius in [0.0, 5_000.0, 50_000.0, 250_000.0] {
            let results = index.near(&center, radius, 1_000).await.unwrap();
            let mut last = 0.0;
            for p in &results {
                let d = center.distance_to(&p.location());
                assert!(d <= radius, "{} > {}", d, radius);
                assert!(d >= last);
                last = d;
            }

            // Every place inside the radius must be reported
            let all = index.list(None, None).await.unwrap();
            let inside = all
                .iter()
                .filter(|p| center.distance_to(&p.location()) <= radius)
                .count();
            assert_eq!(results.len(), inside);
        }
    }

    #[tokio::test]
    async fn test_near_limit_one_is_global_minimum() {
        let index = MemoryPlaceIndex::with_spatial_index();
        let points = [(10.0, 10.0), (10.2, 9.9), (9.7, 10.3), (10.05, 10.01)];
        for (lng, lat) in points {
            index.insert(place("p", lng, lat)).await.unwrap();
        }

        let query = at(10.04, 10.0);
        let best = index.near(&query, 100_000.0, 1).await.unwrap();
        let all = index.list(None, None).await.unwrap();
        let min = all
            .iter()
            .map(|p| query.distance_to(&p.location()))
            .fold(f64::INFINITY, f64::min);

        assert_eq!(best.len(), 1);
        assert_eq!(query.distance_to(&best[0].location()), min);
    }

    #[tokio::test]
    async fn test_near_tie_breaks_on_lowest_id() {
        let index = MemoryPlaceIndex::with_spatial_index();
        let first = index.insert(place("east", 1.0, 0.0)).await.unwrap();
        let second = index.insert(place("west", -1.0, 0.0)).await.unwrap();

        let result = index.near(&at(0.0, 0.0), 500_000.0, 2).await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, first.min(second));
        assert_eq!(result[1].id, first.max(second));
    }

    #[tokio::test]
    async fn test_near_across_antimeridian() {
        let index = MemoryPlaceIndex::with_spatial_index();
        let fiji = index.insert(place("east", 179.9, -17.0)).await.unwrap();

        let result = index.near(&at(-179.9, -17.0), 50_000.0, 1).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, fiji);
    }

    #[tokio::test]
    async fn test_near_requires_index() {
        let index = MemoryPlaceIndex::new();
        index.insert(place("A", 0.0, 0.0)).await.unwrap();

        let err = index.near(&at(0.0, 0.0), 10.0, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::IndexMissing(_)));

        assert_ok!(index.create_spatial_index().await);
        assert_ok!(index.create_spatial_index().await);
        assert_eq!(index.near(&at(0.0, 0.0), 10.0, 1).await.unwrap().len(), 1);

        assert_ok!(index.drop_spatial_index().await);
        assert_ok!(index.drop_spatial_index().await);
        assert!(!index.has_spatial_index().await.unwrap());
        assert!(index.near(&at(0.0, 0.0), 10.0, 1).await.is_err());
    }

    #[tokio::test]
    async fn test_near_rejects_bad_radius() {
        let (index, _, _, _) = abc_index().await;
        for radius in [-1.0, f64::NAN, f64::INFINITY] {
            let err = index.near(&at(0.0, 0.0), radius, 1).await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidInput(_)));
        }
        assert!(index.near(&at(0.0, 0.0), 10.0, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_from_spatial_index() {
        let (index, a, b, _) = abc_index().await;
        assert_ok!(index.delete(a).await);

        let nearest = index.near(&at(0.0, 0.0), 200_000.0, 1).await.unwrap();
        assert_eq!(nearest[0].id, b);
        assert!(matches!(index.get(a).await, Err(StoreError::NotFound(_))));
        assert!(matches!(index.delete(a).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_address_component_queries() {
        let index = MemoryPlaceIndex::new();
        let spain = AddressComponent::new("Spain", "ES", &["country", "political"]);
        let france = AddressComponent::new("France", "FR", &["country", "political"]);

        let zaragoza = index
            .insert(
                place("Zaragoza, Spain", -0.8773, 41.6561)
                    .with_component(AddressComponent::new("Zaragoza", "Z", &["locality"]))
                    .with_component(spain.clone()),
            )
            .await
            .unwrap();
        let madrid = index
            .insert(place("Madrid, Spain", -3.7038, 40.4168).with_component(spain))
            .await
            .unwrap();
        let paris = index
            .insert(place("Paris, France", 2.3522, 48.8566).with_component(france))
            .await
            .unwrap();
        // "ES" as a non-country short name must not count as Spain
        let state = AddressComponent::new("Estado", "ES", &["administrative_area_level_1"]);
        index
            .insert(place("Somewhere", 0.0, 0.0).with_component(state))
            .await
            .unwrap();

        let names = index.distinct_country_names().await.unwrap();
        assert_eq!(
            names.into_iter().collect::<Vec<_>>(),
            vec!["France".to_string(), "Spain".to_string()]
        );

        let spanish = index.find_ids_by_country_code("ES").await.unwrap();
        assert_eq!(spanish, vec![zaragoza, madrid]);
        assert_eq!(index.find_ids_by_country_code("FR").await.unwrap(), vec![paris]);
        assert!(index.find_ids_by_country_code("DE").await.unwrap().is_empty());

        let by_short = index.find_by_short_name("Z").await.unwrap();
        assert_eq!(by_short.len(), 1);
        assert_eq!(by_short[0].id, zaragoza);
        assert_eq!(index.find_by_short_name("ES").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_list_paging() {
        let (index, a, b, c) = abc_index().await;
        let ids: Vec<PlaceId> = index
            .list(Some(1), Some(5))
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![b, c]);
        assert_eq!(index.list(None, Some(1)).await.unwrap()[0].id, a);
        assert_eq!(index.len().await, 3);
    }
}
