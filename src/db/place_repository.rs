// src/db/place_repository.rs
// DOCUMENTATION: Database access layer for places
// PURPOSE: Geo index on PostgreSQL/PostGIS (places table + GiST index)

use async_trait::async_trait;
use serde_json::json;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::geo_index::{validate_radius, GeoIndex, SPATIAL_INDEX_NAME};
use super::schema::PLACES_SPATIAL_INDEX;
use crate::errors::StoreError;
use crate::models::{AddressComponent, NewPlace, Place, PlaceGeometry, PlaceId, Point};

/// Internal struct for mapping database rows to Place struct
/// DOCUMENTATION: Handles PostGIS POINT extraction via ST_X() and ST_Y()
#[derive(Debug, FromRow)]
struct PlaceRow {
    id: Uuid,
    formatted_address: String,
    address_components: Json<Vec<AddressComponent>>,
    longitude: f64, // From ST_X(geolocation)
    latitude: f64,  // From ST_Y(geolocation)
}

impl PlaceRow {
    fn to_place(self) -> Result<Place, StoreError> {
        Ok(Place {
            id: PlaceId::from(self.id),
            formatted_address: self.formatted_address,
            address_components: self.address_components.0,
            geometry: PlaceGeometry {
                geolocation: Point::new(self.longitude, self.latitude)?,
            },
        })
    }
}

const SELECT_PLACE: &str = r#"
    SELECT
        p.id, p.formatted_address, p.address_components,
        ST_X(p.geolocation::geometry) AS longitude, ST_Y(p.geolocation::geometry) AS latitude
    FROM places p
"#;

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |e| {
        log::error!("{}: {}", context, e);
        StoreError::DatabaseError(format!("{}: {}", context, e))
    }
}

fn rows_to_places(rows: Vec<PlaceRow>) -> Result<Vec<Place>, StoreError> {
    rows.into_iter().map(PlaceRow::to_place).collect()
}

/// PlaceRepository: geo index backed by PostGIS
/// DOCUMENTATION: Distances use ST_Distance/ST_DWithin with use_spheroid = false,
/// the same sphere model as the in-memory engine. Address-component filters
/// use JSONB containment on the address_components column.
pub struct PlaceRepository {
    pool: PgPool,
}

impl PlaceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl GeoIndex for PlaceRepository {
    async fn insert(&self, place: NewPlace) -> Result<PlaceId, StoreError> {
        let id = PlaceId::new();
        let location = place.location();

        sqlx::query(
            r#"
            INSERT INTO places (id, formatted_address, address_components, geolocation)
            VALUES ($1, $2, $3, ST_SetSRID(ST_MakePoint($4, $5), 4326)::geography)
            "#,
        )
        .bind(id) // $1
        .bind(&place.formatted_address) // $2
        .bind(Json(&place.address_components)) // $3
        .bind(location.longitude()) // $4 - longitude
        .bind(location.latitude()) // $5 - latitude
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to create place"))?;

        log::debug!("Created place with id: {}", id);
        Ok(id)
    }

    async fn get(&self, id: PlaceId) -> Result<Place, StoreError> {
        sqlx::query_as::<_, PlaceRow>(&format!("{} WHERE p.id = $1", SELECT_PLACE))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Database error fetching place"))?
            .ok_or_else(|| {
                log::warn!("Place not found: {}", id);
                StoreError::NotFound(format!("place {}", id))
            })?
            .to_place()
    }

    async fn list(
        &self,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<Place>, StoreError> {
        let rows = sqlx::query_as::<_, PlaceRow>(&format!(
            "{} ORDER BY p.seq ASC OFFSET $1 LIMIT $2",
            SELECT_PLACE
        ))
        .bind(offset.unwrap_or(0) as i64)
        .bind(limit.map(|l| l.min(i64::MAX as usize) as i64))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("List places failed"))?;

        rows_to_places(rows)
    }

    async fn near(
        &self,
        point: &Point,
        max_distance_m: f64,
        limit: usize,
    ) -> Result<Vec<Place>, StoreError> {
        validate_radius(max_distance_m)?;

        if !self.has_spatial_index().await? {
            return Err(StoreError::IndexMissing(SPATIAL_INDEX_NAME.to_string()));
        }

        if limit == 0 {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"{}
            WHERE ST_DWithin(
                p.geolocation,
                ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography,
                $3,
                false
            )
            ORDER BY ST_Distance(
                p.geolocation,
                ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography,
                false
            ) ASC, p.id ASC
            LIMIT $4"#,
            SELECT_PLACE
        );

        log::debug!(
            "Near query at ({}, {}) within {}m, limit {}",
            point.longitude(),
            point.latitude(),
            max_distance_m,
            limit
        );

        let rows = sqlx::query_as::<_, PlaceRow>(&sql)
            .bind(point.longitude())
            .bind(point.latitude())
            .bind(max_distance_m)
            .bind(limit.min(i64::MAX as usize) as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Near query error"))?;

        rows_to_places(rows)
    }

    async fn find_by_short_name(&self, name: &str) -> Result<Vec<Place>, StoreError> {
        let rows = sqlx::query_as::<_, PlaceRow>(&format!(
            "{} WHERE p.address_components @> $1 ORDER BY p.seq ASC",
            SELECT_PLACE
        ))
        .bind(json!([{ "short_name": name }]))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Short name query error"))?;

        rows_to_places(rows)
    }

    async fn distinct_country_names(&self) -> Result<BTreeSet<String>, StoreError> {
        let rows: Vec<(Option<String>,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT c ->> 'long_name'
            FROM places p
            CROSS JOIN LATERAL jsonb_array_elements(p.address_components) AS c
            WHERE c -> 'types' @> '["country"]'::jsonb
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Country names query error"))?;

        Ok(rows.into_iter().filter_map(|(name,)| name).collect())
    }

    async fn find_ids_by_country_code(&self, code: &str) -> Result<Vec<PlaceId>, StoreError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT p.id FROM places p WHERE p.address_components @> $1 ORDER BY p.seq ASC",
        )
        .bind(json!([{ "short_name": code, "types": ["country"] }]))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Country code query error"))?;

        Ok(rows.into_iter().map(|(id,)| PlaceId::from(id)).collect())
    }

    async fn delete(&self, id: PlaceId) -> Result<(), StoreError> {
        let rows = sqlx::query("DELETE FROM places WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Delete place failed"))?
            .rows_affected();

        if rows == 0 {
            return Err(StoreError::NotFound(format!("place {}", id)));
        }

        log::info!("Deleted place: {}", id);
        Ok(())
    }

    async fn create_spatial_index(&self) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS {} ON places USING GIST (geolocation)",
            PLACES_SPATIAL_INDEX
        ))
        .execute(&self.pool)
        .await
        .map_err(db_error("Create spatial index failed"))?;

        log::info!("Spatial index {} ready", PLACES_SPATIAL_INDEX);
        Ok(())
    }

    async fn drop_spatial_index(&self) -> Result<(), StoreError> {
        sqlx::query(&format!("DROP INDEX IF EXISTS {}", PLACES_SPATIAL_INDEX))
            .execute(&self.pool)
            .await
            .map_err(db_error("Drop spatial index failed"))?;

        log::info!("Spatial index {} dropped", PLACES_SPATIAL_INDEX);
        Ok(())
    }

    async fn has_spatial_index(&self) -> Result<bool, StoreError> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM pg_indexes
                WHERE tablename = 'places' AND indexname = $1
            )
            "#,
        )
        .bind(PLACES_SPATIAL_INDEX)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Spatial index lookup failed"))?;

        Ok(exists)
    }
}
