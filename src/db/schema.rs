// src/db/schema.rs
// DOCUMENTATION: PostgreSQL/PostGIS schema bootstrap
// PURPOSE: Create tables idempotently at startup

use crate::errors::StoreError;
use sqlx::PgPool;

/// Name of the GiST index backing proximity queries
pub const PLACES_SPATIAL_INDEX: &str = "places_geolocation_gist";

const SCHEMA: &[&str] = &[
    "CREATE EXTENSION IF NOT EXISTS postgis",
    r#"
    CREATE TABLE IF NOT EXISTS places (
        id UUID PRIMARY KEY,
        seq BIGSERIAL NOT NULL,
        formatted_address TEXT NOT NULL DEFAULT '',
        address_components JSONB NOT NULL DEFAULT '[]'::jsonb,
        geolocation GEOGRAPHY(Point, 4326) NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS photos (
        id UUID PRIMARY KEY,
        seq BIGSERIAL NOT NULL,
        content_type TEXT NOT NULL,
        length BIGINT NOT NULL,
        chunk_size INTEGER NOT NULL,
        upload_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        location GEOGRAPHY(Point, 4326),
        place_id UUID
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS photo_chunks (
        photo_id UUID NOT NULL REFERENCES photos (id) ON DELETE CASCADE,
        n INTEGER NOT NULL,
        data BYTEA NOT NULL,
        PRIMARY KEY (photo_id, n)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS photos_place_id_idx ON photos (place_id)",
    "CREATE INDEX IF NOT EXISTS photos_seq_idx ON photos (seq)",
    "CREATE INDEX IF NOT EXISTS places_seq_idx ON places (seq)",
];

/// Create every table and secondary index if missing
/// DOCUMENTATION: The spatial index is not created here; it has its own
/// lifecycle through GeoIndex::create_spatial_index / drop_spatial_index.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await.map_err(|e| {
            log::error!("Schema statement failed: {}", e);
            StoreError::DatabaseError(format!("Schema setup failed: {}", e))
        })?;
    }

    log::info!("Database schema ready");
    Ok(())
}
