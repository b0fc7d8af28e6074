// src/db/photo_repository.rs
// DOCUMENTATION: Photo database operations
// PURPOSE: Chunked photo storage on PostgreSQL (photos + photo_chunks tables)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::blob_store::{validate_new_blob, BlobStore};
use super::chunking::{reassemble, split_payload, Chunk};
use crate::errors::StoreError;
use crate::models::{Photo, PhotoBlob, PhotoId, PhotoMetadata, PlaceId, Point};

/// Internal struct for mapping photo rows
/// DOCUMENTATION: Handles PostGIS POINT extraction via ST_X() and ST_Y()
#[derive(Debug, FromRow)]
struct PhotoRow {
    id: Uuid,
    content_type: String,
    length: i64,
    chunk_size: i32,
    upload_date: DateTime<Utc>,
    longitude: Option<f64>, // From ST_X(location)
    latitude: Option<f64>,  // From ST_Y(location)
    place_id: Option<Uuid>,
}

impl PhotoRow {
    fn to_photo(self) -> Result<Photo, StoreError> {
        let location = match (self.longitude, self.latitude) {
            (Some(lng), Some(lat)) => Some(Point::new(lng, lat)?),
            _ => None,
        };

        Ok(Photo {
            id: PhotoId::from(self.id),
            content_type: self.content_type,
            length: self.length.max(0) as u64,
            chunk_size: self.chunk_size.max(0) as usize,
            upload_date: self.upload_date,
            metadata: PhotoMetadata {
                location,
                place: self.place_id.map(PlaceId::from),
            },
        })
    }
}

#[derive(Debug, FromRow)]
struct ChunkRow {
    n: i32,
    data: Vec<u8>,
}

const SELECT_PHOTO: &str = r#"
    SELECT
        id, content_type, length, chunk_size, upload_date,
        ST_X(location::geometry) AS longitude, ST_Y(location::geometry) AS latitude,
        place_id
    FROM photos
"#;

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |e| {
        log::error!("{}: {}", context, e);
        StoreError::DatabaseError(format!("{}: {}", context, e))
    }
}

/// PhotoRepository: blob store backed by PostgreSQL
/// DOCUMENTATION: Create and delete run in one transaction each; reads of the
/// payload run in a REPEATABLE READ transaction so a concurrent delete is
/// either fully visible (NotFound) or not at all.
pub struct PhotoRepository {
    pool: PgPool,
    chunk_size: usize,
}

impl PhotoRepository {
    pub fn new(pool: PgPool, chunk_size: usize) -> Result<Self, StoreError> {
        if chunk_size == 0 || chunk_size > i32::MAX as usize {
            return Err(StoreError::InvalidInput(format!(
                "chunk size {} is out of range",
                chunk_size
            )));
        }
        Ok(Self { pool, chunk_size })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BlobStore for PhotoRepository {
    async fn create(
        &self,
        payload: Vec<u8>,
        content_type: &str,
        metadata: PhotoMetadata,
    ) -> Result<PhotoId, StoreError> {
        validate_new_blob(&payload, content_type)?;

        let id = PhotoId::new();
        let chunks = split_payload(&payload, self.chunk_size);
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Begin create photo failed"))?;

        sqlx::query(
            r#"
            INSERT INTO photos (
                id, content_type, length, chunk_size, upload_date, location, place_id
            )
            VALUES (
                $1, $2, $3, $4, NOW(),
                ST_SetSRID(ST_MakePoint($5, $6), 4326)::geography,
                $7
            )
            "#,
        )
        .bind(id)
        .bind(content_type)
        .bind(payload.len() as i64)
        .bind(self.chunk_size as i32)
        .bind(metadata.location.map(|p| p.longitude())) // $5 - longitude
        .bind(metadata.location.map(|p| p.latitude())) // $6 - latitude
        .bind(metadata.place)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Create photo failed"))?;

        for chunk in &chunks {
            sqlx::query("INSERT INTO photo_chunks (photo_id, n, data) VALUES ($1, $2, $3)")
                .bind(id)
                .bind(chunk.n as i32)
                .bind(&chunk.data)
                .execute(&mut *tx)
                .await
                .map_err(db_error("Insert photo chunk failed"))?;
        }

        tx.commit()
            .await
            .map_err(db_error("Commit create photo failed"))?;

        log::info!(
            "Stored photo {} ({} bytes in {} chunks)",
            id,
            payload.len(),
            chunks.len()
        );
        Ok(id)
    }

    async fn update_metadata(
        &self,
        id: PhotoId,
        metadata: PhotoMetadata,
    ) -> Result<(), StoreError> {
        let rows = sqlx::query(
            r#"
            UPDATE photos
            SET location = ST_SetSRID(ST_MakePoint($2, $3), 4326)::geography,
                place_id = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(metadata.location.map(|p| p.longitude()))
        .bind(metadata.location.map(|p| p.latitude()))
        .bind(metadata.place)
        .execute(&self.pool)
        .await
        .map_err(db_error("Update photo metadata failed"))?
        .rows_affected();

        if rows == 0 {
            return Err(StoreError::NotFound(format!("photo {}", id)));
        }

        log::debug!("Updated metadata for photo {}", id);
        Ok(())
    }

    async fn update_place(&self, id: PhotoId, place: Option<PlaceId>) -> Result<(), StoreError> {
        let rows = sqlx::query("UPDATE photos SET place_id = $2 WHERE id = $1")
            .bind(id)
            .bind(place)
            .execute(&self.pool)
            .await
            .map_err(db_error("Update photo place failed"))?
            .rows_affected();

        if rows == 0 {
            return Err(StoreError::NotFound(format!("photo {}", id)));
        }

        log::debug!("Updated place reference for photo {}", id);
        Ok(())
    }

    async fn get(&self, id: PhotoId) -> Result<PhotoBlob, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Begin read photo failed"))?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await
            .map_err(db_error("Set isolation failed"))?;

        let photo = sqlx::query_as::<_, PhotoRow>(&format!("{} WHERE id = $1", SELECT_PHOTO))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("Fetch photo failed"))?
            .ok_or_else(|| StoreError::NotFound(format!("photo {}", id)))?
            .to_photo()?;

        let rows = sqlx::query_as::<_, ChunkRow>(
            "SELECT n, data FROM photo_chunks WHERE photo_id = $1 ORDER BY n",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error("Fetch photo chunks failed"))?;

        tx.commit()
            .await
            .map_err(db_error("Commit read photo failed"))?;

        let mut chunks = Vec::with_capacity(rows.len());
        for row in rows {
            let n = u32::try_from(row.n).map_err(|_| StoreError::CorruptBlob {
                id: id.to_string(),
                reason: format!("negative chunk number {}", row.n),
            })?;
            chunks.push(Chunk { n, data: row.data });
        }

        let payload = reassemble(&photo, chunks).map_err(|e| {
            log::error!("Failed to reassemble photo {}: {}", id, e);
            e
        })?;

        Ok(PhotoBlob { photo, payload })
    }

    async fn find(&self, id: PhotoId) -> Result<Photo, StoreError> {
        sqlx::query_as::<_, PhotoRow>(&format!("{} WHERE id = $1", SELECT_PHOTO))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Fetch photo failed"))?
            .ok_or_else(|| StoreError::NotFound(format!("photo {}", id)))?
            .to_photo()
    }

    async fn list(
        &self,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<Photo>, StoreError> {
        // LIMIT NULL is LIMIT ALL
        let rows = sqlx::query_as::<_, PhotoRow>(&format!(
            "{} ORDER BY seq ASC OFFSET $1 LIMIT $2",
            SELECT_PHOTO
        ))
        .bind(offset.unwrap_or(0) as i64)
        .bind(limit.map(|l| l.min(i64::MAX as usize) as i64))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("List photos failed"))?;

        rows.into_iter().map(PhotoRow::to_photo).collect()
    }

    async fn find_by_place(&self, place: PlaceId) -> Result<Vec<Photo>, StoreError> {
        let rows = sqlx::query_as::<_, PhotoRow>(&format!(
            "{} WHERE place_id = $1 ORDER BY seq ASC",
            SELECT_PHOTO
        ))
        .bind(place)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Fetch photos for place failed"))?;

        rows.into_iter().map(PhotoRow::to_photo).collect()
    }

    async fn delete(&self, id: PhotoId) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Begin delete photo failed"))?;

        let chunks = sqlx::query("DELETE FROM photo_chunks WHERE photo_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Delete photo chunks failed"))?
            .rows_affected();

        let rows = sqlx::query("DELETE FROM photos WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Delete photo failed"))?
            .rows_affected();

        if rows == 0 {
            tx.rollback()
                .await
                .map_err(db_error("Rollback delete photo failed"))?;
            return Err(StoreError::NotFound(format!("photo {}", id)));
        }

        tx.commit()
            .await
            .map_err(db_error("Commit delete photo failed"))?;

        log::info!("Deleted photo {} and {} chunks", id, chunks);
        Ok(())
    }
}
