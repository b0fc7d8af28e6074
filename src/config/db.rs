// src/config/db.rs
// DOCUMENTATION: PostgreSQL pool construction
// PURPOSE: One PgPool per process, shared by the photo and place repositories

use crate::config::Config;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Idle connections are released after this long
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Connections are recycled after this long regardless of use
const POOL_MAX_LIFETIME: Duration = Duration::from_secs(1800);

/// Open the pool described by `config` and check that the server answers
/// DOCUMENTATION: Repositories receive clones of the returned pool; the
/// binary closes it before exiting. PostGIS itself is checked later by
/// ensure_schema.
pub async fn init_db_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    log::info!(
        "Connecting to database (max {} connections, {}s acquire timeout)",
        config.db_max_connections,
        config.db_connection_timeout
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connection_timeout))
        .idle_timeout(POOL_IDLE_TIMEOUT)
        .max_lifetime(POOL_MAX_LIFETIME)
        .connect(&config.database_url)
        .await?;

    let (version,): (String,) = sqlx::query_as("SELECT version()")
        .fetch_one(&pool)
        .await?;
    log::debug!("Connected to {}", version);

    Ok(pool)
}
