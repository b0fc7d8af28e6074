// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, database, and run one maintenance command

mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use photo_places::config::{self, Config};
use photo_places::db::{ensure_schema, BlobStore, GeoIndex, PhotoRepository, PlaceRepository};
use photo_places::services::{
    load_places, ExifLocationExtractor, PhotoService, JPEG_CONTENT_TYPE,
};
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Parse arguments (exits with usage on error, before touching the database)
    let cli = Cli::parse();

    // 2. Load configuration (.env is read inside from_env)
    let config = Config::from_env();
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        std::process::exit(2);
    }

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            config.log_level.as_str()
        } else {
            "info,sqlx=warn"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    log::info!("Environment: {}", config.environment);

    // 4. Initialize database connection pool
    let pool = match config::init_db_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };
    ensure_schema(&pool).await?;

    let photos = Arc::new(PhotoRepository::new(pool.clone(), config.chunk_size_bytes)?);
    let places = Arc::new(PlaceRepository::new(pool.clone()));

    // 5. Dispatch
    let result = run(cli.command, &config, photos, places).await;

    pool.close().await;
    log::info!("Database pool closed");
    result
}

async fn run(
    command: Commands,
    config: &Config,
    photos: Arc<PhotoRepository>,
    places: Arc<PlaceRepository>,
) -> anyhow::Result<()> {
    match command {
        Commands::Init => {
            places.create_spatial_index().await?;
            println!("schema ready, spatial index present");
        }

        Commands::DropIndex => {
            places.drop_spatial_index().await?;
            println!("spatial index dropped");
        }

        Commands::LoadPlaces { file } => {
            let reader = File::open(&file)
                .map(BufReader::new)
                .with_context(|| format!("cannot open {}", file.display()))?;
            let summary = load_places(&*places, reader, config.duplicate_policy).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Commands::ImportPhoto {
            file,
            max_distance_m,
        } => {
            let max_distance_m = max_distance_m.unwrap_or(config.nearest_place_max_distance_m);
            let payload =
                std::fs::read(&file).with_context(|| format!("cannot read {}", file.display()))?;
            let service = PhotoService::new(photos, places, Arc::new(ExifLocationExtractor));

            let id = service
                .create_photo(payload, JPEG_CONTENT_TYPE, None)
                .await?;
            let place = service.link_nearest_place(id, max_distance_m).await?;

            match place {
                Some(place_id) => println!("{} -> place {}", id, place_id),
                None => println!("{} (no place within {}m)", id, max_distance_m),
            }
        }

        Commands::ListPhotos { offset, limit } => {
            for photo in photos.list(offset, limit).await? {
                println!("{}", serde_json::to_string(&photo)?);
            }
        }

        Commands::Countries => {
            for name in places.distinct_country_names().await? {
                println!("{}", name);
            }
        }
    }

    Ok(())
}
