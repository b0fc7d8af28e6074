// src/cli.rs
// DOCUMENTATION: Command line definition for the photo-places binary
// PURPOSE: One maintenance command per invocation, parsed with clap derive

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "photo-places")]
#[command(about = "Geotagged photo storage and place index maintenance", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Create the schema and the places spatial index
    Init,
    /// Drop the places spatial index
    DropIndex,
    /// Bulk load a JSON place dataset (one document or an array per value)
    LoadPlaces {
        file: PathBuf,
    },
    /// Store a JPEG and link it to the nearest place
    ImportPhoto {
        file: PathBuf,
        /// Search radius in meters (default: NEAREST_PLACE_MAX_DISTANCE_M)
        max_distance_m: Option<f64>,
    },
    /// List stored photos in insertion order
    ListPhotos {
        offset: Option<usize>,
        limit: Option<usize>,
    },
    /// List distinct country names across all places
    Countries,
}
