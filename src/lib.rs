// src/lib.rs
// DOCUMENTATION: Library root
// PURPOSE: Chunked photo storage and a geo index of places, composed by PhotoService

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod services;

pub use errors::StoreError;
