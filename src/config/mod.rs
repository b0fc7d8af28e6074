// src/config/mod.rs
// DOCUMENTATION: Process configuration
// PURPOSE: Environment settings and the database pool built from them

pub mod db;
pub mod env;

pub use db::init_db_pool;
pub use env::Config;
