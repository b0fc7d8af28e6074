// src/models/mod.rs
// DOCUMENTATION: Models module organization
// PURPOSE: Re-export model components

pub mod ids;
pub mod photo;
pub mod place;
pub mod point;

pub use ids::*;
pub use photo::*;
pub use place::*;
pub use point::*;
