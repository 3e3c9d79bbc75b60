//! Core types: errors, configuration, the badge data model, and its cache.

pub mod cache;
pub mod clock;
pub mod config;
pub mod errors;
pub mod model;
