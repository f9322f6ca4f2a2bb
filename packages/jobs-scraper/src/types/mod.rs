//! Data types for searches, listings, progress and configuration.

pub mod config;
pub mod listing;
pub mod progress;
pub mod search;
