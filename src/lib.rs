//! Sitelog - a jobsite work log and estimating library.
//!
//! This library provides the core functionality for the `slg` CLI tool:
//! job and task bookkeeping, persistence with schema migration, photo
//! re-encoding, and the summary/estimate aggregation.

pub mod action_log;
pub mod cli;
pub mod commands;
pub mod config;
pub mod images;
pub mod models;
pub mod state;
pub mod store;
pub mod summary;


/// Library-level error type for sitelog operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Store is full: {0}")]
    StoreFull(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported schema version: {0}")]
    UnsupportedSchema(u32),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for sitelog operations.
pub type Result<T> = std::result::Result<T, Error>;
