//! # Search Sync
//!
//! Entry point for the record to search index sync layer.
//!
//! This crate reads configuration from the environment, installs tracing and
//! builds the provider-backed components of `search-sync-pipeline`.

pub mod config;
pub mod telemetry;

pub use config::{Dependencies, LogConfig, LogFormat, Settings};

use thiserror::Error;

/// Errors that can occur while configuring or running the sync layer.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Sync or search error.
    #[error("Sync error: {0}")]
    Sync(#[from] search_sync_pipeline::SyncError),

    /// Search index error.
    #[error("Search index error: {0}")]
    SearchIndex(#[from] search_sync_repository::SearchIndexError),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
