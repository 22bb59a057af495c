//! OpenSearch implementation of the search index provider.
//!
//! This module provides a concrete implementation of `SearchIndexProvider`
//! using OpenSearch as the backend, together with the request bodies it
//! understands.

mod client;
mod index_config;
pub mod queries;

pub use client::OpenSearchClient;
pub use index_config::{get_index_settings, mapping_body, physical_index_name};
