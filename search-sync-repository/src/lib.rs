//! # Search Sync Repository
//!
//! This crate provides the adapter boundary between the sync layer and the
//! search engine. It includes the error taxonomy, the `SearchIndexProvider`
//! trait, an OpenSearch implementation, an in-memory implementation and the
//! builders for search request bodies.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod opensearch;
pub mod types;

pub use config::IndexConfig;
pub use errors::SearchIndexError;
pub use interfaces::SearchIndexProvider;
pub use memory::MemoryIndexProvider;
pub use opensearch::queries::{
    FuzzyQuery, GeoShapeQuery, IdsQuery, MatchQuery, MoreLikeThisQuery, MultiMatchQuery,
    QueryShorthand, SearchRequest,
};
pub use opensearch::OpenSearchClient;
pub use types::{BatchOperationResult, BatchOperationSummary, BulkEntry};
