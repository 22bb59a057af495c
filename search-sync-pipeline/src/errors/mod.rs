//! Error types for the search sync pipeline.

use std::fmt;

use search_sync_repository::SearchIndexError;
use thiserror::Error;

/// A record or hit could not be converted.
///
/// Always a data-shape mismatch between the record schema and what is
/// stored in the index; never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    /// Neither the record nor the hit carries an id.
    #[error("Missing record id")]
    MissingId,

    /// A field the record type requires is absent from the hit source.
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// The record belongs to another document type than the mapper's.
    #[error("Record type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// The hit source is not a JSON object.
    #[error("Invalid hit source: {0}")]
    InvalidSource(String),

    /// The search response does not have the expected shape.
    #[error("Invalid search response: {0}")]
    InvalidResponse(String),

    /// Converting fields into a typed model failed.
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl MappingError {
    /// Create a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    /// Create an invalid source error.
    pub fn invalid_source(msg: impl Into<String>) -> Self {
        Self::InvalidSource(msg.into())
    }

    /// Create an invalid response error.
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

/// Which collection operation a [`BulkSyncError`] comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOperation {
    Index,
    Update,
    Delete,
    Reindex,
}

impl fmt::Display for BulkOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Index => "index",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Reindex => "reindex",
        };
        f.write_str(name)
    }
}

/// Why a single item of a bulk operation failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ItemError {
    #[error(transparent)]
    SearchIndex(#[from] SearchIndexError),

    #[error(transparent)]
    Mapping(#[from] MappingError),
}

/// One failed item of a bulk operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkFailure {
    /// Id of the record the item was built from.
    pub id: String,
    /// The underlying failure.
    pub error: ItemError,
}

impl BulkFailure {
    pub fn new(id: impl Into<String>, error: impl Into<ItemError>) -> Self {
        Self {
            id: id.into(),
            error: error.into(),
        }
    }
}

/// Aggregate failure of a bulk operation.
///
/// Raised only after every item of the batch was attempted. Items not listed
/// in `failures` were synced.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Bulk {operation} failed for {} of {attempted} records", .failures.len())]
pub struct BulkSyncError {
    pub operation: BulkOperation,
    /// Number of records handed to the operation.
    pub attempted: usize,
    /// Failed items, in input order.
    pub failures: Vec<BulkFailure>,
}

impl BulkSyncError {
    /// Ids of the failed records, in input order.
    pub fn failed_ids(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.id.as_str()).collect()
    }
}

/// Errors that can occur while syncing records or reading results back.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// Error reported by the search index provider.
    #[error("Search index error: {0}")]
    SearchIndex(#[from] SearchIndexError),

    /// Error converting between records and documents.
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// One or more items of a bulk operation failed.
    #[error("Bulk sync error: {0}")]
    Bulk(#[from] BulkSyncError),
}

impl SyncError {
    /// Whether this is a provider-reported not-found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SearchIndex(e) if e.is_not_found())
    }
}
