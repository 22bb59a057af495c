//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, in-memory, etc.).

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchIndexError;
use crate::types::{BatchOperationSummary, BulkEntry};
use search_sync_shared::{IndexReference, SearchDocument};

/// Abstracts the underlying search engine (OpenSearch, in-memory, etc.).
///
/// Every document operation is addressed by an [`IndexReference`]; searches and
/// index administration are addressed by the (index, document type) pair. The
/// provider only transports bodies and classifies failures. It never retries
/// and never swallows a `DocumentNotFound`: deciding what a missing document
/// means is the caller's job.
///
/// Implementations are injected wherever they are needed (`Arc<dyn
/// SearchIndexProvider>`), never reached through a global.
///
/// # Errors
///
/// * `TransportError` - the engine could not be reached
/// * `DocumentNotFound` - the addressed document or index does not exist
/// * `EngineError` - the engine rejected the operation
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Index a single document, replacing any document with the same id.
    ///
    /// # Arguments
    ///
    /// * `reference` - Where the document lives
    /// * `document` - The full document body
    async fn index_document(
        &self,
        reference: &IndexReference,
        document: &SearchDocument,
    ) -> Result<(), SearchIndexError>;

    /// Merge `document` into an existing document.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the document was updated
    /// * `Err(SearchIndexError::DocumentNotFound)` - If the document doesn't exist
    /// * `Err(SearchIndexError)` - If the update fails
    async fn update_document(
        &self,
        reference: &IndexReference,
        document: &SearchDocument,
    ) -> Result<(), SearchIndexError>;

    /// Delete a document.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the document was deleted
    /// * `Err(SearchIndexError::DocumentNotFound)` - If the document doesn't exist
    /// * `Err(SearchIndexError)` - If the deletion fails
    async fn delete_document(&self, reference: &IndexReference) -> Result<(), SearchIndexError>;

    /// Index many documents in one request.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Per-item outcomes aligned with `entries`
    /// * `Err(SearchIndexError)` - If the bulk request failed as a whole
    async fn bulk_index_documents(
        &self,
        entries: &[BulkEntry],
    ) -> Result<BatchOperationSummary, SearchIndexError>;

    /// Partially update many documents in one request.
    ///
    /// Missing documents are reported per item as `DocumentNotFound`.
    async fn bulk_update_documents(
        &self,
        entries: &[BulkEntry],
    ) -> Result<BatchOperationSummary, SearchIndexError>;

    /// Delete many documents in one request.
    ///
    /// Missing documents are reported per item as `DocumentNotFound`.
    async fn bulk_delete_documents(
        &self,
        references: &[IndexReference],
    ) -> Result<BatchOperationSummary, SearchIndexError>;

    /// Run a search request body against one document type.
    ///
    /// # Arguments
    ///
    /// * `index` - Logical index name
    /// * `doc_type` - Document type the search is scoped to
    /// * `body` - The request body (query, size, highlight, ...)
    ///
    /// # Returns
    ///
    /// * `Ok(Value)` - The raw engine response
    /// * `Err(SearchIndexError)` - If the search fails
    async fn search(
        &self,
        index: &str,
        doc_type: &str,
        body: &Value,
    ) -> Result<Value, SearchIndexError>;

    /// Create the index for a document type if it does not exist yet.
    ///
    /// `mapping` is a `properties` mapping applied on creation.
    async fn ensure_index_exists(
        &self,
        index: &str,
        doc_type: &str,
        mapping: Option<&Value>,
    ) -> Result<(), SearchIndexError>;

    /// Drop the index for a document type, with every document in it.
    async fn delete_index(&self, index: &str, doc_type: &str) -> Result<(), SearchIndexError>;

    /// Whether the index for a document type exists.
    async fn index_exists(&self, index: &str, doc_type: &str) -> Result<bool, SearchIndexError>;

    /// Add or extend the `properties` mapping of a document type.
    async fn put_mapping(
        &self,
        index: &str,
        doc_type: &str,
        mapping: &Value,
    ) -> Result<(), SearchIndexError>;

    /// Read the current mapping of a document type.
    async fn get_mapping(&self, index: &str, doc_type: &str) -> Result<Value, SearchIndexError>;

    /// Check if the search engine is healthy and reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the search engine is healthy
    /// * `Ok(false)` - If the search engine is unhealthy
    /// * `Err(SearchIndexError)` - If the health check fails to execute
    async fn health_check(&self) -> Result<bool, SearchIndexError>;
}
