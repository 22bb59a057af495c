//! Request and response types for bulk index operations.

use search_sync_shared::{IndexReference, SearchDocument};

use crate::errors::SearchIndexError;

/// One document of a bulk index or bulk update request.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkEntry {
    /// Where the document lives.
    pub reference: IndexReference,
    /// The body to index, or the partial body to merge on update.
    pub document: SearchDocument,
}

impl BulkEntry {
    pub fn new(reference: IndexReference, document: SearchDocument) -> Self {
        Self {
            reference,
            document,
        }
    }
}

/// Result of a batch operation for a single item.
///
/// Results are aligned by position with the request items, so the n-th
/// result always describes the n-th entry that was sent.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOperationResult {
    /// The document id the item addressed.
    pub id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error if the operation failed.
    pub error: Option<SearchIndexError>,
}

impl BatchOperationResult {
    pub fn succeeded(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(id: impl Into<String>, error: SearchIndexError) -> Self {
        Self {
            id: id.into(),
            success: false,
            error: Some(error),
        }
    }
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// A summary is returned whenever the engine accepted the bulk request as a
/// whole; per-item failures are reported here rather than as an `Err`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOperationSummary {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each item, in request order.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// Build a summary, counting successes and failures.
    pub fn from_results(results: Vec<BatchOperationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// Iterate over the failed items.
    pub fn failures(&self) -> impl Iterator<Item = &BatchOperationResult> {
        self.results.iter().filter(|r| !r.success)
    }
}
