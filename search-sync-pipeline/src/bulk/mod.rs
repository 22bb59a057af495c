//! Bulk module for the search sync pipeline.
//!
//! Syncs ordered collections of records with one bulk request per operation.
//! Every item is attempted; per-item failures are collected into a single
//! [`BulkSyncError`] raised after the whole batch was sent.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::errors::{BulkFailure, BulkOperation, BulkSyncError, SyncError};
use crate::mapper::DocumentMapper;
use search_sync_repository::{
    BatchOperationResult, BatchOperationSummary, BulkEntry, SearchIndexError, SearchIndexProvider,
};
use search_sync_shared::{FieldMap, IndexReference, Record};

/// Collection-level sync for one record type.
///
/// Batch sizing is the caller's concern: each call sends exactly one bulk
/// request holding every mappable record it was given.
pub struct BulkIndexer {
    provider: Arc<dyn SearchIndexProvider>,
    index: String,
    mapper: DocumentMapper,
}

/// Outcome slot for one input record.
enum Slot {
    Sent,
    Failed(BulkFailure),
}

impl BulkIndexer {
    pub fn new(
        provider: Arc<dyn SearchIndexProvider>,
        index: impl Into<String>,
        mapper: DocumentMapper,
    ) -> Self {
        Self {
            provider,
            index: index.into(),
            mapper,
        }
    }

    /// Index every record in one bulk request.
    #[instrument(skip(self, records), fields(count = records.len(), document_type = %self.mapper.document_type()))]
    pub async fn index_all(&self, records: &[Record]) -> Result<BatchOperationSummary, SyncError> {
        let (slots, entries) = self.prepare_entries(records.iter());
        if entries.is_empty() {
            return self.finish(BulkOperation::Index, records, slots, None);
        }

        let summary = self.provider.bulk_index_documents(&entries).await?;
        self.finish(BulkOperation::Index, records, slots, Some(summary))
    }

    /// Update every record in one bulk request.
    ///
    /// `overrides` are merged over each record's fields for this call only.
    /// A record missing from the index is reported as a failure.
    #[instrument(skip(self, records, overrides), fields(count = records.len(), document_type = %self.mapper.document_type()))]
    pub async fn update_all_indexes(
        &self,
        records: &[Record],
        overrides: Option<&FieldMap>,
    ) -> Result<BatchOperationSummary, SyncError> {
        let merged: Vec<Record> = match overrides {
            Some(overrides) => records.iter().map(|r| r.merged(overrides)).collect(),
            None => Vec::new(),
        };
        let source: &[Record] = if overrides.is_some() { &merged } else { records };

        let (slots, entries) = self.prepare_entries(source.iter());
        if entries.is_empty() {
            return self.finish(BulkOperation::Update, records, slots, None);
        }

        let summary = self.provider.bulk_update_documents(&entries).await?;
        self.finish(BulkOperation::Update, records, slots, Some(summary))
    }

    /// Remove every record in one bulk request.
    ///
    /// Records already absent from the index count as removed.
    #[instrument(skip(self, records), fields(count = records.len(), document_type = %self.mapper.document_type()))]
    pub async fn remove_all_indexes(
        &self,
        records: &[Record],
    ) -> Result<BatchOperationSummary, SyncError> {
        let mut slots = Vec::with_capacity(records.len());
        let mut references: Vec<IndexReference> = Vec::with_capacity(records.len());
        for record in records {
            match self.mapper.reference(&self.index, record) {
                Ok(reference) => {
                    references.push(reference);
                    slots.push(Slot::Sent);
                }
                Err(e) => slots.push(Slot::Failed(BulkFailure::new(record.id.clone(), e))),
            }
        }
        if references.is_empty() {
            return self.finish(BulkOperation::Delete, records, slots, None);
        }

        let mut summary = self.provider.bulk_delete_documents(&references).await?;
        let mut absent = 0;
        for result in summary.results.iter_mut() {
            if result.error.as_ref().is_some_and(|e| e.is_not_found()) {
                *result = BatchOperationResult::succeeded(result.id.clone());
                absent += 1;
            }
        }
        if absent > 0 {
            debug!(absent = absent, "Records already absent from index");
            summary = BatchOperationSummary::from_results(summary.results);
        }

        self.finish(BulkOperation::Delete, records, slots, Some(summary))
    }

    /// Remove then re-add every record.
    ///
    /// Every record goes through the index phase, whatever the outcome of its
    /// removal. Failures of both phases are reported as one `Reindex` error
    /// holding one failure per record, the index phase taking precedence.
    pub async fn reindex(&self, records: &[Record]) -> Result<BatchOperationSummary, SyncError> {
        info!(count = records.len(), document_type = %self.mapper.document_type(), "Reindexing records");

        let remove_failures = match self.remove_all_indexes(records).await {
            Ok(_) => Vec::new(),
            Err(SyncError::Bulk(e)) => {
                warn!(failed = e.failures.len(), "Reindex remove phase had failures, indexing anyway");
                e.failures
            }
            Err(e) => return Err(e),
        };
        let index_failures = match self.index_all(records).await {
            Ok(summary) if remove_failures.is_empty() => return Ok(summary),
            Ok(_) => Vec::new(),
            Err(SyncError::Bulk(e)) => e.failures,
            Err(e) => return Err(e),
        };

        Err(BulkSyncError {
            operation: BulkOperation::Reindex,
            attempted: records.len(),
            failures: merge_failures(records, remove_failures, index_failures),
        }
        .into())
    }

    fn prepare_entries<'a>(
        &self,
        records: impl Iterator<Item = &'a Record>,
    ) -> (Vec<Slot>, Vec<BulkEntry>) {
        let mut slots = Vec::new();
        let mut entries = Vec::new();
        for record in records {
            let entry = self.mapper.reference(&self.index, record).and_then(|reference| {
                self.mapper
                    .to_document(record)
                    .map(|document| BulkEntry::new(reference, document))
            });
            match entry {
                Ok(entry) => {
                    entries.push(entry);
                    slots.push(Slot::Sent);
                }
                Err(e) => {
                    warn!(id = %record.id, error = %e, "Record could not be mapped");
                    slots.push(Slot::Failed(BulkFailure::new(record.id.clone(), e)));
                }
            }
        }
        (slots, entries)
    }

    /// Merge mapping failures and engine outcomes back into input order.
    fn finish(
        &self,
        operation: BulkOperation,
        records: &[Record],
        slots: Vec<Slot>,
        summary: Option<BatchOperationSummary>,
    ) -> Result<BatchOperationSummary, SyncError> {
        let mut sent = summary.map(|s| s.results).unwrap_or_default().into_iter();
        let mut results = Vec::with_capacity(records.len());
        let mut failures = Vec::new();

        for (record, slot) in records.iter().zip(slots) {
            match slot {
                Slot::Failed(failure) => failures.push(failure),
                Slot::Sent => {
                    let result = sent.next().unwrap_or_else(|| {
                        BatchOperationResult::failed(
                            record.id.clone(),
                            SearchIndexError::parse("bulk response is missing an item"),
                        )
                    });
                    if !result.success {
                        let e = result
                            .error
                            .clone()
                            .unwrap_or_else(|| SearchIndexError::engine(None, "bulk item failed"));
                        failures.push(BulkFailure::new(record.id.clone(), e));
                    }
                    results.push(result);
                }
            }
        }

        let summary = BatchOperationSummary::from_results(results);
        if failures.is_empty() {
            info!(operation = %operation, count = summary.total, "Bulk sync completed");
            return Ok(summary);
        }

        error!(
            operation = %operation,
            failed = failures.len(),
            attempted = records.len(),
            "Bulk sync finished with failures"
        );
        Err(BulkSyncError {
            operation,
            attempted: records.len(),
            failures,
        }
        .into())
    }
}

/// One failure per record, in input order, preferring `primary` over `secondary`.
fn merge_failures(
    records: &[Record],
    mut secondary: Vec<BulkFailure>,
    mut primary: Vec<BulkFailure>,
) -> Vec<BulkFailure> {
    records
        .iter()
        .filter_map(|record| {
            let from_primary = take_failure(&mut primary, &record.id);
            let from_secondary = take_failure(&mut secondary, &record.id);
            from_primary.or(from_secondary)
        })
        .collect()
}

fn take_failure(failures: &mut Vec<BulkFailure>, id: &str) -> Option<BulkFailure> {
    let pos = failures.iter().position(|f| f.id == id)?;
    Some(failures.remove(pos))
}
