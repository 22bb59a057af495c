//! Single-record sync controller.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::errors::SyncError;
use crate::mapper::DocumentMapper;
use crate::sync::hooks::RecordObserver;
use search_sync_repository::SearchIndexProvider;
use search_sync_shared::{FieldMap, IndexReference, Record, SearchDocument};

/// Keeps the index copy of one record type in step with the relational store.
///
/// The controller is invoked after a persistence operation has completed. It
/// never writes back to the store, and a failure here never rolls back the
/// persisted change.
pub struct SyncController {
    provider: Arc<dyn SearchIndexProvider>,
    index: String,
    mapper: DocumentMapper,
}

impl SyncController {
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

    pub fn index_name(&self) -> &str {
        &self.index
    }

    pub fn mapper(&self) -> &DocumentMapper {
        &self.mapper
    }

    pub fn document_type(&self) -> &str {
        self.mapper.document_type()
    }

    /// Index a record right after it was created.
    #[instrument(skip(self, record), fields(id = %record.id, document_type = %record.record_type))]
    pub async fn on_create(&self, record: &Record) -> Result<(), SyncError> {
        self.index(record).await
    }

    /// Sync a record right after it was updated.
    ///
    /// A record that is missing from the index is indexed in full instead.
    #[instrument(skip(self, record), fields(id = %record.id, document_type = %record.record_type))]
    pub async fn on_update(&self, record: &Record) -> Result<(), SyncError> {
        self.update_index(record, None).await
    }

    /// Remove a record right after it was deleted.
    ///
    /// Deleting a document that is not in the index succeeds.
    #[instrument(skip(self, record), fields(id = %record.id, document_type = %record.record_type))]
    pub async fn on_delete(&self, record: &Record) -> Result<(), SyncError> {
        self.remove_index(record).await
    }

    /// Index the full document for `record`, replacing any previous copy.
    pub async fn index(&self, record: &Record) -> Result<(), SyncError> {
        let (reference, document) = self.prepare(record)?;

        self.provider.index_document(&reference, &document).await?;

        debug!(reference = %reference, "Record indexed");
        Ok(())
    }

    /// Update the index copy of `record`.
    ///
    /// `overrides` are merged over the persisted fields for this call only;
    /// the record itself is not modified. When the engine reports the
    /// document as missing, the merged record is indexed in full.
    pub async fn update_index(
        &self,
        record: &Record,
        overrides: Option<&FieldMap>,
    ) -> Result<(), SyncError> {
        let merged;
        let record = match overrides {
            Some(overrides) => {
                merged = record.merged(overrides);
                &merged
            }
            None => record,
        };
        let (reference, document) = self.prepare(record)?;

        match self.provider.update_document(&reference, &document).await {
            Ok(()) => {
                debug!(reference = %reference, "Record updated in index");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                warn!(reference = %reference, "Record missing from index on update, indexing it");
                self.provider.index_document(&reference, &document).await?;
                info!(reference = %reference, "Record re-indexed after missing update");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the index copy of `record`.
    pub async fn remove_index(&self, record: &Record) -> Result<(), SyncError> {
        let reference = self.reference(record)?;

        match self.provider.delete_document(&reference).await {
            Ok(()) => {
                debug!(reference = %reference, "Record removed from index");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!(reference = %reference, "Record already absent from index");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn reference(&self, record: &Record) -> Result<IndexReference, SyncError> {
        Ok(self.mapper.reference(&self.index, record)?)
    }

    fn prepare(&self, record: &Record) -> Result<(IndexReference, SearchDocument), SyncError> {
        let reference = self.reference(record)?;
        let document = self.mapper.to_document(record)?;
        Ok((reference, document))
    }
}

#[async_trait]
impl RecordObserver for SyncController {
    async fn after_create(&self, record: &Record) -> Result<(), SyncError> {
        self.on_create(record).await
    }

    async fn after_update(&self, record: &Record) -> Result<(), SyncError> {
        self.on_update(record).await
    }

    async fn after_delete(&self, record: &Record) -> Result<(), SyncError> {
        self.on_delete(record).await
    }
}
