//! Admin module for the search sync pipeline.
//!
//! Index lifecycle for one record type: creation with the type's mapping,
//! mapping updates and teardown.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument};

use crate::errors::SyncError;
use crate::mapper::RecordType;
use search_sync_repository::{SearchIndexError, SearchIndexProvider};

/// Administers the index holding the documents of one record type.
pub struct IndexAdmin {
    provider: Arc<dyn SearchIndexProvider>,
    index: String,
    record_type: RecordType,
}

impl IndexAdmin {
    pub fn new(
        provider: Arc<dyn SearchIndexProvider>,
        index: impl Into<String>,
        record_type: RecordType,
    ) -> Self {
        Self {
            provider,
            index: index.into(),
            record_type,
        }
    }

    /// Create the index with the record type's mapping, if it is missing.
    #[instrument(skip(self), fields(index = %self.index, document_type = %self.record_type.document_type))]
    pub async fn ensure_index(&self) -> Result<(), SyncError> {
        self.provider
            .ensure_index_exists(
                &self.index,
                &self.record_type.document_type,
                self.record_type.mapping.as_ref(),
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(index = %self.index, document_type = %self.record_type.document_type))]
    pub async fn delete_index(&self) -> Result<(), SyncError> {
        self.provider
            .delete_index(&self.index, &self.record_type.document_type)
            .await?;
        info!("Index deleted");
        Ok(())
    }

    pub async fn index_exists(&self) -> Result<bool, SyncError> {
        Ok(self
            .provider
            .index_exists(&self.index, &self.record_type.document_type)
            .await?)
    }

    /// Push the record type's mapping to the existing index.
    pub async fn put_mapping(&self) -> Result<(), SyncError> {
        let mapping = self.record_type.mapping.as_ref().ok_or_else(|| {
            SearchIndexError::validation(format!(
                "record type {} has no mapping",
                self.record_type.document_type
            ))
        })?;
        self.provider
            .put_mapping(&self.index, &self.record_type.document_type, mapping)
            .await?;
        Ok(())
    }

    pub async fn get_mapping(&self) -> Result<Value, SyncError> {
        Ok(self
            .provider
            .get_mapping(&self.index, &self.record_type.document_type)
            .await?)
    }

    /// Drop the index and create it again, empty, with the current mapping.
    #[instrument(skip(self), fields(index = %self.index, document_type = %self.record_type.document_type))]
    pub async fn rebuild_index(&self) -> Result<(), SyncError> {
        match self
            .provider
            .delete_index(&self.index, &self.record_type.document_type)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }
        self.ensure_index().await?;
        info!("Index rebuilt");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<bool, SyncError> {
        Ok(self.provider.health_check().await?)
    }
}
