//! Dependency initialization and wiring for the search sync layer.

use std::sync::Arc;

use tracing::info;

use crate::config::Settings;
use crate::AppError;
use search_sync_pipeline::{
    BulkIndexer, DocumentMapper, IndexAdmin, LifecycleHooks, ModelSearch, RecordType,
    SyncController,
};
use search_sync_repository::{OpenSearchClient, SearchIndexProvider};

/// Container for the configured provider and the settings it was built from.
///
/// Record-type scoped components are created on demand and share the same
/// provider.
pub struct Dependencies {
    provider: Arc<dyn SearchIndexProvider>,
    settings: Settings,
}

impl Dependencies {
    /// Connect to OpenSearch and verify the cluster is healthy.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(AppError)` - If the client cannot be built or the cluster is unhealthy
    pub async fn new(settings: Settings) -> Result<Self, AppError> {
        info!(
            opensearch_url = %settings.opensearch_url,
            index = %settings.index.name,
            "Initializing dependencies"
        );

        let client = OpenSearchClient::new(&settings.opensearch_url, settings.index.clone())
            .await
            .map_err(|e| AppError::config(format!("Failed to create OpenSearch client: {}", e)))?;

        let healthy = client
            .health_check()
            .await
            .map_err(|e| AppError::config(format!("OpenSearch health check failed: {}", e)))?;

        if !healthy {
            return Err(AppError::config("OpenSearch cluster is unhealthy"));
        }

        info!("OpenSearch connection verified");

        Ok(Self::with_provider(Arc::new(client), settings))
    }

    /// Use an already constructed provider.
    pub fn with_provider(provider: Arc<dyn SearchIndexProvider>, settings: Settings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn provider(&self) -> Arc<dyn SearchIndexProvider> {
        self.provider.clone()
    }

    pub fn index_name(&self) -> &str {
        &self.settings.index.name
    }

    /// A record type using the configured highlight flattening.
    pub fn record_type(&self, document_type: impl Into<String>) -> RecordType {
        RecordType::new(document_type)
            .with_flatten_single_highlight(self.settings.flatten_single_highlight)
    }

    pub fn controller(&self, record_type: RecordType) -> SyncController {
        SyncController::new(
            self.provider(),
            self.index_name(),
            DocumentMapper::new(record_type),
        )
    }

    pub fn bulk_indexer(&self, record_type: RecordType) -> BulkIndexer {
        BulkIndexer::new(
            self.provider(),
            self.index_name(),
            DocumentMapper::new(record_type),
        )
    }

    pub fn search(&self, record_type: RecordType) -> ModelSearch {
        ModelSearch::new(
            self.provider(),
            self.index_name(),
            DocumentMapper::new(record_type),
        )
    }

    pub fn admin(&self, record_type: RecordType) -> IndexAdmin {
        IndexAdmin::new(self.provider(), self.index_name(), record_type)
    }

    /// Lifecycle hooks with one sync controller registered per record type.
    pub fn hooks<I>(&self, record_types: I) -> LifecycleHooks
    where
        I: IntoIterator<Item = RecordType>,
    {
        let mut hooks = LifecycleHooks::new();
        for record_type in record_types {
            hooks.register_sync(Arc::new(self.controller(record_type)));
        }
        hooks
    }
}
