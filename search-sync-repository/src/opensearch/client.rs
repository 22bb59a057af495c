//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    cluster::ClusterHealthParts,
    http::request::JsonBody,
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{
        IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesGetMappingParts,
        IndicesPutMappingParts,
    },
    BulkParts, DeleteParts, IndexParts, OpenSearch, SearchParts, UpdateParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::config::IndexConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::index_config::{get_index_settings, mapping_body, physical_index_name};
use crate::types::{BatchOperationResult, BatchOperationSummary, BulkEntry};
use search_sync_shared::{IndexReference, SearchDocument};

/// OpenSearch client implementation.
///
/// # Example
///
/// ```ignore
/// use search_sync_repository::{IndexConfig, OpenSearchClient};
///
/// let client = OpenSearchClient::new("http://localhost:9200", IndexConfig::new("shop")).await?;
/// let reference = IndexReference::new("shop", "products", "42");
/// client.index_document(&reference, &document).await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - Shard and replica settings used when creating indices
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchIndexError)` - If connection setup fails
    pub async fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchIndexError> {
        let parsed_url = Url::parse(url).map_err(|e| SearchIndexError::transport(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::transport(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            index = %index_config.name,
            shards = index_config.number_of_shards,
            replicas = index_config.number_of_replicas,
            "Created OpenSearch client"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    fn physical_index(reference: &IndexReference) -> String {
        physical_index_name(&reference.index, &reference.doc_type)
    }

    /// Pass successful responses through, turn everything else into a
    /// classified error carrying the response body.
    async fn check_response(
        response: Response,
        operation: &str,
    ) -> Result<Response, SearchIndexError> {
        let status = response.status_code();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 404 {
            debug!(operation, body = %body, "Target not found");
        } else {
            error!(operation, status = %status, body = %body, "Request failed");
        }
        Err(SearchIndexError::from_status(status.as_u16(), body))
    }

    async fn send_bulk(
        &self,
        body: Vec<JsonBody<Value>>,
        ids: Vec<String>,
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if ids.is_empty() {
            return Ok(BatchOperationSummary::default());
        }

        let response = self
            .client
            .bulk(BulkParts::None)
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::transport(e.to_string()))?;

        let response = Self::check_response(response, "bulk").await?;
        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        parse_bulk_response(&response_body, &ids)
    }
}

/// Align the `items` of a bulk response with the ids that were sent.
///
/// A delete of a missing document comes back as status 404 without an
/// `error` object, so the status decides success, not the presence of an
/// error.
fn parse_bulk_response(
    body: &Value,
    ids: &[String],
) -> Result<BatchOperationSummary, SearchIndexError> {
    let items = body
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchIndexError::parse("Bulk response has no items"))?;

    if items.len() != ids.len() {
        return Err(SearchIndexError::parse(format!(
            "Bulk response has {} items for {} requests",
            items.len(),
            ids.len()
        )));
    }

    let results = items
        .iter()
        .zip(ids)
        .map(|(item, id)| {
            let outcome = item.as_object().and_then(|o| o.values().next());
            let status = outcome
                .and_then(|o| o.get("status"))
                .and_then(Value::as_u64)
                .unwrap_or(500) as u16;
            let item_error = outcome.and_then(|o| o.get("error"));

            if (200..300).contains(&status) && item_error.is_none() {
                BatchOperationResult::succeeded(id.clone())
            } else {
                let reason = item_error
                    .map(Value::to_string)
                    .unwrap_or_else(|| format!("status {}", status));
                BatchOperationResult::failed(id.clone(), SearchIndexError::from_status(status, reason))
            }
        })
        .collect();

    Ok(BatchOperationSummary::from_results(results))
}

#[async_trait]
impl SearchIndexProvider for OpenSearchClient {
    #[instrument(skip(self, reference, document), fields(reference = %reference))]
    async fn index_document(
        &self,
        reference: &IndexReference,
        document: &SearchDocument,
    ) -> Result<(), SearchIndexError> {
        let index = Self::physical_index(reference);
        let response = self
            .client
            .index(IndexParts::IndexId(&index, &reference.id))
            .body(document.to_value())
            .send()
            .await
            .map_err(|e| SearchIndexError::transport(e.to_string()))?;

        Self::check_response(response, "index").await?;
        debug!(doc_id = %reference.id, index = %index, "Document indexed");
        Ok(())
    }

    /// Partial update; a missing document is reported, never created.
    #[instrument(skip(self, reference, document), fields(reference = %reference))]
    async fn update_document(
        &self,
        reference: &IndexReference,
        document: &SearchDocument,
    ) -> Result<(), SearchIndexError> {
        let index = Self::physical_index(reference);
        let response = self
            .client
            .update(UpdateParts::IndexId(&index, &reference.id))
            .body(json!({ "doc": document.to_value() }))
            .send()
            .await
            .map_err(|e| SearchIndexError::transport(e.to_string()))?;

        Self::check_response(response, "update").await?;
        debug!(doc_id = %reference.id, index = %index, "Document updated");
        Ok(())
    }

    #[instrument(skip(self, reference), fields(reference = %reference))]
    async fn delete_document(&self, reference: &IndexReference) -> Result<(), SearchIndexError> {
        let index = Self::physical_index(reference);
        let response = self
            .client
            .delete(DeleteParts::IndexId(&index, &reference.id))
            .send()
            .await
            .map_err(|e| SearchIndexError::transport(e.to_string()))?;

        Self::check_response(response, "delete").await?;
        debug!(doc_id = %reference.id, index = %index, "Document deleted");
        Ok(())
    }

    #[instrument(skip(self, entries), fields(count = entries.len()))]
    async fn bulk_index_documents(
        &self,
        entries: &[BulkEntry],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(entries.len() * 2);
        for entry in entries {
            body.push(
                json!({"index": {
                    "_index": Self::physical_index(&entry.reference),
                    "_id": entry.reference.id
                }})
                .into(),
            );
            body.push(entry.document.to_value().into());
        }

        let ids = entries.iter().map(|e| e.reference.id.clone()).collect();
        self.send_bulk(body, ids).await
    }

    #[instrument(skip(self, entries), fields(count = entries.len()))]
    async fn bulk_update_documents(
        &self,
        entries: &[BulkEntry],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(entries.len() * 2);
        for entry in entries {
            body.push(
                json!({"update": {
                    "_index": Self::physical_index(&entry.reference),
                    "_id": entry.reference.id
                }})
                .into(),
            );
            body.push(json!({ "doc": entry.document.to_value() }).into());
        }

        let ids = entries.iter().map(|e| e.reference.id.clone()).collect();
        self.send_bulk(body, ids).await
    }

    #[instrument(skip(self, references), fields(count = references.len()))]
    async fn bulk_delete_documents(
        &self,
        references: &[IndexReference],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let body: Vec<JsonBody<Value>> = references
            .iter()
            .map(|reference| {
                json!({"delete": {
                    "_index": Self::physical_index(reference),
                    "_id": reference.id
                }})
                .into()
            })
            .collect();

        let ids = references.iter().map(|r| r.id.clone()).collect();
        self.send_bulk(body, ids).await
    }

    #[instrument(skip(self, body))]
    async fn search(
        &self,
        index: &str,
        doc_type: &str,
        body: &Value,
    ) -> Result<Value, SearchIndexError> {
        let physical = physical_index_name(index, doc_type);
        let response = self
            .client
            .search(SearchParts::Index(&[physical.as_str()]))
            .body(body.clone())
            .send()
            .await
            .map_err(|e| SearchIndexError::transport(e.to_string()))?;

        let response = Self::check_response(response, "search").await?;
        response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))
    }

    #[instrument(skip(self, mapping))]
    async fn ensure_index_exists(
        &self,
        index: &str,
        doc_type: &str,
        mapping: Option<&Value>,
    ) -> Result<(), SearchIndexError> {
        if self.index_exists(index, doc_type).await? {
            debug!(index, doc_type, "Index already exists");
            return Ok(());
        }

        let physical = physical_index_name(index, doc_type);
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&physical))
            .body(get_index_settings(&self.index_config, mapping))
            .send()
            .await
            .map_err(|e| SearchIndexError::transport(e.to_string()))?;

        Self::check_response(response, "create_index").await?;
        info!(index = %physical, "Created search index");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_index(&self, index: &str, doc_type: &str) -> Result<(), SearchIndexError> {
        let physical = physical_index_name(index, doc_type);
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[physical.as_str()]))
            .send()
            .await
            .map_err(|e| SearchIndexError::transport(e.to_string()))?;

        Self::check_response(response, "delete_index").await?;
        info!(index = %physical, "Deleted search index");
        Ok(())
    }

    async fn index_exists(&self, index: &str, doc_type: &str) -> Result<bool, SearchIndexError> {
        let physical = physical_index_name(index, doc_type);
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[physical.as_str()]))
            .send()
            .await
            .map_err(|e| SearchIndexError::transport(e.to_string()))?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            _ => Self::check_response(response, "index_exists").await.map(|_| true),
        }
    }

    #[instrument(skip(self, mapping))]
    async fn put_mapping(
        &self,
        index: &str,
        doc_type: &str,
        mapping: &Value,
    ) -> Result<(), SearchIndexError> {
        let physical = physical_index_name(index, doc_type);
        let response = self
            .client
            .indices()
            .put_mapping(IndicesPutMappingParts::Index(&[physical.as_str()]))
            .body(mapping_body(mapping))
            .send()
            .await
            .map_err(|e| SearchIndexError::transport(e.to_string()))?;

        Self::check_response(response, "put_mapping").await?;
        debug!(index = %physical, "Mapping updated");
        Ok(())
    }

    async fn get_mapping(&self, index: &str, doc_type: &str) -> Result<Value, SearchIndexError> {
        let physical = physical_index_name(index, doc_type);
        let response = self
            .client
            .indices()
            .get_mapping(IndicesGetMappingParts::Index(&[physical.as_str()]))
            .send()
            .await
            .map_err(|e| SearchIndexError::transport(e.to_string()))?;

        let response = Self::check_response(response, "get_mapping").await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        Ok(body
            .get(&physical)
            .and_then(|i| i.get("mappings"))
            .cloned()
            .unwrap_or(body))
    }

    async fn health_check(&self) -> Result<bool, SearchIndexError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| SearchIndexError::transport(e.to_string()))?;

        let response = Self::check_response(response, "health").await?;
        let health: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let status = health
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        debug!(status, "OpenSearch cluster health");

        Ok(status == "green" || status == "yellow")
    }
}
