//! Search module for the search sync pipeline.
//!
//! Record-type scoped search entry. The index name comes from configuration
//! and the document type from the record type; callers never supply either.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::errors::SyncError;
use crate::mapper::DocumentMapper;
use crate::results::ResultSet;
use search_sync_repository::{
    FuzzyQuery, GeoShapeQuery, IdsQuery, MatchQuery, MoreLikeThisQuery, MultiMatchQuery,
    QueryShorthand, SearchIndexProvider, SearchRequest,
};

/// Caller parameters that address the index and are always replaced.
const RESERVED_PARAMS: [&str; 2] = ["index", "type"];

/// Search over the documents of one record type.
pub struct ModelSearch {
    provider: Arc<dyn SearchIndexProvider>,
    index: String,
    mapper: DocumentMapper,
}

impl ModelSearch {
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

    pub fn mapper(&self) -> &DocumentMapper {
        &self.mapper
    }

    /// Run a search from raw parameters.
    ///
    /// `params` is either the request body itself or an object wrapping it
    /// under `body`. Top-level `index` and `type` entries are dropped.
    #[instrument(skip(self, params), fields(document_type = %self.mapper.document_type()))]
    pub async fn search(&self, params: Value) -> Result<ResultSet, SyncError> {
        let body = request_body(params);
        self.execute(&body).await
    }

    /// Run a search built with [`SearchRequest`].
    #[instrument(skip(self, request), fields(document_type = %self.mapper.document_type()))]
    pub async fn search_by_query(&self, request: &SearchRequest) -> Result<ResultSet, SyncError> {
        self.execute(&request.to_body()).await
    }

    /// Run a search from any query shorthand.
    pub async fn search_shorthand<Q>(&self, shorthand: &Q) -> Result<ResultSet, SyncError>
    where
        Q: QueryShorthand + Sync + ?Sized,
    {
        self.execute(&shorthand.to_body()).await
    }

    pub async fn match_query(
        &self,
        field: impl Into<String>,
        query: impl Into<Value>,
    ) -> Result<ResultSet, SyncError> {
        self.search_shorthand(&MatchQuery::new(field, query)).await
    }

    pub async fn multi_match<I, S>(
        &self,
        fields: I,
        query: impl Into<Value>,
    ) -> Result<ResultSet, SyncError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_shorthand(&MultiMatchQuery::new(fields, query)).await
    }

    /// Fuzzy search with the default `AUTO` fuzziness.
    pub async fn fuzzy(
        &self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<ResultSet, SyncError> {
        self.search_shorthand(&FuzzyQuery::new(field, value)).await
    }

    /// Geo shape search with the default `envelope` shape type.
    pub async fn geo_shape(
        &self,
        field: impl Into<String>,
        coordinates: Value,
    ) -> Result<ResultSet, SyncError> {
        self.search_shorthand(&GeoShapeQuery::new(field, coordinates)).await
    }

    pub async fn ids<I, S>(&self, values: I) -> Result<ResultSet, SyncError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_shorthand(&IdsQuery::new(values)).await
    }

    /// More-like-this search with default term settings.
    pub async fn more_like_this<F, S, I, T>(&self, fields: F, ids: I) -> Result<ResultSet, SyncError>
    where
        F: IntoIterator<Item = S>,
        S: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.search_shorthand(&MoreLikeThisQuery::new(fields, ids)).await
    }

    /// Convert every result into a typed model.
    pub fn to_models<T: DeserializeOwned>(&self, results: &ResultSet) -> Result<Vec<T>, SyncError> {
        results
            .iter()
            .map(|result| self.mapper.to_model(result).map_err(SyncError::from))
            .collect()
    }

    async fn execute(&self, body: &Value) -> Result<ResultSet, SyncError> {
        let response = self
            .provider
            .search(&self.index, self.mapper.document_type(), body)
            .await?;
        let results = ResultSet::from_response(response, &self.mapper)?;

        debug!(
            fetched = results.len(),
            total_hits = results.total_hits(),
            "Search completed"
        );
        Ok(results)
    }
}

/// Extract the request body from raw search parameters.
fn request_body(params: Value) -> Value {
    let Value::Object(mut params) = params else {
        return Value::Object(Map::new());
    };

    for name in RESERVED_PARAMS {
        if params.remove(name).is_some() {
            warn!(param = name, "Ignoring caller supplied search parameter");
        }
    }

    match params.remove("body") {
        Some(Value::Object(body)) => Value::Object(body),
        Some(other) => {
            params.insert("body".to_string(), other);
            Value::Object(params)
        }
        None => Value::Object(params),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::RecordType;
    use crate::sync::SyncController;
    use async_trait::async_trait;
    use search_sync_repository::{
        BatchOperationSummary, BulkEntry, MemoryIndexProvider, SearchIndexError,
    };
    use search_sync_shared::{IndexReference, Record, SearchDocument};
    use serde::Deserialize;
    use serde_json::json;
    use tokio::sync::Mutex;

    /// Provider that records every search call and answers with a fixed response.
    struct CapturingProvider {
        response: Value,
        calls: Mutex<Vec<(String, String, Value)>>,
    }

    impl CapturingProvider {
        fn new(response: Value) -> Self {
            Self {
                response,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SearchIndexProvider for CapturingProvider {
        async fn index_document(&self, _: &IndexReference, _: &SearchDocument) -> Result<(), SearchIndexError> {
            Ok(())
        }
        async fn update_document(&self, _: &IndexReference, _: &SearchDocument) -> Result<(), SearchIndexError> {
            Ok(())
        }
        async fn delete_document(&self, _: &IndexReference) -> Result<(), SearchIndexError> {
            Ok(())
        }
        async fn bulk_index_documents(&self, _: &[BulkEntry]) -> Result<BatchOperationSummary, SearchIndexError> {
            Ok(BatchOperationSummary::default())
        }
        async fn bulk_update_documents(&self, _: &[BulkEntry]) -> Result<BatchOperationSummary, SearchIndexError> {
            Ok(BatchOperationSummary::default())
        }
        async fn bulk_delete_documents(&self, _: &[IndexReference]) -> Result<BatchOperationSummary, SearchIndexError> {
            Ok(BatchOperationSummary::default())
        }
        async fn search(&self, index: &str, doc_type: &str, body: &Value) -> Result<Value, SearchIndexError> {
            self.calls
                .lock()
                .await
                .push((index.to_string(), doc_type.to_string(), body.clone()));
            Ok(self.response.clone())
        }
        async fn ensure_index_exists(&self, _: &str, _: &str, _: Option<&Value>) -> Result<(), SearchIndexError> {
            Ok(())
        }
        async fn delete_index(&self, _: &str, _: &str) -> Result<(), SearchIndexError> {
            Ok(())
        }
        async fn index_exists(&self, _: &str, _: &str) -> Result<bool, SearchIndexError> {
            Ok(true)
        }
        async fn put_mapping(&self, _: &str, _: &str, _: &Value) -> Result<(), SearchIndexError> {
            Ok(())
        }
        async fn get_mapping(&self, _: &str, _: &str) -> Result<Value, SearchIndexError> {
            Ok(json!({}))
        }
        async fn health_check(&self) -> Result<bool, SearchIndexError> {
            Ok(true)
        }
    }

    fn empty_response() -> Value {
        json!({"took": 1, "timed_out": false, "hits": {"total": {"value": 0}, "max_score": null, "hits": []}})
    }

    fn model_search(provider: Arc<dyn SearchIndexProvider>) -> ModelSearch {
        ModelSearch::new(provider, "shop", DocumentMapper::new(RecordType::new("products")))
    }

    #[test]
    fn test_request_body_strips_index_and_type() {
        let body = request_body(json!({
            "index": "other",
            "type": "users",
            "query": {"match_all": {}}
        }));
        assert_eq!(body, json!({"query": {"match_all": {}}}));
    }

    #[test]
    fn test_request_body_unwraps_body() {
        let body = request_body(json!({
            "index": "other",
            "body": {"query": {"ids": {"values": ["1"]}}, "size": 5}
        }));
        assert_eq!(body, json!({"query": {"ids": {"values": ["1"]}}, "size": 5}));
    }

    #[tokio::test]
    async fn test_search_injects_index_and_type() {
        let provider = Arc::new(CapturingProvider::new(empty_response()));
        let search = model_search(provider.clone());

        let results = search
            .search(json!({"index": "other", "type": "users", "query": {"match_all": {}}}))
            .await
            .unwrap();

        assert!(results.is_empty());
        let calls = provider.calls.lock().await;
        assert_eq!(calls[0].0, "shop");
        assert_eq!(calls[0].1, "products");
        assert_eq!(calls[0].2, json!({"query": {"match_all": {}}}));
    }

    #[tokio::test]
    async fn test_shorthands_send_complete_bodies() {
        let provider = Arc::new(CapturingProvider::new(empty_response()));
        let search = model_search(provider.clone());

        search.match_query("name", "lamp").await.unwrap();
        search.multi_match(["name", "description"], "lamp").await.unwrap();
        search.fuzzy("name", "lmap").await.unwrap();
        search
            .geo_shape("location", json!([[13.0, 53.0], [14.0, 52.0]]))
            .await
            .unwrap();
        search.ids(["1", "2"]).await.unwrap();
        search.more_like_this(["name"], ["1"]).await.unwrap();

        let calls = provider.calls.lock().await;
        let bodies: Vec<&Value> = calls.iter().map(|(_, _, body)| body).collect();
        assert_eq!(*bodies[0], json!({"query": {"match": {"name": "lamp"}}}));
        assert_eq!(
            *bodies[1],
            json!({"query": {"multi_match": {"fields": ["name", "description"], "query": "lamp"}}})
        );
        assert_eq!(
            *bodies[2],
            json!({"query": {"fuzzy": {"name": {"value": "lmap", "fuzziness": "AUTO"}}}})
        );
        assert_eq!(
            bodies[3]["query"]["geo_shape"]["location"]["shape"]["type"],
            json!("envelope")
        );
        assert_eq!(*bodies[4], json!({"query": {"ids": {"values": ["1", "2"]}}}));
        assert_eq!(
            bodies[5]["query"]["more_like_this"]["minimum_should_match"],
            json!(0.5)
        );
        assert!(calls.iter().all(|(index, doc_type, _)| index == "shop" && doc_type == "products"));
    }

    #[tokio::test]
    async fn test_search_by_query_and_to_models() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Product {
            id: String,
            name: String,
        }

        let provider = Arc::new(MemoryIndexProvider::new());
        let mapper = DocumentMapper::new(RecordType::new("products"));
        let controller = SyncController::new(provider.clone(), "shop", mapper.clone());
        controller
            .index(&Record::new("products", "1").with_field("name", "Lamp"))
            .await
            .unwrap();
        controller
            .index(&Record::new("products", "2").with_field("name", "Chair"))
            .await
            .unwrap();

        let search = ModelSearch::new(provider, "shop", mapper);
        let results = search
            .search_by_query(&SearchRequest::new().query(json!({"match": {"name": "chair"}})))
            .await
            .unwrap();
        let products: Vec<Product> = search.to_models(&results).unwrap();

        assert_eq!(
            products,
            vec![Product {
                id: "2".to_string(),
                name: "Chair".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_search_unknown_index_is_not_found() {
        let search = model_search(Arc::new(MemoryIndexProvider::new()));
        let err = search.match_query("name", "lamp").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
