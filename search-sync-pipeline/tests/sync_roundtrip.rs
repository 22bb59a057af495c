//! End-to-end sync → search → result set flows against the in-memory provider.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use search_sync_pipeline::{
    BulkIndexer, BulkOperation, DocumentMapper, LifecycleHooks, ModelSearch, RecordEvent,
    RecordType, SyncController, SyncError,
};
use search_sync_repository::{
    BatchOperationSummary, BulkEntry, MemoryIndexProvider, SearchIndexError, SearchIndexProvider,
    SearchRequest,
};
use search_sync_shared::{IndexReference, Record, SearchDocument};

const INDEX: &str = "catalog";

fn record_type() -> RecordType {
    RecordType::new("products").with_excluded_fields(["internal_notes"])
}

fn product(id: &str, name: &str) -> Record {
    Record::new("products", id)
        .with_field("id", id)
        .with_field("name", name)
        .with_field("offer_price", 10)
        .with_field("internal_notes", "do not index")
}

struct Fixture {
    provider: Arc<MemoryIndexProvider>,
    controller: Arc<SyncController>,
    bulk: BulkIndexer,
    search: ModelSearch,
}

fn fixture() -> Fixture {
    let provider = Arc::new(MemoryIndexProvider::new());
    let mapper = DocumentMapper::new(record_type());
    Fixture {
        controller: Arc::new(SyncController::new(provider.clone(), INDEX, mapper.clone())),
        bulk: BulkIndexer::new(provider.clone(), INDEX, mapper.clone()),
        search: ModelSearch::new(provider.clone(), INDEX, mapper),
        provider,
    }
}

fn reference(id: &str) -> IndexReference {
    IndexReference::new(INDEX, "products", id)
}

#[tokio::test]
async fn test_to_document_is_deterministic() {
    let mapper = DocumentMapper::new(record_type());
    let record = product(&Uuid::new_v4().to_string(), "Desk");

    assert_eq!(
        mapper.to_document(&record).unwrap(),
        mapper.to_document(&record).unwrap()
    );
}

#[tokio::test]
async fn test_created_record_found_by_search_without_excluded_fields() {
    let fx = fixture();
    let id = Uuid::new_v4().to_string();
    let record = product(&id, "Standing desk");

    fx.controller.on_create(&record).await.unwrap();
    let results = fx.search.ids([id.clone()]).await.unwrap();

    assert_eq!(results.len(), 1);
    let found = &results.results()[0];
    let mut expected = record.fields.clone();
    expected.remove("internal_notes");
    assert_eq!(found.id(), id);
    assert_eq!(found.fields(), &expected);
    assert_eq!(found.version, Some(1));
}

#[tokio::test]
async fn test_delete_twice_is_idempotent() {
    let fx = fixture();
    let record = product("1", "Lamp");
    fx.controller.on_create(&record).await.unwrap();

    fx.controller.on_delete(&record).await.unwrap();
    fx.controller.on_delete(&record).await.unwrap();

    assert!(fx.provider.get_document(&reference("1")).await.is_none());
}

#[tokio::test]
async fn test_update_of_unindexed_record_self_heals() {
    let fx = fixture();
    let record = product("9", "Shelf");

    fx.controller.on_update(&record).await.unwrap();

    let stored = fx.provider.get_document(&reference("9")).await.unwrap();
    assert_eq!(stored.get("name"), Some(&json!("Shelf")));
    assert!(stored.get("internal_notes").is_none());
}

#[tokio::test]
async fn test_limit_never_searches_again() {
    let fx = fixture();
    let records: Vec<Record> = (1..=4).map(|i| product(&i.to_string(), "Chair")).collect();
    fx.bulk.index_all(&records).await.unwrap();

    let results = fx.search.match_query("name", "chair").await.unwrap();
    assert_eq!(fx.provider.search_calls(), 1);

    let limited = results.clone().limit(2);
    assert_eq!(limited.len(), 2);
    assert_eq!(limited.total_hits(), 4);
    assert_eq!(results.take(10).len(), 4);
    assert_eq!(fx.provider.search_calls(), 1);
}

#[tokio::test]
async fn test_bulk_index_with_one_rejected_item() {
    let fx = fixture();
    fx.provider.reject_id("2").await;
    let records = vec![product("1", "A"), product("2", "B"), product("3", "C")];

    let err = match fx.bulk.index_all(&records).await {
        Err(SyncError::Bulk(err)) => err,
        other => panic!("expected bulk error, got {:?}", other),
    };

    assert_eq!(err.operation, BulkOperation::Index);
    assert_eq!(err.attempted, 3);
    assert_eq!(err.failed_ids(), vec!["2"]);
    assert!(fx.provider.get_document(&reference("1")).await.is_some());
    assert!(fx.provider.get_document(&reference("3")).await.is_some());
    assert!(fx.provider.get_document(&reference("2")).await.is_none());
}

#[tokio::test]
async fn test_paginate_five_results_by_two() {
    let fx = fixture();
    let records: Vec<Record> = (1..=5).map(|i| product(&i.to_string(), "Table")).collect();
    fx.bulk.index_all(&records).await.unwrap();

    let results = fx
        .search
        .search(json!({"query": {"match_all": {}}, "size": 5}))
        .await
        .unwrap();
    let paginator = results.paginate(2);

    let sizes: Vec<usize> = paginator.pages().map(|page| page.len()).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
    let first: Vec<&str> = paginator.page(1).items.iter().map(|r| r.id()).collect();
    assert_eq!(first, vec!["1", "2"]);
    assert_eq!(paginator.page(1).last_page, 3);
}

#[tokio::test]
async fn test_paginate_beyond_fetched_hits() {
    let fx = fixture();
    let records: Vec<Record> = (1..=6).map(|i| product(&i.to_string(), "Stool")).collect();
    fx.bulk.index_all(&records).await.unwrap();

    let results = fx
        .search
        .search_by_query(&SearchRequest::new().query(json!({"match_all": {}})).size(2))
        .await
        .unwrap();
    let paginator = results.paginate(2);

    assert_eq!(paginator.total(), 6);
    assert_eq!(paginator.last_page(), 3);
    assert!(paginator.page(2).is_empty());
    assert!(paginator.page(2).has_more_pages());
}

#[tokio::test]
async fn test_lifecycle_hooks_drive_sync() {
    let fx = fixture();
    let mut hooks = LifecycleHooks::new();
    hooks.register_sync(fx.controller.clone());

    let record = product("5", "Cabinet");
    hooks.dispatch(RecordEvent::Created, &record).await.unwrap();
    let renamed = record.clone().with_field("name", "Tall cabinet");
    hooks.dispatch(RecordEvent::Updated, &renamed).await.unwrap();

    let stored = fx.provider.get_document(&reference("5")).await.unwrap();
    assert_eq!(stored.get("name"), Some(&json!("Tall cabinet")));

    hooks.dispatch(RecordEvent::Deleted, &renamed).await.unwrap();
    assert!(fx.provider.get_document(&reference("5")).await.is_none());
}

#[tokio::test]
async fn test_bulk_collection_operations() {
    let fx = fixture();
    let records: Vec<Record> = (1..=3).map(|i| product(&i.to_string(), "Bench")).collect();
    fx.bulk.index_all(&records).await.unwrap();

    let mut overrides = serde_json::Map::new();
    overrides.insert("on_sale".to_string(), json!(true));
    fx.bulk
        .update_all_indexes(&records, Some(&overrides))
        .await
        .unwrap();
    let stored = fx.provider.get_document(&reference("3")).await.unwrap();
    assert_eq!(stored.get("on_sale"), Some(&json!(true)));

    let summary = fx.bulk.remove_all_indexes(&records).await.unwrap();
    assert_eq!(summary.succeeded, 3);
    assert_eq!(fx.provider.document_count(INDEX, "products").await, 0);
}

/// Wraps the in-memory provider and highlights every requested field.
struct HighlightingProvider {
    inner: MemoryIndexProvider,
}

#[async_trait]
impl SearchIndexProvider for HighlightingProvider {
    async fn index_document(
        &self,
        reference: &IndexReference,
        document: &SearchDocument,
    ) -> Result<(), SearchIndexError> {
        self.inner.index_document(reference, document).await
    }

    async fn update_document(
        &self,
        reference: &IndexReference,
        document: &SearchDocument,
    ) -> Result<(), SearchIndexError> {
        self.inner.update_document(reference, document).await
    }

    async fn delete_document(&self, reference: &IndexReference) -> Result<(), SearchIndexError> {
        self.inner.delete_document(reference).await
    }

    async fn bulk_index_documents(
        &self,
        entries: &[BulkEntry],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        self.inner.bulk_index_documents(entries).await
    }

    async fn bulk_update_documents(
        &self,
        entries: &[BulkEntry],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        self.inner.bulk_update_documents(entries).await
    }

    async fn bulk_delete_documents(
        &self,
        references: &[IndexReference],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        self.inner.bulk_delete_documents(references).await
    }

    async fn search(
        &self,
        index: &str,
        doc_type: &str,
        body: &Value,
    ) -> Result<Value, SearchIndexError> {
        let mut response = self.inner.search(index, doc_type, body).await?;
        let fields: Vec<String> = body["highlight"]["fields"]
            .as_object()
            .map(|fields| fields.keys().cloned().collect())
            .unwrap_or_default();

        if let Some(hits) = response["hits"]["hits"].as_array_mut() {
            for hit in hits {
                let mut highlight = serde_json::Map::new();
                for field in &fields {
                    if let Some(value) = hit["_source"].get(field) {
                        let text = value.as_str().map_or_else(|| value.to_string(), String::from);
                        highlight.insert(field.clone(), json!([format!("<em>{}</em>", text)]));
                    }
                }
                hit["highlight"] = Value::Object(highlight);
            }
        }
        Ok(response)
    }

    async fn ensure_index_exists(
        &self,
        index: &str,
        doc_type: &str,
        mapping: Option<&Value>,
    ) -> Result<(), SearchIndexError> {
        self.inner.ensure_index_exists(index, doc_type, mapping).await
    }

    async fn delete_index(&self, index: &str, doc_type: &str) -> Result<(), SearchIndexError> {
        self.inner.delete_index(index, doc_type).await
    }

    async fn index_exists(&self, index: &str, doc_type: &str) -> Result<bool, SearchIndexError> {
        self.inner.index_exists(index, doc_type).await
    }

    async fn put_mapping(
        &self,
        index: &str,
        doc_type: &str,
        mapping: &Value,
    ) -> Result<(), SearchIndexError> {
        self.inner.put_mapping(index, doc_type, mapping).await
    }

    async fn get_mapping(&self, index: &str, doc_type: &str) -> Result<Value, SearchIndexError> {
        self.inner.get_mapping(index, doc_type).await
    }

    async fn health_check(&self) -> Result<bool, SearchIndexError> {
        self.inner.health_check().await
    }
}

#[tokio::test]
async fn test_highlighted_fields_become_derived_attributes() {
    let provider = Arc::new(HighlightingProvider {
        inner: MemoryIndexProvider::new(),
    });
    let mapper = DocumentMapper::new(record_type());
    let controller = SyncController::new(provider.clone(), INDEX, mapper.clone());
    let search = ModelSearch::new(provider, INDEX, mapper);

    controller.on_create(&product("1", "Lamp")).await.unwrap();

    let results = search
        .search_by_query(
            &SearchRequest::new()
                .query(json!({"match": {"name": "lamp"}}))
                .highlight("title")
                .highlight("name")
                .highlight("offer_price"),
        )
        .await
        .unwrap();

    let result = &results.results()[0];
    assert_eq!(result.derived.get("highlightedName"), Some(&json!(["<em>Lamp</em>"])));
    assert_eq!(result.derived.get("highlightedOfferPrice"), Some(&json!(["<em>10</em>"])));
    assert!(result.derived.get("highlightedTitle").is_none());
    assert_eq!(result.attribute("_score"), Some(&json!(1.0)));
    assert!(result.fields().get("highlightedName").is_none());
}
