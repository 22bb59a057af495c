//! In-memory implementation of the search index provider.
//!
//! Keeps one ordered document list per (index, document type) pair and
//! mirrors the engine's not-found semantics, so sync logic can be exercised
//! without a running cluster. Search support is small:
//! `match_all`, `ids`, `term` and single-field `match` queries, plus
//! `from`/`size` paging.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::{mapping_body, physical_index_name};
use crate::types::{BatchOperationResult, BatchOperationSummary, BulkEntry};
use search_sync_shared::{FieldMap, IndexReference, SearchDocument};

/// Default `size` of a search request without one.
const DEFAULT_SEARCH_SIZE: usize = 10;

#[derive(Debug, Clone)]
struct StoredDocument {
    id: String,
    source: FieldMap,
    version: i64,
}

#[derive(Debug, Default)]
struct MemoryIndex {
    mapping: Option<Value>,
    documents: Vec<StoredDocument>,
}

impl MemoryIndex {
    fn position(&self, id: &str) -> Option<usize> {
        self.documents.iter().position(|d| d.id == id)
    }
}

type IndexKey = (String, String);

/// In-memory search index provider.
#[derive(Debug, Default)]
pub struct MemoryIndexProvider {
    indices: RwLock<HashMap<IndexKey, MemoryIndex>>,
    rejected_ids: RwLock<HashSet<String>>,
    search_calls: AtomicUsize,
}

impl MemoryIndexProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later mutation of document `id` fail with an engine error.
    pub async fn reject_id(&self, id: impl Into<String>) {
        self.rejected_ids.write().await.insert(id.into());
    }

    /// Number of search requests served so far.
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Number of documents stored for a document type.
    pub async fn document_count(&self, index: &str, doc_type: &str) -> usize {
        self.indices
            .read()
            .await
            .get(&key(index, doc_type))
            .map_or(0, |i| i.documents.len())
    }

    /// Source of a stored document, if present.
    pub async fn get_document(&self, reference: &IndexReference) -> Option<FieldMap> {
        let indices = self.indices.read().await;
        let index = indices.get(&key(&reference.index, &reference.doc_type))?;
        index
            .position(&reference.id)
            .map(|pos| index.documents[pos].source.clone())
    }

    async fn check_rejected(&self, id: &str) -> Result<(), SearchIndexError> {
        if self.rejected_ids.read().await.contains(id) {
            return Err(SearchIndexError::engine(
                Some(400),
                format!("document {} rejected", id),
            ));
        }
        Ok(())
    }

    async fn store(
        &self,
        reference: &IndexReference,
        document: &SearchDocument,
    ) -> Result<(), SearchIndexError> {
        self.check_rejected(&reference.id).await?;

        let mut indices = self.indices.write().await;
        let index = indices
            .entry(key(&reference.index, &reference.doc_type))
            .or_default();

        match index.position(&reference.id) {
            Some(pos) => {
                let stored = &mut index.documents[pos];
                stored.source = document.fields().clone();
                stored.version += 1;
            }
            None => index.documents.push(StoredDocument {
                id: reference.id.clone(),
                source: document.fields().clone(),
                version: 1,
            }),
        }
        Ok(())
    }

    async fn merge(
        &self,
        reference: &IndexReference,
        document: &SearchDocument,
    ) -> Result<(), SearchIndexError> {
        self.check_rejected(&reference.id).await?;

        let mut indices = self.indices.write().await;
        let stored = indices
            .get_mut(&key(&reference.index, &reference.doc_type))
            .and_then(|index| {
                index
                    .position(&reference.id)
                    .map(move |pos| &mut index.documents[pos])
            })
            .ok_or_else(|| SearchIndexError::document_not_found(reference.to_string()))?;

        for (name, value) in document.fields() {
            stored.source.insert(name.clone(), value.clone());
        }
        stored.version += 1;
        Ok(())
    }

    async fn remove(&self, reference: &IndexReference) -> Result<(), SearchIndexError> {
        self.check_rejected(&reference.id).await?;

        let mut indices = self.indices.write().await;
        let index = indices
            .get_mut(&key(&reference.index, &reference.doc_type))
            .ok_or_else(|| SearchIndexError::document_not_found(reference.to_string()))?;
        let pos = index
            .position(&reference.id)
            .ok_or_else(|| SearchIndexError::document_not_found(reference.to_string()))?;

        index.documents.remove(pos);
        Ok(())
    }
}

/// The `properties` object of a mapping, whether or not it is wrapped.
fn properties(mapping: &Value) -> Value {
    mapping_body(mapping)
        .get("properties")
        .cloned()
        .unwrap_or_else(|| json!({}))
}

fn key(index: &str, doc_type: &str) -> IndexKey {
    (index.to_string(), doc_type.to_string())
}

fn summarize(ids: Vec<String>, outcomes: Vec<Result<(), SearchIndexError>>) -> BatchOperationSummary {
    let results = ids
        .into_iter()
        .zip(outcomes)
        .map(|(id, outcome)| match outcome {
            Ok(()) => BatchOperationResult::succeeded(id),
            Err(e) => BatchOperationResult::failed(id, e),
        })
        .collect();
    BatchOperationSummary::from_results(results)
}

/// Whether a stored document satisfies a query clause.
fn matches_query(document: &StoredDocument, query: Option<&Value>) -> Result<bool, SearchIndexError> {
    let Some(query) = query else {
        return Ok(true);
    };
    let clause = query
        .as_object()
        .and_then(|o| o.iter().next())
        .ok_or_else(|| SearchIndexError::engine(Some(400), "query must be an object"))?;

    let (kind, body) = clause;

    match kind.as_str() {
        "match_all" => Ok(true),
        "ids" => Ok(body
            .get("values")
            .and_then(Value::as_array)
            .is_some_and(|values| values.iter().any(|v| v.as_str() == Some(document.id.as_str())))),
        "term" => {
            let (field, expected) = single_field(body)?;
            let expected = expected.get("value").unwrap_or(expected);
            Ok(document.source.get(field) == Some(expected))
        }
        "match" => {
            let (field, expected) = single_field(body)?;
            let expected = expected.get("query").unwrap_or(expected);
            Ok(document
                .source
                .get(field)
                .is_some_and(|actual| text_matches(actual, expected)))
        }
        other => Err(SearchIndexError::engine(
            Some(400),
            format!("query type {} is not supported in memory", other),
        )),
    }
}

fn single_field(body: &Value) -> Result<(&String, &Value), SearchIndexError> {
    body.as_object()
        .and_then(|o| o.iter().next())
        .ok_or_else(|| SearchIndexError::engine(Some(400), "query clause names no field"))
}

/// Any query term contained in the field value, case-insensitively.
fn text_matches(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::String(actual), Value::String(expected)) => {
            let actual = actual.to_lowercase();
            expected
                .split_whitespace()
                .any(|term| actual.contains(&term.to_lowercase()))
        }
        (Value::Array(items), _) => items.iter().any(|item| text_matches(item, expected)),
        _ => actual == expected,
    }
}

fn usize_param(body: &Value, name: &str, default: usize) -> usize {
    body.get(name)
        .and_then(Value::as_u64)
        .map_or(default, |v| v as usize)
}

#[async_trait]
impl SearchIndexProvider for MemoryIndexProvider {
    async fn index_document(
        &self,
        reference: &IndexReference,
        document: &SearchDocument,
    ) -> Result<(), SearchIndexError> {
        self.store(reference, document).await?;
        debug!(reference = %reference, "Document indexed in memory");
        Ok(())
    }

    async fn update_document(
        &self,
        reference: &IndexReference,
        document: &SearchDocument,
    ) -> Result<(), SearchIndexError> {
        self.merge(reference, document).await
    }

    async fn delete_document(&self, reference: &IndexReference) -> Result<(), SearchIndexError> {
        self.remove(reference).await
    }

    async fn bulk_index_documents(
        &self,
        entries: &[BulkEntry],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let mut outcomes = Vec::with_capacity(entries.len());
        for entry in entries {
            outcomes.push(self.store(&entry.reference, &entry.document).await);
        }
        let ids = entries.iter().map(|e| e.reference.id.clone()).collect();
        Ok(summarize(ids, outcomes))
    }

    async fn bulk_update_documents(
        &self,
        entries: &[BulkEntry],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let mut outcomes = Vec::with_capacity(entries.len());
        for entry in entries {
            outcomes.push(self.merge(&entry.reference, &entry.document).await);
        }
        let ids = entries.iter().map(|e| e.reference.id.clone()).collect();
        Ok(summarize(ids, outcomes))
    }

    async fn bulk_delete_documents(
        &self,
        references: &[IndexReference],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let mut outcomes = Vec::with_capacity(references.len());
        for reference in references {
            outcomes.push(self.remove(reference).await);
        }
        let ids = references.iter().map(|r| r.id.clone()).collect();
        Ok(summarize(ids, outcomes))
    }

    async fn search(
        &self,
        index: &str,
        doc_type: &str,
        body: &Value,
    ) -> Result<Value, SearchIndexError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);

        let indices = self.indices.read().await;
        let stored = indices.get(&key(index, doc_type)).ok_or_else(|| {
            SearchIndexError::document_not_found(format!("no such index [{}]", physical_index_name(index, doc_type)))
        })?;

        let mut matched = Vec::new();
        for document in &stored.documents {
            if matches_query(document, body.get("query"))? {
                matched.push(document);
            }
        }

        let from = usize_param(body, "from", 0);
        let size = usize_param(body, "size", DEFAULT_SEARCH_SIZE);
        let hits: Vec<Value> = matched
            .iter()
            .skip(from)
            .take(size)
            .map(|document| {
                json!({
                    "_index": physical_index_name(index, doc_type),
                    "_id": document.id,
                    "_score": 1.0,
                    "_version": document.version,
                    "_source": Value::Object(document.source.clone())
                })
            })
            .collect();

        let max_score = if hits.is_empty() { Value::Null } else { json!(1.0) };

        Ok(json!({
            "took": 0,
            "timed_out": false,
            "_shards": {"total": 1, "successful": 1, "skipped": 0, "failed": 0},
            "hits": {
                "total": {"value": matched.len(), "relation": "eq"},
                "max_score": max_score,
                "hits": hits
            }
        }))
    }

    async fn ensure_index_exists(
        &self,
        index: &str,
        doc_type: &str,
        mapping: Option<&Value>,
    ) -> Result<(), SearchIndexError> {
        let mut indices = self.indices.write().await;
        let entry = indices.entry(key(index, doc_type)).or_default();
        if entry.mapping.is_none() {
            entry.mapping = mapping.map(properties);
        }
        Ok(())
    }

    async fn delete_index(&self, index: &str, doc_type: &str) -> Result<(), SearchIndexError> {
        self.indices
            .write()
            .await
            .remove(&key(index, doc_type))
            .map(|_| ())
            .ok_or_else(|| {
                SearchIndexError::document_not_found(physical_index_name(index, doc_type))
            })
    }

    async fn index_exists(&self, index: &str, doc_type: &str) -> Result<bool, SearchIndexError> {
        Ok(self.indices.read().await.contains_key(&key(index, doc_type)))
    }

    async fn put_mapping(
        &self,
        index: &str,
        doc_type: &str,
        mapping: &Value,
    ) -> Result<(), SearchIndexError> {
        let mut indices = self.indices.write().await;
        let entry = indices.get_mut(&key(index, doc_type)).ok_or_else(|| {
            SearchIndexError::document_not_found(physical_index_name(index, doc_type))
        })?;

        let mut merged = match entry.mapping.take() {
            Some(Value::Object(existing)) => existing,
            _ => Map::new(),
        };
        if let Value::Object(added) = properties(mapping) {
            merged.extend(added);
        }
        entry.mapping = Some(Value::Object(merged));
        Ok(())
    }

    async fn get_mapping(&self, index: &str, doc_type: &str) -> Result<Value, SearchIndexError> {
        let indices = self.indices.read().await;
        let entry = indices.get(&key(index, doc_type)).ok_or_else(|| {
            SearchIndexError::document_not_found(physical_index_name(index, doc_type))
        })?;
        Ok(json!({ "properties": entry.mapping.clone().unwrap_or_else(|| json!({})) }))
    }

    async fn health_check(&self) -> Result<bool, SearchIndexError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(id: &str) -> IndexReference {
        IndexReference::new("test", "articles", id)
    }

    fn document(value: Value) -> SearchDocument {
        match value {
            Value::Object(fields) => SearchDocument::new(fields),
            _ => SearchDocument::default(),
        }
    }

    #[tokio::test]
    async fn test_index_then_update_merges() {
        let provider = MemoryIndexProvider::new();
        provider
            .index_document(&reference("1"), &document(json!({"title": "a", "body": "b"})))
            .await
            .unwrap();
        provider
            .update_document(&reference("1"), &document(json!({"title": "c"})))
            .await
            .unwrap();

        let stored = provider.get_document(&reference("1")).await.unwrap();
        assert_eq!(stored.get("title"), Some(&json!("c")));
        assert_eq!(stored.get("body"), Some(&json!("b")));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let provider = MemoryIndexProvider::new();
        let result = provider
            .update_document(&reference("1"), &document(json!({"title": "c"})))
            .await;
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let provider = MemoryIndexProvider::new();
        let result = provider.delete_document(&reference("1")).await;
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_rejected_id_fails_in_bulk() {
        let provider = MemoryIndexProvider::new();
        provider.reject_id("2").await;

        let entries: Vec<BulkEntry> = ["1", "2", "3"]
            .iter()
            .map(|id| BulkEntry::new(reference(id), document(json!({"n": id}))))
            .collect();
        let summary = provider.bulk_index_documents(&entries).await.unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failures().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["2"]);
        assert_eq!(provider.document_count("test", "articles").await, 2);
    }

    #[tokio::test]
    async fn test_search_match_and_paging() {
        let provider = MemoryIndexProvider::new();
        for (id, title) in [("1", "Red lamp"), ("2", "Blue chair"), ("3", "Red chair")] {
            provider
                .index_document(&reference(id), &document(json!({"title": title})))
                .await
                .unwrap();
        }

        let response = provider
            .search("test", "articles", &json!({"query": {"match": {"title": "red"}}, "size": 1}))
            .await
            .unwrap();

        assert_eq!(response["hits"]["total"]["value"], 2);
        let hits = response["hits"]["hits"].as_array().unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["_id"], "1");
        assert_eq!(provider.search_calls(), 1);
    }

    #[tokio::test]
    async fn test_search_ids_query() {
        let provider = MemoryIndexProvider::new();
        for id in ["1", "2", "3"] {
            provider
                .index_document(&reference(id), &document(json!({})))
                .await
                .unwrap();
        }

        let response = provider
            .search("test", "articles", &json!({"query": {"ids": {"values": ["3", "1"]}}}))
            .await
            .unwrap();

        assert_eq!(response["hits"]["total"]["value"], 2);
    }

    #[tokio::test]
    async fn test_search_unknown_index() {
        let provider = MemoryIndexProvider::new();
        let result = provider.search("test", "missing", &json!({})).await;
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_mapping_lifecycle() {
        let provider = MemoryIndexProvider::new();
        assert!(!provider.index_exists("test", "articles").await.unwrap());

        provider
            .ensure_index_exists("test", "articles", Some(&json!({"title": {"type": "text"}})))
            .await
            .unwrap();
        provider
            .put_mapping("test", "articles", &json!({"views": {"type": "integer"}}))
            .await
            .unwrap();

        let mapping = provider.get_mapping("test", "articles").await.unwrap();
        assert_eq!(mapping["properties"]["title"]["type"], "text");
        assert_eq!(mapping["properties"]["views"]["type"], "integer");

        provider.delete_index("test", "articles").await.unwrap();
        assert!(!provider.index_exists("test", "articles").await.unwrap());
    }

    #[tokio::test]
    async fn test_wrapped_mapping_is_not_nested() {
        let provider = MemoryIndexProvider::new();

        provider
            .ensure_index_exists(
                "test",
                "articles",
                Some(&json!({"properties": {"title": {"type": "text"}}})),
            )
            .await
            .unwrap();
        provider
            .put_mapping(
                "test",
                "articles",
                &json!({"properties": {"views": {"type": "integer"}}}),
            )
            .await
            .unwrap();

        let mapping = provider.get_mapping("test", "articles").await.unwrap();
        assert_eq!(
            mapping,
            json!({"properties": {
                "title": {"type": "text"},
                "views": {"type": "integer"}
            }})
        );
    }
}
