//! Mapped view of one search response.

use std::slice;
use std::vec;

use serde_json::Value;
use tracing::debug;

use crate::errors::MappingError;
use crate::mapper::DocumentMapper;
use crate::results::{Paginator, DEFAULT_PER_PAGE};
use search_sync_shared::{MappedResult, SearchHit};

/// The results of a single search call.
///
/// Every hit is mapped once, when the set is built. Limiting, paging and
/// iteration all work on those in-memory results and never query the engine
/// again.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    results: Vec<MappedResult>,
    hits: Vec<Value>,
    total_hits: u64,
    max_score: Option<f64>,
    took: Option<u64>,
    timed_out: bool,
    shards: Option<Value>,
    aggregations: Option<Value>,
}

impl ResultSet {
    /// Map a raw search response.
    ///
    /// `hits.total` may be a number or an object carrying `value`. When it is
    /// absent the number of returned hits is used.
    pub fn from_response(response: Value, mapper: &DocumentMapper) -> Result<Self, MappingError> {
        let Value::Object(mut response) = response else {
            return Err(MappingError::invalid_response("response is not an object"));
        };
        let Some(Value::Object(mut hits_section)) = response.remove("hits") else {
            return Err(MappingError::invalid_response("missing hits section"));
        };

        let hits = match hits_section.remove("hits") {
            Some(Value::Array(hits)) => hits,
            None => Vec::new(),
            Some(_) => return Err(MappingError::invalid_response("hits.hits is not an array")),
        };

        let mut results = Vec::with_capacity(hits.len());
        for raw in &hits {
            let hit: SearchHit = serde_json::from_value(raw.clone())
                .map_err(|e| MappingError::invalid_response(format!("malformed hit: {}", e)))?;
            results.push(mapper.from_hit(&hit)?);
        }

        let total_hits = hits_section
            .get("total")
            .and_then(|total| total.as_u64().or_else(|| total.get("value")?.as_u64()))
            .unwrap_or(hits.len() as u64);

        debug!(
            fetched = results.len(),
            total_hits = total_hits,
            document_type = %mapper.document_type(),
            "Mapped search response"
        );

        Ok(Self {
            results,
            hits,
            total_hits,
            max_score: hits_section.get("max_score").and_then(Value::as_f64),
            took: response.get("took").and_then(Value::as_u64),
            timed_out: response
                .get("timed_out")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            shards: response.remove("_shards"),
            aggregations: response.remove("aggregations"),
        })
    }

    /// Number of fetched results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Total hit count reported by the engine.
    pub fn total_hits(&self) -> u64 {
        self.total_hits
    }

    pub fn max_score(&self) -> Option<f64> {
        self.max_score
    }

    /// Milliseconds the engine spent on the search.
    pub fn took(&self) -> Option<u64> {
        self.took
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    pub fn shards(&self) -> Option<&Value> {
        self.shards.as_ref()
    }

    pub fn aggregations(&self) -> Option<&Value> {
        self.aggregations.as_ref()
    }

    /// Raw hits, aligned with the mapped results.
    pub fn hits(&self) -> &[Value] {
        &self.hits
    }

    pub fn results(&self) -> &[MappedResult] {
        &self.results
    }

    pub fn get(&self, position: usize) -> Option<&MappedResult> {
        self.results.get(position)
    }

    pub fn iter(&self) -> slice::Iter<'_, MappedResult> {
        self.results.iter()
    }

    /// Keep only the first `n` results. The total hit count is unchanged.
    pub fn limit(mut self, n: usize) -> Self {
        self.results.truncate(n);
        self.hits.truncate(n);
        self
    }

    /// Alias of [`ResultSet::limit`].
    pub fn take(self, n: usize) -> Self {
        self.limit(n)
    }

    /// Split the fetched results into pages of `per_page`.
    pub fn paginate(self, per_page: usize) -> Paginator {
        Paginator::new(self.results, self.total_hits, per_page)
    }

    /// [`ResultSet::paginate`] with [`DEFAULT_PER_PAGE`].
    pub fn paginate_default(self) -> Paginator {
        self.paginate(DEFAULT_PER_PAGE)
    }

    pub fn into_results(self) -> Vec<MappedResult> {
        self.results
    }
}

impl IntoIterator for ResultSet {
    type Item = MappedResult;
    type IntoIter = vec::IntoIter<MappedResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a MappedResult;
    type IntoIter = slice::Iter<'a, MappedResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::RecordType;
    use serde_json::json;

    fn mapper() -> DocumentMapper {
        DocumentMapper::new(RecordType::new("articles"))
    }

    fn response(count: usize, total: Value) -> Value {
        let hits: Vec<Value> = (1..=count)
            .map(|i| {
                json!({
                    "_index": "blog-articles",
                    "_id": i.to_string(),
                    "_score": 1.0 / i as f64,
                    "_source": {"title": format!("Article {}", i)}
                })
            })
            .collect();
        json!({
            "took": 4,
            "timed_out": false,
            "_shards": {"total": 1, "successful": 1, "skipped": 0, "failed": 0},
            "hits": {"total": total, "max_score": 1.0, "hits": hits},
            "aggregations": {"tags": {"buckets": []}}
        })
    }

    #[test]
    fn test_from_response_metadata() {
        let set = ResultSet::from_response(response(3, json!({"value": 12, "relation": "eq"})), &mapper())
            .unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(set.total_hits(), 12);
        assert_eq!(set.max_score(), Some(1.0));
        assert_eq!(set.took(), Some(4));
        assert!(!set.timed_out());
        assert_eq!(set.shards().unwrap()["successful"], json!(1));
        assert_eq!(set.aggregations(), Some(&json!({"tags": {"buckets": []}})));
        assert_eq!(set.hits().len(), 3);
        assert_eq!(set.get(0).unwrap().id(), "1");
    }

    #[test]
    fn test_total_as_number() {
        let set = ResultSet::from_response(response(2, json!(7)), &mapper()).unwrap();
        assert_eq!(set.total_hits(), 7);
    }

    #[test]
    fn test_missing_total_falls_back_to_hit_count() {
        let set = ResultSet::from_response(
            json!({"hits": {"hits": [{"_id": "1", "_source": {}}]}}),
            &mapper(),
        )
        .unwrap();
        assert_eq!(set.total_hits(), 1);
        assert!(set.took().is_none());
    }

    #[test]
    fn test_missing_hits_section() {
        let result = ResultSet::from_response(json!({"took": 1}), &mapper());
        assert!(matches!(result, Err(MappingError::InvalidResponse(_))));
    }

    #[test]
    fn test_limit_keeps_total() {
        let set = ResultSet::from_response(response(5, json!(5)), &mapper()).unwrap();

        let limited = set.clone().limit(2);
        assert_eq!(limited.len(), 2);
        assert_eq!(limited.total_hits(), 5);
        assert_eq!(set.clone().take(10).len(), 5);
        assert_eq!(set.take(0).len(), 0);
    }

    #[test]
    fn test_iteration_is_restartable() {
        let set = ResultSet::from_response(response(3, json!(3)), &mapper()).unwrap();

        let first: Vec<&str> = set.iter().map(|r| r.id()).collect();
        let second: Vec<&str> = (&set).into_iter().map(|r| r.id()).collect();
        assert_eq!(first, vec!["1", "2", "3"]);
        assert_eq!(first, second);

        let owned: Vec<MappedResult> = set.into_iter().collect();
        assert_eq!(owned.len(), 3);
    }

    #[test]
    fn test_paginate() {
        let set = ResultSet::from_response(response(5, json!(5)), &mapper()).unwrap();

        let paginator = set.paginate(2);
        let sizes: Vec<usize> = paginator.pages().map(|p| p.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_paginate_default_per_page() {
        let set = ResultSet::from_response(response(3, json!(30)), &mapper()).unwrap();

        let paginator = set.paginate_default();
        assert_eq!(paginator.per_page(), DEFAULT_PER_PAGE);
        assert_eq!(paginator.last_page(), 2);
    }
}
