//! Search request bodies and query shorthands.
//!
//! [`SearchRequest`] assembles a complete request body. The shorthand types
//! ([`MatchQuery`], [`MultiMatchQuery`], [`FuzzyQuery`], [`GeoShapeQuery`],
//! [`IdsQuery`], [`MoreLikeThisQuery`]) produce the query clause for the most
//! common query shapes. None of them carry an index or a document type: those
//! are always injected from configuration and the record type.

use serde_json::{json, Map, Value};

/// Default fuzziness for [`FuzzyQuery`].
pub const DEFAULT_FUZZINESS: &str = "AUTO";

/// Default shape type for [`GeoShapeQuery`].
pub const DEFAULT_SHAPE_TYPE: &str = "envelope";

/// A query shape that can be turned into a search request body.
pub trait QueryShorthand {
    /// The query clause, e.g. `{"match": {"title": "lamp"}}`.
    fn clause(&self) -> Value;

    /// A complete request body running only this clause.
    fn to_body(&self) -> Value {
        SearchRequest::from_shorthand(self).to_body()
    }
}

/// Builder for a search request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    query: Option<Value>,
    aggregations: Option<Value>,
    source_fields: Option<Vec<String>>,
    size: Option<usize>,
    from: Option<usize>,
    sort: Option<Value>,
    highlight_fields: Vec<String>,
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request from a shorthand's clause.
    pub fn from_shorthand<Q: QueryShorthand + ?Sized>(shorthand: &Q) -> Self {
        Self::new().query(shorthand.clause())
    }

    pub fn query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    pub fn aggregations(mut self, aggregations: Value) -> Self {
        self.aggregations = Some(aggregations);
        self
    }

    /// Restrict `_source` to the given fields.
    pub fn source_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn from(mut self, from: usize) -> Self {
        self.from = Some(from);
        self
    }

    pub fn sort(mut self, sort: Value) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Ask the engine to highlight matches in `field`.
    pub fn highlight(mut self, field: impl Into<String>) -> Self {
        self.highlight_fields.push(field.into());
        self
    }

    /// The request body sent to the engine.
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();

        if let Some(query) = &self.query {
            body.insert("query".to_string(), query.clone());
        }
        if let Some(aggregations) = &self.aggregations {
            body.insert("aggs".to_string(), aggregations.clone());
        }
        if let Some(fields) = &self.source_fields {
            body.insert("_source".to_string(), json!(fields));
        }
        if let Some(size) = self.size {
            body.insert("size".to_string(), json!(size));
        }
        if let Some(from) = self.from {
            body.insert("from".to_string(), json!(from));
        }
        if let Some(sort) = &self.sort {
            body.insert("sort".to_string(), sort.clone());
        }
        if !self.highlight_fields.is_empty() {
            let fields: Map<String, Value> = self
                .highlight_fields
                .iter()
                .map(|field| (field.clone(), json!({})))
                .collect();
            body.insert("highlight".to_string(), json!({ "fields": fields }));
        }

        Value::Object(body)
    }
}

/// `{"match": {field: query}}`
#[derive(Debug, Clone, PartialEq)]
pub struct MatchQuery {
    pub field: String,
    pub query: Value,
}

impl MatchQuery {
    pub fn new(field: impl Into<String>, query: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            query: query.into(),
        }
    }
}

impl QueryShorthand for MatchQuery {
    fn clause(&self) -> Value {
        json!({ "match": single_entry(&self.field, self.query.clone()) })
    }
}

/// `{"multi_match": {"fields": [...], "query": query}}`
#[derive(Debug, Clone, PartialEq)]
pub struct MultiMatchQuery {
    pub fields: Vec<String>,
    pub query: Value,
}

impl MultiMatchQuery {
    pub fn new<I, S>(fields: I, query: impl Into<Value>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            query: query.into(),
        }
    }
}

impl QueryShorthand for MultiMatchQuery {
    fn clause(&self) -> Value {
        json!({
            "multi_match": {
                "fields": self.fields,
                "query": self.query
            }
        })
    }
}

/// `{"fuzzy": {field: {"value": value, "fuzziness": fuzziness}}}`
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyQuery {
    pub field: String,
    pub value: Value,
    pub fuzziness: String,
}

impl FuzzyQuery {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            fuzziness: DEFAULT_FUZZINESS.to_string(),
        }
    }

    pub fn with_fuzziness(mut self, fuzziness: impl Into<String>) -> Self {
        self.fuzziness = fuzziness.into();
        self
    }
}

impl QueryShorthand for FuzzyQuery {
    fn clause(&self) -> Value {
        json!({
            "fuzzy": single_entry(
                &self.field,
                json!({ "value": self.value, "fuzziness": self.fuzziness }),
            )
        })
    }
}

/// `{"geo_shape": {field: {"shape": {"type": shape_type, "coordinates": [...]}}}}`
#[derive(Debug, Clone, PartialEq)]
pub struct GeoShapeQuery {
    pub field: String,
    pub coordinates: Value,
    pub shape_type: String,
}

impl GeoShapeQuery {
    /// Shape with raw GeoJSON-style coordinates.
    pub fn new(field: impl Into<String>, coordinates: Value) -> Self {
        Self {
            field: field.into(),
            coordinates,
            shape_type: DEFAULT_SHAPE_TYPE.to_string(),
        }
    }

    /// Envelope from its upper-left and lower-right `[lon, lat]` corners.
    pub fn envelope(field: impl Into<String>, top_left: [f64; 2], bottom_right: [f64; 2]) -> Self {
        Self::new(field, json!([top_left, bottom_right]))
    }

    pub fn with_shape_type(mut self, shape_type: impl Into<String>) -> Self {
        self.shape_type = shape_type.into();
        self
    }
}

impl QueryShorthand for GeoShapeQuery {
    fn clause(&self) -> Value {
        json!({
            "geo_shape": single_entry(
                &self.field,
                json!({
                    "shape": {
                        "type": self.shape_type,
                        "coordinates": self.coordinates
                    }
                }),
            )
        })
    }
}

/// `{"ids": {"values": [...]}}`
#[derive(Debug, Clone, PartialEq)]
pub struct IdsQuery {
    pub values: Vec<String>,
}

impl IdsQuery {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl QueryShorthand for IdsQuery {
    fn clause(&self) -> Value {
        json!({ "ids": { "values": self.values } })
    }
}

/// `{"more_like_this": {...}}` seeded by existing document ids.
#[derive(Debug, Clone, PartialEq)]
pub struct MoreLikeThisQuery {
    pub fields: Vec<String>,
    pub ids: Vec<String>,
    pub min_term_freq: u32,
    pub percent_terms_to_match: f64,
    pub min_word_length: u32,
}

impl MoreLikeThisQuery {
    pub fn new<F, I, S, T>(fields: F, ids: I) -> Self
    where
        F: IntoIterator<Item = S>,
        S: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ids: ids.into_iter().map(Into::into).collect(),
            min_term_freq: 1,
            percent_terms_to_match: 0.5,
            min_word_length: 3,
        }
    }

    pub fn with_min_term_freq(mut self, min_term_freq: u32) -> Self {
        self.min_term_freq = min_term_freq;
        self
    }

    pub fn with_percent_terms_to_match(mut self, percent: f64) -> Self {
        self.percent_terms_to_match = percent;
        self
    }

    pub fn with_min_word_length(mut self, min_word_length: u32) -> Self {
        self.min_word_length = min_word_length;
        self
    }
}

impl QueryShorthand for MoreLikeThisQuery {
    fn clause(&self) -> Value {
        json!({
            "more_like_this": {
                "fields": self.fields,
                "ids": self.ids,
                "min_term_freq": self.min_term_freq,
                "minimum_should_match": self.percent_terms_to_match,
                "min_word_length": self.min_word_length
            }
        })
    }
}

fn single_entry(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}
