//! Per-model sync settings.

use serde_json::Value;

/// Field holding the primary key when none is configured.
pub const DEFAULT_ID_FIELD: &str = "id";

/// How records of one type are turned into documents and back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapperConfig {
    /// Fields never sent to the index (relations, secrets, computed values).
    pub excluded_fields: Vec<String>,
    /// Store a highlight with exactly one fragment as a string instead of a
    /// one-element array.
    pub flatten_single_highlight: bool,
}

/// A model whose records are synced into the search index.
///
/// The record type supplies the document type of every scoped operation, so
/// callers never pass an index or a type themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    /// Document type, equal to `Record::record_type` of every record of this model.
    pub document_type: String,
    /// Source field holding the primary key.
    pub id_field: String,
    /// Fields a hit source must contain to rebuild a record.
    pub required_fields: Vec<String>,
    /// `properties` mapping used when the index is created.
    pub mapping: Option<Value>,
    pub mapper: MapperConfig,
}

impl RecordType {
    pub fn new(document_type: impl Into<String>) -> Self {
        Self {
            document_type: document_type.into(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            required_fields: Vec::new(),
            mapping: None,
            mapper: MapperConfig::default(),
        }
    }

    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    pub fn with_required_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mapping(mut self, mapping: Value) -> Self {
        self.mapping = Some(mapping);
        self
    }

    pub fn with_excluded_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mapper.excluded_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_flatten_single_highlight(mut self, flatten: bool) -> Self {
        self.mapper.flatten_single_highlight = flatten;
        self
    }

    pub fn is_excluded(&self, field: &str) -> bool {
        self.mapper.excluded_fields.iter().any(|f| f == field)
    }
}
