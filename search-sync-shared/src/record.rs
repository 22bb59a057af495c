//! Relational record projection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::FieldMap;

/// A domain entity as read from the relational store.
///
/// Only the projection the sync layer needs is carried: the primary key, the
/// model's document type and the persisted field mapping. The store itself
/// remains the owner of the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Primary key. Becomes the document id in the search index.
    pub id: String,
    /// Document type of the model this record belongs to.
    pub record_type: String,
    /// Persisted fields keyed by column/attribute name.
    pub fields: FieldMap,
}

impl Record {
    /// Create a record with an empty field mapping.
    pub fn new(record_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            record_type: record_type.into(),
            fields: FieldMap::new(),
        }
    }

    /// Create a record from an existing field mapping.
    pub fn with_fields(
        record_type: impl Into<String>,
        id: impl Into<String>,
        fields: FieldMap,
    ) -> Self {
        Self {
            id: id.into(),
            record_type: record_type.into(),
            fields,
        }
    }

    /// Set a single field, builder style.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Look up a persisted field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Return a copy with `overrides` merged over the persisted fields.
    ///
    /// The receiver is left untouched, so overrides never leak back into the
    /// relational side.
    pub fn merged(&self, overrides: &FieldMap) -> Self {
        let mut merged = self.clone();
        for (name, value) in overrides {
            merged.fields.insert(name.clone(), value.clone());
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_with_field_builder() {
        let record = Record::new("articles", "7")
            .with_field("title", "Hello")
            .with_field("tags", json!(["a", "b"]));

        assert_eq!(record.id, "7");
        assert_eq!(record.record_type, "articles");
        assert_eq!(record.get("title"), Some(&json!("Hello")));
        assert_eq!(record.get("tags"), Some(&json!(["a", "b"])));
        assert!(record.get("missing").is_none());
    }

    #[test]
    fn test_merged_leaves_original_untouched() {
        let record = Record::new("articles", "1").with_field("title", "Old");
        let mut overrides = FieldMap::new();
        overrides.insert("title".to_string(), json!("New"));
        overrides.insert("boost".to_string(), json!(3));

        let merged = record.merged(&overrides);

        assert_eq!(merged.get("title"), Some(&json!("New")));
        assert_eq!(merged.get("boost"), Some(&json!(3)));
        assert_eq!(record.get("title"), Some(&json!("Old")));
        assert!(record.get("boost").is_none());
    }
}
