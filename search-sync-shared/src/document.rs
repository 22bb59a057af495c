//! Search document body and its address in the engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::FieldMap;

/// Serialisable body of a search document.
///
/// Keys are the record's field names. Built fresh for every sync call and
/// discarded once the engine has answered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchDocument(FieldMap);

impl SearchDocument {
    /// Wrap an already-built field mapping.
    pub fn new(fields: FieldMap) -> Self {
        Self(fields)
    }

    /// Borrow the body fields.
    pub fn fields(&self) -> &FieldMap {
        &self.0
    }

    /// Consume the document, returning its fields.
    pub fn into_fields(self) -> FieldMap {
        self.0
    }

    /// The body as a JSON value, ready to hand to the engine.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The (index, type, id) triple addressing one document.
///
/// `doc_type` always equals the record type and `id` the record id for as
/// long as the record is synced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexReference {
    pub index: String,
    pub doc_type: String,
    pub id: String,
}

impl IndexReference {
    pub fn new(index: impl Into<String>, doc_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            doc_type: doc_type.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for IndexReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.index, self.doc_type, self.id)
    }
}
