//! Document mapper implementation.
//!
//! Turns records into search documents for index and update bodies, and
//! rebuilds records from search hits with their score and highlights kept in
//! a separate derived map.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

use crate::errors::MappingError;
use crate::mapper::RecordType;
use search_sync_shared::{
    highlight_attribute_name, FieldMap, IndexReference, MappedResult, Record, SearchDocument,
    SearchHit, SCORE_ATTRIBUTE,
};

/// Maps records of one [`RecordType`] to documents and hits back to records.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMapper {
    record_type: RecordType,
}

impl DocumentMapper {
    pub fn new(record_type: RecordType) -> Self {
        Self { record_type }
    }

    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }

    pub fn document_type(&self) -> &str {
        &self.record_type.document_type
    }

    /// Address of the document mirroring `record` in `index`.
    pub fn reference(&self, index: &str, record: &Record) -> Result<IndexReference, MappingError> {
        self.check_record(record)?;
        Ok(IndexReference::new(
            index,
            self.record_type.document_type.clone(),
            record.id.clone(),
        ))
    }

    /// Build the document body for `record`.
    ///
    /// Copies every persisted field except the excluded ones. The same record
    /// state always yields the same document.
    pub fn to_document(&self, record: &Record) -> Result<SearchDocument, MappingError> {
        self.check_record(record)?;

        let fields: FieldMap = record
            .fields
            .iter()
            .filter(|(name, _)| !self.record_type.is_excluded(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Ok(SearchDocument::new(fields))
    }

    /// Rebuild a record from a search hit.
    ///
    /// The id comes from the source's id field, falling back to the hit's
    /// `_id`. `_score` and one `highlighted*` attribute per highlighted field
    /// are stored in the result's derived map.
    pub fn from_hit(&self, hit: &SearchHit) -> Result<MappedResult, MappingError> {
        let source = match &hit.source {
            Some(Value::Object(source)) => source.clone(),
            None => FieldMap::new(),
            Some(other) => {
                return Err(MappingError::invalid_source(format!(
                    "expected an object, got {}",
                    other
                )))
            }
        };

        let id = source
            .get(&self.record_type.id_field)
            .and_then(id_to_string)
            .or_else(|| hit.id.clone().filter(|id| !id.is_empty()))
            .ok_or(MappingError::MissingId)?;

        if let Some(missing) = self
            .record_type
            .required_fields
            .iter()
            .find(|field| !source.contains_key(field.as_str()))
        {
            return Err(MappingError::missing_field(missing.clone()));
        }

        let mut derived = BTreeMap::new();
        derived.insert(
            SCORE_ATTRIBUTE.to_string(),
            hit.score.map_or(Value::Null, Value::from),
        );

        if let Some(highlight) = &hit.highlight {
            for (field, fragments) in highlight {
                let value = if self.record_type.mapper.flatten_single_highlight && fragments.len() == 1 {
                    Value::String(fragments[0].clone())
                } else {
                    Value::from(fragments.clone())
                };
                derived.insert(highlight_attribute_name(field), value);
            }
        }

        trace!(id = %id, document_type = %self.record_type.document_type, "Mapped hit");

        Ok(MappedResult {
            record: Record::with_fields(self.record_type.document_type.clone(), id, source),
            score: hit.score,
            version: hit.version,
            derived,
        })
    }

    /// Convert a mapped result into a typed model.
    ///
    /// The id is written to the id field when the source did not carry it.
    /// Derived attributes are not part of the model.
    pub fn to_model<T: DeserializeOwned>(&self, result: &MappedResult) -> Result<T, MappingError> {
        let mut fields = result.record.fields.clone();
        fields
            .entry(self.record_type.id_field.clone())
            .or_insert_with(|| Value::String(result.record.id.clone()));

        serde_json::from_value(Value::Object(fields))
            .map_err(|e| MappingError::Deserialization(e.to_string()))
    }

    fn check_record(&self, record: &Record) -> Result<(), MappingError> {
        if record.record_type != self.record_type.document_type {
            return Err(MappingError::TypeMismatch {
                expected: self.record_type.document_type.clone(),
                actual: record.record_type.clone(),
            });
        }
        if record.id.is_empty() {
            return Err(MappingError::MissingId);
        }
        Ok(())
    }
}

fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
