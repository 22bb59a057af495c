//! OpenSearch index naming, settings and mappings.
//!
//! OpenSearch has no mapping types, so every (index, document type) pair is
//! stored in its own physical index named `{index}-{doc_type}`.

use serde_json::{json, Value};

use crate::config::IndexConfig;

/// Physical OpenSearch index holding documents of `doc_type`.
///
/// OpenSearch index names must be lower case.
pub fn physical_index_name(index: &str, doc_type: &str) -> String {
    format!("{}-{}", index, doc_type).to_lowercase()
}

/// Body used to create a physical index.
///
/// The body includes:
/// - **settings**: shard and replica counts from the [`IndexConfig`]
/// - **mappings**: the record type's `properties` mapping, when one is given
pub fn get_index_settings(config: &IndexConfig, mapping: Option<&Value>) -> Value {
    let mut body = json!({
        "settings": {
            "number_of_shards": config.number_of_shards,
            "number_of_replicas": config.number_of_replicas
        }
    });

    if let Some(mapping) = mapping {
        body["mappings"] = mapping_body(mapping);
    }

    body
}

/// Wrap a mapping in `{"properties": ...}` unless it already is.
pub fn mapping_body(mapping: &Value) -> Value {
    if mapping.get("properties").is_some() {
        mapping.clone()
    } else {
        json!({ "properties": mapping })
    }
}
