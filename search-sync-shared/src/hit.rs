//! Search hits and the results reconstructed from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{FieldMap, Record};

/// Name of the derived attribute carrying the relevance score.
pub const SCORE_ATTRIBUTE: &str = "_score";

/// One entry of `hits.hits` in a raw search response.
///
/// Only the parts the sync layer inspects are typed; everything else in the
/// hit is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(rename = "_index", default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    #[serde(rename = "_version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(rename = "_source", default)]
    pub source: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<BTreeMap<String, Vec<String>>>,
}

/// A record rebuilt from a hit, plus attributes that only exist in search.
///
/// Derived attributes (`_score` and one `highlighted*` entry per highlighted
/// field) live in `derived` and never touch `record.fields`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedResult {
    pub record: Record,
    pub score: Option<f64>,
    pub version: Option<i64>,
    pub derived: BTreeMap<String, Value>,
}

impl MappedResult {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn fields(&self) -> &FieldMap {
        &self.record.fields
    }

    /// Look up an attribute, persisted fields first, then derived ones.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.record
            .fields
            .get(name)
            .or_else(|| self.derived.get(name))
    }

    /// Highlight fragments synthesized for `field`, if the hit had any.
    pub fn highlight(&self, field: &str) -> Option<&Value> {
        self.derived.get(&highlight_attribute_name(field))
    }
}

/// Derived attribute name for a highlighted field.
///
/// Equivalent to camel-casing `"highlighted_" + field`: the field is split on
/// every non-alphanumeric character, empty segments are dropped and each
/// segment gets an upper-cased first character.
///
/// `offer_price` becomes `highlightedOfferPrice`, `title` becomes
/// `highlightedTitle`.
pub fn highlight_attribute_name(field: &str) -> String {
    let mut name = String::from("highlighted");
    for segment in field
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
    {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
    }
    name
}
