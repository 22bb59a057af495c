//! # Search Sync Shared
//!
//! Data types shared by every search sync crate: the relational [`Record`]
//! projection, the [`SearchDocument`] body sent to the engine, the
//! [`IndexReference`] that addresses it, and the [`SearchHit`] /
//! [`MappedResult`] pair used when reading results back.

mod document;
mod hit;
mod record;

pub use document::{IndexReference, SearchDocument};
pub use hit::{highlight_attribute_name, MappedResult, SearchHit, SCORE_ATTRIBUTE};
pub use record::Record;

/// A JSON object, the shape of record fields, document bodies and hit sources.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;
