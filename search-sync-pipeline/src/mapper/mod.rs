//! Mapper module for the search sync pipeline.
//!
//! Converts records into search documents and search hits back into records.

mod document_mapper;
mod record_type;

pub use document_mapper::DocumentMapper;
pub use record_type::{MapperConfig, RecordType, DEFAULT_ID_FIELD};
pub use search_sync_shared::highlight_attribute_name;
