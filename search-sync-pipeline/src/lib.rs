//! # Search Sync Pipeline
//!
//! This crate keeps search documents consistent with relational records and
//! maps search responses back into records.
//!
//! ## Architecture
//!
//! Writes and reads follow two paths:
//!
//! 1. **Sync**: record lifecycle event → `LifecycleHooks` → `SyncController`
//!    (or `BulkIndexer` for collections) → `DocumentMapper` → provider
//! 2. **Search**: `ModelSearch` → provider → `ResultSet` → `DocumentMapper`
//!    → limited or paginated results
//!
//! Every component is scoped to one `RecordType` and receives the provider
//! and index name it works against at construction.

pub mod admin;
pub mod bulk;
pub mod errors;
pub mod mapper;
pub mod results;
pub mod search;
pub mod sync;

pub use admin::IndexAdmin;
pub use bulk::BulkIndexer;
pub use errors::{BulkFailure, BulkOperation, BulkSyncError, ItemError, MappingError, SyncError};
pub use mapper::{DocumentMapper, MapperConfig, RecordType};
pub use results::{Page, Paginator, ResultSet, DEFAULT_PER_PAGE};
pub use search::ModelSearch;
pub use sync::{LifecycleHooks, RecordEvent, RecordObserver, SyncController};
