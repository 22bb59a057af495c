//! Sync module for the search sync pipeline.
//!
//! Mirrors single-record lifecycle events into the search index.

mod controller;
mod hooks;

pub use controller::SyncController;
pub use hooks::{LifecycleHooks, RecordEvent, RecordObserver};
