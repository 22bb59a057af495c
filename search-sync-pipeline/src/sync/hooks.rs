//! Lifecycle hooks connecting persistence events to observers.
//!
//! The persistence layer calls [`LifecycleHooks::dispatch`] after a create,
//! update or delete has been committed. Observers are registered per record
//! type and run in registration order.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, instrument};

use crate::errors::SyncError;
use crate::sync::SyncController;
use search_sync_shared::Record;

/// A committed persistence event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordEvent {
    Created,
    Updated,
    Deleted,
}

impl fmt::Display for RecordEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        };
        f.write_str(name)
    }
}

/// Reacts to committed record changes.
#[async_trait]
pub trait RecordObserver: Send + Sync {
    async fn after_create(&self, record: &Record) -> Result<(), SyncError>;

    async fn after_update(&self, record: &Record) -> Result<(), SyncError>;

    async fn after_delete(&self, record: &Record) -> Result<(), SyncError>;
}

/// Registry of observers keyed by record type.
#[derive(Default)]
pub struct LifecycleHooks {
    observers: HashMap<String, Vec<Arc<dyn RecordObserver>>>,
}

impl LifecycleHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for every event of `record_type`.
    pub fn register(&mut self, record_type: impl Into<String>, observer: Arc<dyn RecordObserver>) {
        self.observers
            .entry(record_type.into())
            .or_default()
            .push(observer);
    }

    /// Register a sync controller for the record type it serves.
    pub fn register_sync(&mut self, controller: Arc<SyncController>) {
        let record_type = controller.document_type().to_string();
        self.register(record_type, controller);
    }

    /// Number of observers registered for `record_type`.
    pub fn observer_count(&self, record_type: &str) -> usize {
        self.observers.get(record_type).map_or(0, Vec::len)
    }

    /// Notify every observer of the record's type.
    ///
    /// Stops at the first failing observer and returns its error. Records of
    /// a type without observers are ignored.
    #[instrument(skip(self, record), fields(id = %record.id, document_type = %record.record_type))]
    pub async fn dispatch(&self, event: RecordEvent, record: &Record) -> Result<(), SyncError> {
        let Some(observers) = self.observers.get(&record.record_type) else {
            debug!("No observers registered");
            return Ok(());
        };

        for observer in observers {
            let result = match event {
                RecordEvent::Created => observer.after_create(record).await,
                RecordEvent::Updated => observer.after_update(record).await,
                RecordEvent::Deleted => observer.after_delete(record).await,
            };
            if let Err(e) = result {
                error!(error = %e, event = %event, "Observer failed");
                return Err(e);
            }
        }

        Ok(())
    }
}
