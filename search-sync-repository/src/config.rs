//! Configuration types for search index providers.

/// Default logical index name.
pub const DEFAULT_INDEX_NAME: &str = "default";

/// Settings for the logical search index all record types are synced into.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexConfig {
    /// Logical index name, combined with each document type to address
    /// documents.
    pub name: String,
    /// Primary shards used when an index is created.
    pub number_of_shards: u32,
    /// Replicas used when an index is created.
    pub number_of_replicas: u32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_INDEX_NAME.to_string(),
            number_of_shards: 1,
            number_of_replicas: 1,
        }
    }
}

impl IndexConfig {
    /// Create a config for the named index with default sharding.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_shards(mut self, number_of_shards: u32) -> Self {
        self.number_of_shards = number_of_shards;
        self
    }

    pub fn with_replicas(mut self, number_of_replicas: u32) -> Self {
        self.number_of_replicas = number_of_replicas;
        self
    }
}
