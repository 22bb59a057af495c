//! Configuration for the search sync layer.

mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::{LogConfig, LogFormat, Settings, DEFAULT_OPENSEARCH_URL};
