//! Search index error types.
//!
//! This module defines the errors an adapter reports. The classification
//! matters to callers: `DocumentNotFound` drives the self-healing update and
//! the idempotent delete, everything else is propagated as is.

use thiserror::Error;

/// Errors that can occur during search index operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchIndexError {
    /// The engine could not be reached (network failure, timeout, bad URL).
    #[error("Transport error: {0}")]
    TransportError(String),

    /// The engine reports that the addressed document or index does not exist.
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// The engine rejected the operation (version conflict, mapping mismatch, ...).
    #[error("Engine error (status {status:?}): {reason}")]
    EngineError { status: Option<u16>, reason: String },

    /// The request was rejected before reaching the engine.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A request body could not be serialized.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The engine answered with a body we could not interpret.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl SearchIndexError {
    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportError(msg.into())
    }

    /// Create a document not found error.
    pub fn document_not_found(msg: impl Into<String>) -> Self {
        Self::DocumentNotFound(msg.into())
    }

    /// Create an engine rejection error.
    pub fn engine(status: Option<u16>, reason: impl Into<String>) -> Self {
        Self::EngineError {
            status,
            reason: reason.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Classify a non-success HTTP status returned by the engine.
    ///
    /// 404 means the document (or its index) is missing; every other status
    /// is an engine rejection carrying the response body as the reason.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        if status == 404 {
            Self::DocumentNotFound(body.into())
        } else {
            Self::engine(Some(status), body)
        }
    }

    /// Whether the engine reported the target as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DocumentNotFound(_))
    }

    /// Whether the failure happened before the engine could answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::TransportError(_))
    }
}
