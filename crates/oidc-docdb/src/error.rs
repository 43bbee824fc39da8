//! Error types for the document database abstraction layer.
//!
//! Every backend reports failures through [`DatabaseError`]. The variants
//! mirror the HTTP status families of a CouchDB-style server so that callers
//! can tell a revision conflict from a missing document from a transport
//! failure without knowing which backend they talk to.

use std::fmt;

/// A single element of a bulk write that the database refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemFailure {
    /// Document ID of the rejected element.
    pub id: String,
    /// Short error code reported by the database (e.g. `conflict`).
    pub error: String,
    /// Human-readable reason.
    pub reason: String,
}

/// Errors that can occur during document database operations.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// The document (or database, or view) does not exist.
    #[error("Not found: {id}")]
    NotFound {
        /// The identifier of the missing object.
        id: String,
    },

    /// A write was rejected because the supplied revision is stale,
    /// missing, or the document already exists.
    #[error("Document update conflict: {id} ({reason})")]
    Conflict {
        /// The document ID involved in the conflict.
        id: String,
        /// Reason reported by the database.
        reason: String,
    },

    /// One or more elements of a bulk write were rejected.
    #[error("Bulk write rejected {} of {total} documents", failures.len())]
    BulkRejected {
        /// The rejected elements.
        failures: Vec<BulkItemFailure>,
        /// Number of documents submitted in the batch.
        total: usize,
    },

    /// A query could not be served because no index covers it.
    #[error("No usable index: {reason}")]
    NoUsableIndex {
        /// Reason reported by the database.
        reason: String,
    },

    /// The request was malformed.
    #[error("Bad request: {error} ({reason})")]
    BadRequest {
        /// Short error code.
        error: String,
        /// Human-readable reason.
        reason: String,
    },

    /// The server answered with an unexpected status.
    #[error("HTTP {status}: {error} ({reason})")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Short error code.
        error: String,
        /// Human-readable reason.
        reason: String,
    },

    /// The database could not be reached.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection failure.
        message: String,
    },

    /// A document or response body could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An internal backend error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl DatabaseError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a new `Conflict` error.
    #[must_use]
    pub fn conflict(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Conflict {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `BadRequest` error.
    #[must_use]
    pub fn bad_request(error: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BadRequest {
            error: error.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `Connection` error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a revision conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns `true` if a bulk write was (partially) rejected.
    #[must_use]
    pub fn is_bulk_rejected(&self) -> bool {
        matches!(self, Self::BulkRejected { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::BulkRejected { .. } => ErrorCategory::BulkRejected,
            Self::NoUsableIndex { .. } | Self::BadRequest { .. } => ErrorCategory::BadRequest,
            Self::Http { .. } | Self::Connection { .. } => ErrorCategory::Transport,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of database errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Missing document, database or view.
    NotFound,
    /// Revision conflict.
    Conflict,
    /// Bulk write with rejected elements.
    BulkRejected,
    /// Malformed request.
    BadRequest,
    /// Network or unexpected HTTP failure.
    Transport,
    /// (De)serialization failure.
    Serialization,
    /// Internal backend failure.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::BulkRejected => write!(f, "bulk_rejected"),
            Self::BadRequest => write!(f, "bad_request"),
            Self::Transport => write!(f, "transport"),
            Self::Serialization => write!(f, "serialization"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
