//! Store error taxonomy.

use std::fmt;

use oidc_docdb::DatabaseError;

use crate::config::ConfigError;
use crate::kind::EntityKind;

/// Errors returned by the entity stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A required argument was empty. Never worth retrying.
    #[error("Invalid argument '{argument}': {message}")]
    InvalidArgument {
        /// Name of the offending argument.
        argument: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// The document changed or disappeared since it was read.
    ///
    /// Re-read the entity and retry the operation.
    #[error("Concurrency failure on {entity} '{id}': the document was modified or deleted")]
    Concurrency {
        /// Kind of the entity being written.
        entity: EntityKind,
        /// Document ID.
        id: String,
        /// The database conflict behind the failure.
        #[source]
        source: DatabaseError,
    },

    /// The database failed.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// An entity could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A blank entity could not be constructed.
    #[error("Cannot instantiate {type_name}: {message}")]
    Instantiation {
        /// Rust type name of the entity.
        type_name: &'static str,
        /// Reason reported by the constructor.
        message: String,
    },

    /// The parent was deleted but removing its children failed.
    ///
    /// Deleting the parent again completes the cascade.
    #[error("Cascade delete of {entity} '{id}' failed: {source}")]
    Cascade {
        /// Kind of the deleted parent.
        entity: EntityKind,
        /// Parent document ID.
        id: String,
        /// The failure while removing children.
        #[source]
        source: Box<StoreError>,
    },

    /// The store configuration is invalid.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The operation observed a cancellation request.
    #[error("Operation cancelled")]
    Cancelled,
}

impl StoreError {
    // -------------------------------------------------------------------------
    // Constructor Methods
    // -------------------------------------------------------------------------

    /// Create an `InvalidArgument` error.
    #[must_use]
    pub fn invalid_argument(argument: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            message: message.into(),
        }
    }

    /// Create an `InvalidArgument` error for an empty value.
    #[must_use]
    pub fn empty_argument(argument: &'static str) -> Self {
        Self::invalid_argument(argument, "the value cannot be null or empty")
    }

    /// Create a `Concurrency` error.
    #[must_use]
    pub fn concurrency(entity: EntityKind, id: impl Into<String>, source: DatabaseError) -> Self {
        Self::Concurrency {
            entity,
            id: id.into(),
            source,
        }
    }

    /// Create an `Instantiation` error for type `T`.
    #[must_use]
    pub fn instantiation<T>(message: impl Into<String>) -> Self {
        Self::Instantiation {
            type_name: std::any::type_name::<T>(),
            message: message.into(),
        }
    }

    /// Create a `Cascade` error.
    #[must_use]
    pub fn cascade(entity: EntityKind, id: impl Into<String>, source: StoreError) -> Self {
        Self::Cascade {
            entity,
            id: id.into(),
            source: Box::new(source),
        }
    }

    // -------------------------------------------------------------------------
    // Predicate Methods
    // -------------------------------------------------------------------------

    /// Returns `true` if this is an `InvalidArgument` error.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    /// Returns `true` if this is a `Concurrency` error.
    #[must_use]
    pub fn is_concurrency(&self) -> bool {
        matches!(self, Self::Concurrency { .. })
    }

    /// Returns `true` if this is a `Cascade` error.
    #[must_use]
    pub fn is_cascade(&self) -> bool {
        matches!(self, Self::Cascade { .. })
    }

    /// Returns `true` if this is a database error.
    #[must_use]
    pub fn is_database_error(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    /// Returns `true` if the operation was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if retrying can succeed: after a re-read for
    /// concurrency errors, as is for cascades and transport failures.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Concurrency { .. } | Self::Cascade { .. } => true,
            Self::Database(err) => err.category() == oidc_docdb::ErrorCategory::Transport,
            _ => false,
        }
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidArgument { .. } => ErrorCategory::InvalidArgument,
            Self::Concurrency { .. } => ErrorCategory::Concurrency,
            Self::Database(_) => ErrorCategory::Database,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Instantiation { .. } => ErrorCategory::Instantiation,
            Self::Cascade { .. } => ErrorCategory::Cascade,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Cancelled => ErrorCategory::Cancelled,
        }
    }
}

/// Categories of store errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    InvalidArgument,
    Concurrency,
    Database,
    Serialization,
    Instantiation,
    Cascade,
    Configuration,
    Cancelled,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid_argument"),
            Self::Concurrency => write!(f, "concurrency"),
            Self::Database => write!(f, "database"),
            Self::Serialization => write!(f, "serialization"),
            Self::Instantiation => write!(f, "instantiation"),
            Self::Cascade => write!(f, "cascade"),
            Self::Configuration => write!(f, "configuration"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Rejects an empty required string.
pub(crate) fn require(argument: &'static str, value: &str) -> StoreResult<()> {
    if value.is_empty() {
        Err(StoreError::empty_argument(argument))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument() {
        let err = StoreError::empty_argument("client_id");
        assert!(err.is_invalid_argument());
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "Invalid argument 'client_id': the value cannot be null or empty"
        );
        assert!(require("client_id", "").is_err());
        assert!(require("client_id", "c1").is_ok());
    }

    #[test]
    fn test_concurrency_keeps_source() {
        let err = StoreError::concurrency(
            EntityKind::Token,
            "t1",
            DatabaseError::conflict("t1", "Document update conflict."),
        );
        assert!(err.is_concurrency());
        assert!(err.is_retryable());
        assert_eq!(err.category(), ErrorCategory::Concurrency);

        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("Document update conflict"));
    }

    #[test]
    fn test_transport_failures_are_retryable() {
        assert!(StoreError::Database(DatabaseError::connection("reset by peer")).is_retryable());
        assert!(!StoreError::Database(DatabaseError::not_found("t1")).is_retryable());
        assert!(!StoreError::Cancelled.is_retryable());
    }

    #[test]
    fn test_cascade_wraps_cause() {
        let err = StoreError::cascade(
            EntityKind::Application,
            "app-1",
            StoreError::Database(DatabaseError::connection("refused")),
        );
        assert!(err.is_cascade());
        assert_eq!(
            err.to_string(),
            "Cascade delete of application 'app-1' failed: Database error: Connection error: refused"
        );
        assert_eq!(ErrorCategory::Cascade.to_string(), "cascade");
    }

    #[test]
    fn test_instantiation_names_type() {
        let err = StoreError::instantiation::<String>("no default");
        assert!(err.to_string().contains("alloc::string::String"));
        assert_eq!(err.category(), ErrorCategory::Instantiation);
    }
}
