//! Ports and Adapters Infrastructure
//!
//! The journal engine talks to everything outside itself through port
//! traits: the record store, the sequence service, the subject and pattern
//! catalogs, the streaming ledger sink, the job tracker and error-log
//! storage. Each port trait lives in the domain crate and extends the marker
//! trait here; every adapter reports failures as a [`PortError`].
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     journal_pipeline                         │
//! │        (JournalPipeline, SourcePager, ImportStreamer)        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Port Traits (domain_journal)                 │
//! │   RecordSourcePort, SequencePort, LedgerSinkPort, ...        │
//! └─────────────────────────────────────────────────────────────┘
//!                    ▲                         ▲
//!         ┌─────────┴─────────┐     ┌────────┴────────┐
//!         │  infra_db adapter │     │  Mock adapters  │
//!         │   (PostgreSQL)    │     │   (in-memory)   │
//!         └───────────────────┘     └─────────────────┘
//! ```

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Error type for port operations
///
/// Provides a unified error type that all port implementations must use,
/// ensuring consistent error handling across internal and external adapters.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// The remote side rejected the request
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The operation conflicts with existing data
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
    },

    /// Connection to the underlying system failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The operation timed out
    #[error("Timeout after {duration_ms}ms: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
    },

    /// The remote system is unavailable or closed the channel
    #[error("Service unavailable: {service}")]
    Unavailable {
        service: String,
    },

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a Validation error with field information
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a Timeout error for the named operation
    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        PortError::Timeout {
            operation: operation.into(),
            duration_ms: u64::try_from(after.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Creates an Unavailable error
    pub fn unavailable(service: impl Into<String>) -> Self {
        PortError::Unavailable {
            service: service.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error indicates a transient failure that may succeed on retry
    ///
    /// Journal runs never retry on their own; the flag is informational for
    /// whoever decides to re-run.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PortError::Connection { .. } | PortError::Timeout { .. } | PortError::Unavailable { .. }
        )
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }
}

/// Marker trait for all domain ports
///
/// All port traits should extend this marker to ensure they are
/// thread-safe and can be used in async contexts.
pub trait DomainPort: Send + Sync + 'static {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_error_not_found() {
        let error = PortError::not_found("Pattern", "01001");
        assert!(error.is_not_found());
        assert!(!error.is_transient());
        assert!(error.to_string().contains("Pattern"));
        assert!(error.to_string().contains("01001"));
    }

    #[test]
    fn test_port_error_timeout_is_transient() {
        let error = PortError::timeout("fetch_page", Duration::from_secs(600));
        assert!(error.is_transient());
        assert_eq!(error.to_string(), "Timeout after 600000ms: fetch_page");
    }

    #[test]
    fn test_validation_is_not_transient() {
        assert!(!PortError::validation_field("bad", "kanjokamoku").is_transient());
    }
}
