//! Journal domain errors

use core_kernel::{PortError, RecordError};
use thiserror::Error;

/// Errors raised while parsing or evaluating an amount formula
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    #[error("Unexpected character {ch:?} at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("Unterminated field token starting at offset {offset}")]
    UnterminatedToken { offset: usize },

    #[error("Empty field token at offset {offset}")]
    EmptyToken { offset: usize },

    #[error("Invalid number literal: {0}")]
    InvalidNumber(String),

    #[error("Unexpected end of formula")]
    UnexpectedEnd,

    #[error("Unexpected token {0} in formula")]
    UnexpectedToken(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Arithmetic overflow")]
    Overflow,
}

/// Errors that can occur while generating journal lines
#[derive(Debug, Error)]
pub enum JournalError {
    /// A remote collaborator failed; always fatal to the run
    #[error("Remote call {operation} failed: {source}")]
    RemoteCall {
        operation: String,
        #[source]
        source: PortError,
    },

    /// A formula references a field holding a non-numeric value
    #[error("Field {field_id} holds a non-numeric value: {value:?}")]
    FormulaBinding { field_id: String, value: String },

    /// A formula could not be parsed or evaluated
    #[error("Formula {formula:?} failed: {source}")]
    Formula {
        formula: String,
        #[source]
        source: FormulaError,
    },

    /// Neither the classification nor the default subject map names the key
    #[error("Default subject has no value for key {subject_key}")]
    SubjectResolution { subject_key: String },

    /// The ledger sink rejected lines during streaming
    #[error("Ledger sink rejected the import: {}", errors.join("; "))]
    ValidationFailure {
        errors: Vec<String>,
        inserted: u64,
        updated: u64,
    },

    #[error("Pattern not found: {0}")]
    PatternNotFound(String),

    #[error("Invalid pattern {pattern_id}: {reason}")]
    InvalidPattern { pattern_id: String, reason: String },

    #[error("Invalid change-set for history key {key:?}: {reason}")]
    InvalidChangeSet { key: String, reason: String },

    #[error("Sequence value {0} does not fit a 13-digit voucher number")]
    SequenceOverflow(i64),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl JournalError {
    /// Wraps a port failure with the name of the call that produced it
    pub fn remote(operation: impl Into<String>, source: PortError) -> Self {
        JournalError::RemoteCall {
            operation: operation.into(),
            source,
        }
    }

    pub fn formula(formula: impl Into<String>, source: FormulaError) -> Self {
        JournalError::Formula {
            formula: formula.into(),
            source,
        }
    }

    pub fn invalid_change_set(key: impl Into<String>, reason: impl Into<String>) -> Self {
        JournalError::InvalidChangeSet {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for ledger-sink validation failures
    pub fn is_validation_failure(&self) -> bool {
        matches!(self, JournalError::ValidationFailure { .. })
    }
}

impl From<RecordError> for JournalError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::NonNumeric { field_id, value } => {
                JournalError::FormulaBinding { field_id, value }
            }
        }
    }
}
