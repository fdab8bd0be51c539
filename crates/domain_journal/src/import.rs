//! Streaming import protocol with the ledger sink
//!
//! A session is a pair of channels. The writer sends metadata once, then
//! batches of rendered lines, then `Complete`. The sink answers every batch
//! with one [`ImportResponse`] carrying the insert/update deltas and, on
//! failure, structured errors that point at 1-based line numbers of the
//! session.

use core_kernel::{AppId, DatastoreId, JobId, SourceRecord, TenantDb, UserId};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Identity of the write, sent once at the start of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportMetadata {
    /// Correlation key of the session (the job id)
    pub key: JobId,
    pub tenant: TenantDb,
    pub app_id: AppId,
    pub datastore_id: DatastoreId,
    pub writer: UserId,
    pub owners: Vec<String>,
}

/// Messages sent to the ledger sink
#[derive(Debug, Clone, PartialEq)]
pub enum ImportRequest {
    Metadata(ImportMetadata),
    Lines(Vec<SourceRecord>),
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Success,
    Failure,
}

/// One structured validation error reported by the sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportErrorDetail {
    /// First line of the affected range (0 when not range-scoped)
    pub first_line: u64,
    /// Last line of the affected range (0 when not range-scoped)
    pub last_line: u64,
    /// The offending line (0 when the error covers a range)
    pub current_line: u64,
    pub field_id: Option<String>,
    pub message: String,
}

impl ImportErrorDetail {
    pub fn at_line(line: u64, message: impl Into<String>) -> Self {
        Self {
            first_line: line,
            last_line: line,
            current_line: line,
            field_id: None,
            message: message.into(),
        }
    }

    pub fn at_field(line: u64, field_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field_id: Some(field_id.into()),
            ..Self::at_line(line, message)
        }
    }

    pub fn in_range(first_line: u64, last_line: u64, message: impl Into<String>) -> Self {
        Self {
            first_line,
            last_line,
            current_line: 0,
            field_id: None,
            message: message.into(),
        }
    }
}

/// Reply to one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResponse {
    pub status: ImportStatus,
    pub inserted: u64,
    pub updated: u64,
    #[serde(default)]
    pub errors: Vec<ImportErrorDetail>,
}

impl ImportResponse {
    pub fn success(inserted: u64, updated: u64) -> Self {
        Self {
            status: ImportStatus::Success,
            inserted,
            updated,
            errors: Vec::new(),
        }
    }

    pub fn failure(inserted: u64, updated: u64, errors: Vec<ImportErrorDetail>) -> Self {
        Self {
            status: ImportStatus::Failure,
            inserted,
            updated,
            errors,
        }
    }
}

/// Outcome of one streaming session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub inserted_count: u64,
    pub updated_count: u64,
    pub errors: Vec<String>,
}

impl ImportResult {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The duplex channel of an open import session
#[derive(Debug)]
pub struct ImportSession {
    pub requests: mpsc::Sender<ImportRequest>,
    pub responses: mpsc::Receiver<ImportResponse>,
}

impl ImportSession {
    /// Creates a connected session and the sink-side ends of its channels
    pub fn channel(
        capacity: usize,
    ) -> (
        Self,
        mpsc::Receiver<ImportRequest>,
        mpsc::Sender<ImportResponse>,
    ) {
        let (request_tx, request_rx) = mpsc::channel(capacity.max(1));
        let (response_tx, response_rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                requests: request_tx,
                responses: response_rx,
            },
            request_rx,
            response_tx,
        )
    }
}
