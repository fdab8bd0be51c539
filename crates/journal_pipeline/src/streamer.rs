//! Bulk import streaming
//!
//! One session per run:
//!
//! ```text
//! open ─▶ Metadata ─▶ (Lines ─▶ response)* ─▶ Complete
//!                          │
//!                          └─ failure ─▶ Complete (stop) ─▶ localized errors
//! ```
//!
//! Each batch waits for its response before the next one is sent, so after a
//! failure no further lines reach the sink. The whole session runs under the
//! write timeout and the session is dropped on every path.

use std::sync::Arc;
use std::time::Duration;

use core_kernel::{PortError, SourceRecord};
use domain_journal::{
    ImportErrorDetail, ImportMetadata, ImportRequest, ImportResult, ImportSession, ImportStatus,
    JournalError, LedgerSinkPort,
};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::localization::{FieldLabels, Localizer};
use crate::pager::call_with_timeout;

const OPERATION: &str = "ledger.import";

/// Outcome of driving a session, before localization
#[derive(Debug)]
enum SessionOutcome {
    Accepted { inserted: u64, updated: u64 },
    Rejected { inserted: u64, updated: u64, details: Vec<ImportErrorDetail> },
}

/// Streams rendered lines into the ledger sink
#[derive(Clone)]
pub struct BulkImportStreamer {
    sink: Arc<dyn LedgerSinkPort>,
    batch_size: usize,
    timeout: Duration,
}

impl BulkImportStreamer {
    pub fn new(sink: Arc<dyn LedgerSinkPort>, batch_size: usize, timeout: Duration) -> Self {
        Self {
            sink,
            batch_size: batch_size.max(1),
            timeout,
        }
    }

    /// Imports `lines` in one session
    ///
    /// A rejected import is not an `Err`: the result carries the counts of
    /// the lines accepted before the failure and the localized errors.
    ///
    /// # Errors
    ///
    /// Returns `RemoteCall` when the session cannot be opened, the sink
    /// closes its channel, or the session exceeds the write timeout.
    #[instrument(skip_all, fields(lines = lines.len(), batch_size = self.batch_size))]
    pub async fn stream(
        &self,
        metadata: ImportMetadata,
        lines: Vec<SourceRecord>,
        localizer: &Localizer,
        labels: &FieldLabels,
    ) -> Result<ImportResult, JournalError> {
        let session = call_with_timeout("ledger.open_import", self.timeout, self.sink.open_import()).await?;

        let outcome = match tokio::time::timeout(self.timeout, self.drive(session, metadata, lines)).await {
            Ok(outcome) => outcome?,
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "Import session timed out");
                return Err(JournalError::remote(
                    OPERATION,
                    PortError::timeout(OPERATION, self.timeout),
                ));
            }
        };

        Ok(match outcome {
            SessionOutcome::Accepted { inserted, updated } => {
                info!(inserted, updated, "Import session completed");
                ImportResult {
                    inserted_count: inserted,
                    updated_count: updated,
                    errors: Vec::new(),
                }
            }
            SessionOutcome::Rejected { inserted, updated, details } => {
                warn!(inserted, updated, errors = details.len(), "Import rejected by ledger sink");
                ImportResult {
                    inserted_count: inserted,
                    updated_count: updated,
                    errors: localizer.import_errors(&details, labels),
                }
            }
        })
    }

    async fn drive(
        &self,
        mut session: ImportSession,
        metadata: ImportMetadata,
        lines: Vec<SourceRecord>,
    ) -> Result<SessionOutcome, JournalError> {
        send(&session.requests, ImportRequest::Metadata(metadata)).await?;

        let mut inserted = 0u64;
        let mut updated = 0u64;
        let mut remaining = lines.into_iter();
        loop {
            let batch: Vec<SourceRecord> = remaining.by_ref().take(self.batch_size).collect();
            if batch.is_empty() {
                break;
            }
            send(&session.requests, ImportRequest::Lines(batch)).await?;

            let response = session
                .responses
                .recv()
                .await
                .ok_or_else(|| JournalError::remote(OPERATION, PortError::unavailable("ledger sink")))?;
            inserted += response.inserted;
            updated += response.updated;
            debug!(inserted, updated, "Batch acknowledged");

            if response.status == ImportStatus::Failure {
                // stop the sink; the rejection is reported either way
                if send(&session.requests, ImportRequest::Complete).await.is_err() {
                    warn!("Ledger sink closed before the stop signal");
                }
                return Ok(SessionOutcome::Rejected {
                    inserted,
                    updated,
                    details: response.errors,
                });
            }
        }

        send(&session.requests, ImportRequest::Complete).await?;
        Ok(SessionOutcome::Accepted { inserted, updated })
    }
}

async fn send(requests: &mpsc::Sender<ImportRequest>, request: ImportRequest) -> Result<(), JournalError> {
    requests
        .send(request)
        .await
        .map_err(|_| JournalError::remote(OPERATION, PortError::unavailable("ledger sink")))
}

impl std::fmt::Debug for BulkImportStreamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkImportStreamer")
            .field("batch_size", &self.batch_size)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
