//! Paginated extraction from the record source
//!
//! A read is `count` followed by `ceil(total / page_size)` sequential page
//! fetches. Every call runs under the read timeout; a failed or timed-out
//! page aborts the read, and nothing is retried.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use core_kernel::{PortError, RecordQuery, SourceRecord};
use domain_journal::{ChangeSet, ChangeSetGrouper, JournalError, RecordSourcePort};
use tracing::{debug, instrument};

/// Runs a port call under a timeout, naming the call in any error
pub(crate) async fn call_with_timeout<T, F>(
    operation: &str,
    limit: Duration,
    call: F,
) -> Result<T, JournalError>
where
    F: Future<Output = Result<T, PortError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(|e| JournalError::remote(operation, e)),
        Err(_) => Err(JournalError::remote(
            operation,
            PortError::timeout(operation, limit),
        )),
    }
}

/// Sequential pager over one record source
#[derive(Clone)]
pub struct SourcePager {
    source: Arc<dyn RecordSourcePort>,
    page_size: u64,
    timeout: Duration,
}

impl SourcePager {
    pub fn new(source: Arc<dyn RecordSourcePort>, page_size: u64, timeout: Duration) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            timeout,
        }
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Number of pages needed for `total` records
    pub fn page_count(&self, total: u64) -> u64 {
        total.div_ceil(self.page_size)
    }

    pub async fn count(&self, query: &RecordQuery) -> Result<u64, JournalError> {
        call_with_timeout("records.count", self.timeout, self.source.count(query)).await
    }

    /// Fetches one 1-based page
    pub async fn fetch_page(
        &self,
        query: &RecordQuery,
        page_index: u64,
    ) -> Result<Vec<SourceRecord>, JournalError> {
        call_with_timeout(
            "records.fetch",
            self.timeout,
            self.source.fetch(query, page_index, self.page_size),
        )
        .await
    }

    /// Hands every page to `visit`, in order; returns the record count
    #[instrument(skip(self, query, visit), fields(datastore_id = %query.datastore_id))]
    pub async fn for_each_page<V>(&self, query: &RecordQuery, mut visit: V) -> Result<u64, JournalError>
    where
        V: FnMut(Vec<SourceRecord>) -> Result<(), JournalError>,
    {
        let total = self.count(query).await?;
        let pages = self.page_count(total);
        debug!(total, pages, page_size = self.page_size, "Paging source records");

        for page_index in 1..=pages {
            let records = self.fetch_page(query, page_index).await?;
            visit(records)?;
        }
        Ok(total)
    }

    /// Reads every matching record
    pub async fn fetch_all(&self, query: &RecordQuery) -> Result<Vec<SourceRecord>, JournalError> {
        let mut all = Vec::new();
        self.for_each_page(query, |records| {
            all.extend(records);
            Ok(())
        })
        .await?;
        Ok(all)
    }

    /// Reads every matching record and groups them into change-sets
    ///
    /// The grouper holds back each page's trailing group, so a change-set
    /// that straddles a page boundary is still merged.
    pub async fn change_sets(&self, query: &RecordQuery) -> Result<Vec<ChangeSet>, JournalError> {
        let mut grouper = ChangeSetGrouper::new();
        let mut change_sets = Vec::new();
        self.for_each_page(query, |records| {
            change_sets.extend(grouper.push_page(records)?);
            Ok(())
        })
        .await?;
        change_sets.extend(grouper.finish()?);
        Ok(change_sets)
    }
}

impl std::fmt::Debug for SourcePager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourcePager")
            .field("page_size", &self.page_size)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{AppId, DatastoreId, FieldValue, SortKey, TenantDb};
    use domain_journal::ports::mock::MockRecordSource;

    fn record(no: &str, side: &str) -> SourceRecord {
        SourceRecord::new()
            .with("no", FieldValue::text(no))
            .with("zengokbn", FieldValue::options(side))
    }

    fn query() -> RecordQuery {
        RecordQuery::new(TenantDb::new("t"), AppId::new("a"), DatastoreId::new("ds_history"))
            .sorted_by(SortKey::ascend("no"))
    }

    #[test]
    fn test_page_count_rounds_up() {
        let pager = SourcePager::new(Arc::new(MockRecordSource::new()), 500, Duration::from_secs(1));
        assert_eq!(pager.page_count(0), 0);
        assert_eq!(pager.page_count(500), 1);
        assert_eq!(pager.page_count(501), 2);
    }

    #[tokio::test]
    async fn test_pages_are_fetched_sequentially() {
        let records = (1..=5).map(|i| record(&i.to_string(), "after")).collect();
        let source = MockRecordSource::new().with_datastore("zougenrireki", "ds_history", records);
        let pager = SourcePager::new(Arc::new(source.clone()), 2, Duration::from_secs(1));

        let all = pager.fetch_all(&query()).await.unwrap();

        assert_eq!(all.len(), 5);
        let pages: Vec<u64> = source.fetched_pages().into_iter().map(|(_, p)| p).collect();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_pair_split_across_pages_is_merged() {
        let records = vec![
            record("1", "before"),
            record("2", "before"),
            record("2", "after"),
        ];
        let source = MockRecordSource::new().with_datastore("zougenrireki", "ds_history", records);
        let pager = SourcePager::new(Arc::new(source), 2, Duration::from_secs(1));

        let change_sets = pager.change_sets(&query()).await.unwrap();

        assert_eq!(change_sets.len(), 2);
        assert!(!change_sets[0].is_modification());
        assert!(change_sets[1].is_modification());
    }

    #[tokio::test]
    async fn test_failed_page_aborts_the_read() {
        let records = (1..=5).map(|i| record(&i.to_string(), "after")).collect();
        let source = MockRecordSource::new()
            .with_datastore("zougenrireki", "ds_history", records)
            .failing_on_page(2);
        let pager = SourcePager::new(Arc::new(source.clone()), 2, Duration::from_secs(1));

        let err = pager.fetch_all(&query()).await.unwrap_err();

        assert!(matches!(
            err,
            JournalError::RemoteCall { ref operation, .. } if operation == "records.fetch"
        ));
        assert_eq!(source.fetched_pages().len(), 2);
    }
}
