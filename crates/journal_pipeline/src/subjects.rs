//! Run-scoped subject loading
//!
//! The default subject list is read first. The per-classification lists are
//! then read concurrently, one task per classification; the loader waits for
//! every task and fails the run if any of them failed.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use core_kernel::{AppId, PortError, RecordQuery, SortKey, TenantDb};
use domain_journal::fields;
use domain_journal::{JournalError, SubjectCatalogPort, SubjectEntry, SubjectMap, SubjectMapper};
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use crate::pager::{call_with_timeout, SourcePager};

/// Builds the [`SubjectMapper`] of one run
#[derive(Clone)]
pub struct SubjectLoader {
    catalog: Arc<dyn SubjectCatalogPort>,
    timeout: Duration,
}

impl SubjectLoader {
    pub fn new(catalog: Arc<dyn SubjectCatalogPort>, timeout: Duration) -> Self {
        Self { catalog, timeout }
    }

    /// Collects the distinct asset classifications of the asset master
    ///
    /// `query` must target the asset datastore; blank classifications are
    /// ignored.
    pub async fn discover_classifications(
        pager: &SourcePager,
        query: RecordQuery,
    ) -> Result<BTreeSet<String>, JournalError> {
        let query = query.sorted_by(SortKey::ascend(fields::ASSET_CLASS_ID));
        let mut classifications = BTreeSet::new();
        pager
            .for_each_page(&query, |records| {
                classifications.extend(
                    records
                        .iter()
                        .map(|record| record.text(fields::ASSET_CLASS_ID).trim())
                        .filter(|class| !class.is_empty())
                        .map(str::to_string),
                );
                Ok(())
            })
            .await?;
        Ok(classifications)
    }

    /// Loads the default list and every classification's list
    #[instrument(skip(self, classifications), fields(tenant = %tenant, app_id = %app_id))]
    pub async fn load(
        &self,
        tenant: &TenantDb,
        app_id: &AppId,
        classifications: BTreeSet<String>,
    ) -> Result<SubjectMapper, JournalError> {
        let defaults = call_with_timeout(
            "subjects.list_default",
            self.timeout,
            self.catalog.list_subjects(tenant, app_id, None),
        )
        .await?;
        let mut mapper = SubjectMapper::new(SubjectMap::from_default_entries(&defaults));

        let mut workers: JoinSet<Result<(String, Vec<SubjectEntry>), JournalError>> = JoinSet::new();
        for classification in classifications {
            let catalog = Arc::clone(&self.catalog);
            let tenant = tenant.clone();
            let app_id = app_id.clone();
            let timeout = self.timeout;
            workers.spawn(async move {
                let entries = call_with_timeout(
                    "subjects.list_classified",
                    timeout,
                    catalog.list_subjects(&tenant, &app_id, Some(&classification)),
                )
                .await?;
                Ok((classification, entries))
            });
        }

        let mut first_error: Option<JournalError> = None;
        while let Some(joined) = workers.join_next().await {
            let outcome = joined.unwrap_or_else(|e| {
                Err(JournalError::remote(
                    "subjects.list_classified",
                    PortError::internal(format!("subject worker stopped: {e}")),
                ))
            });
            match outcome {
                Ok((classification, entries)) => {
                    debug!(classification = %classification, count = entries.len(), "Subject list loaded");
                    mapper.insert_classification(
                        classification,
                        SubjectMap::from_classified_entries(&entries),
                    );
                }
                Err(error) => {
                    warn!(error = %error, "Subject list lookup failed");
                    first_error.get_or_insert(error);
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(mapper),
        }
    }
}

impl std::fmt::Debug for SubjectLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubjectLoader")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{DatastoreId, FieldValue, SourceRecord};
    use domain_journal::ports::mock::{MockRecordSource, MockSubjectCatalog};

    fn catalog() -> MockSubjectCatalog {
        MockSubjectCatalog::new(vec![
            SubjectEntry::new("asset", "", "Lease assets"),
            SubjectEntry::new("debt", "リース債務", "Lease debt"),
        ])
        .with_classification("B01", vec![SubjectEntry::new("asset", "Buildings", "")])
        .with_classification("V01", vec![SubjectEntry::new("asset", "", "ignored")])
    }

    fn classes(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_classified_names_override_defaults() {
        let loader = SubjectLoader::new(Arc::new(catalog()), Duration::from_secs(1));

        let mapper = loader
            .load(&TenantDb::new("t"), &AppId::new("a"), classes(&["B01", "V01"]))
            .await
            .unwrap();

        assert_eq!(mapper.resolve("asset", "B01").unwrap(), "Buildings");
        assert_eq!(mapper.resolve("asset", "V01").unwrap(), "Lease assets");
        assert_eq!(mapper.resolve("debt", "B01").unwrap(), "リース債務");
    }

    #[tokio::test]
    async fn test_one_failed_classification_fails_the_load() {
        let catalog = catalog().failing_for("V01");
        let loader = SubjectLoader::new(Arc::new(catalog.clone()), Duration::from_secs(1));

        let err = loader
            .load(&TenantDb::new("t"), &AppId::new("a"), classes(&["B01", "V01"]))
            .await
            .unwrap_err();

        assert!(matches!(err, JournalError::RemoteCall { .. }));
        // every worker still reported before the failure surfaced
        assert_eq!(catalog.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_classifications_are_discovered_from_asset_master() {
        let assets = vec![
            SourceRecord::new().with("assets_class_id", FieldValue::lookup("V01")),
            SourceRecord::new().with("assets_class_id", FieldValue::lookup("B01")),
            SourceRecord::new().with("assets_class_id", FieldValue::lookup("V01")),
            SourceRecord::new().with("assets_class_id", FieldValue::lookup(" ")),
        ];
        let source = MockRecordSource::new().with_datastore("assets", "ds_assets", assets);
        let pager = SourcePager::new(Arc::new(source), 3, Duration::from_secs(1));
        let query = RecordQuery::new(TenantDb::new("t"), AppId::new("a"), DatastoreId::new("ds_assets"));

        let found = SubjectLoader::discover_classifications(&pager, query).await.unwrap();

        assert_eq!(found, classes(&["B01", "V01"]));
    }
}
