//! Journal Pipeline
//!
//! Runs one journal flow end to end:
//!
//! 1. **start**: read the application's handling month and confirm method
//! 2. **collect-data**: resolve datastores and owner keys, page the source
//!    records of the month, load subjects and patterns, allocate the voucher
//! 3. **delete-old-data**: drop the still-unconfirmed lines of this kind
//! 4. **generate-data**: build the lines and stream them into the ledger
//! 5. **update-status**: mark the month's source records as journaled
//! 6. **end**
//!
//! A failure at any step writes `<job>.log`, reports the failed step to the
//! tracker and is returned to the caller. Lines already accepted by the
//! ledger stay there.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use core_kernel::{
    format_date, AppId, Condition, DataType, DatastoreId, HandlingMonth, JobId, Operator,
    PortError, RecordQuery, SortKey, SourceRecord, TenantDb, UserId, ZERO_DATE,
};
use domain_journal::fields;
use domain_journal::{
    AccessPort, AmountAdjustment, AppSettings, ChangeSet, ConfirmMethod, DeleteRequest,
    ErrorLogStorePort, ImportMetadata, JournalError, JournalKind, JournalLine,
    JournalLineBuilder, LedgerSinkPort, LineContext, LineSegment, PatternCatalog,
    PatternCatalogPort, PatternSelector, ProgressStep, RecordSourcePort, Remark, ScopeKey,
    SequenceAllocator, SequencePort, SettingsPort, StatusUpdate, StoredFile, SubjectCatalogPort,
    SubjectMapper, TaskSpec, TaskTrackerPort, VoucherNumber, ASSET_DATASTORE, LEDGER_DATASTORE,
};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::PipelineConfig;
use crate::localization::{FieldLabels, Localizer};
use crate::pager::{call_with_timeout, SourcePager};
use crate::progress::ProgressReporter;
use crate::streamer::BulkImportStreamer;
use crate::subjects::SubjectLoader;

/// The collaborators of a pipeline
#[derive(Clone)]
pub struct JournalPorts {
    pub records: Arc<dyn RecordSourcePort>,
    pub settings: Arc<dyn SettingsPort>,
    pub access: Arc<dyn AccessPort>,
    pub sequences: Arc<dyn SequencePort>,
    pub subjects: Arc<dyn SubjectCatalogPort>,
    pub patterns: Arc<dyn PatternCatalogPort>,
    pub ledger: Arc<dyn LedgerSinkPort>,
    pub tracker: Arc<dyn TaskTrackerPort>,
    pub error_logs: Arc<dyn ErrorLogStorePort>,
}

/// Who asks for a journal run, and for which application
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub tenant: TenantDb,
    pub app_id: AppId,
    pub user_id: UserId,
    /// Requested message language, negotiated against the embedded locales
    pub language: String,
    /// Owners written onto the generated ledger lines
    pub owner_keys: Vec<String>,
    /// Labels used in field-scoped import errors
    pub field_labels: FieldLabels,
    /// Entry date of the lines; today when not given
    pub entry_date: Option<NaiveDate>,
}

impl RunRequest {
    pub fn new(tenant: TenantDb, app_id: AppId, user_id: UserId) -> Self {
        Self {
            tenant,
            app_id,
            user_id,
            language: String::new(),
            owner_keys: Vec::new(),
            field_labels: FieldLabels::new(),
            entry_date: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_owner_keys(mut self, owner_keys: Vec<String>) -> Self {
        self.owner_keys = owner_keys;
        self
    }

    pub fn with_field_labels(mut self, field_labels: FieldLabels) -> Self {
        self.field_labels = field_labels;
        self
    }

    pub fn with_entry_date(mut self, entry_date: NaiveDate) -> Self {
        self.entry_date = Some(entry_date);
        self
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub job_id: JobId,
    pub kind: JournalKind,
    pub voucher: VoucherNumber,
    pub lines_generated: u64,
    pub inserted: u64,
    pub updated: u64,
    pub deleted: u64,
}

/// A run started with [`JournalPipeline::spawn`]
#[derive(Debug)]
pub struct JobHandle {
    pub job_id: JobId,
    handle: JoinHandle<Result<RunSummary, JournalError>>,
}

impl JobHandle {
    /// Waits for the run to finish
    pub async fn join(self) -> Result<RunSummary, JournalError> {
        match self.handle.await {
            Ok(result) => result,
            Err(join_error) => Err(JournalError::remote(
                "job.join",
                PortError::internal(format!("journal job {} stopped: {join_error}", self.job_id)),
            )),
        }
    }
}

/// Everything collected before lines are generated
struct CollectedData {
    settings: AppSettings,
    source_datastore: DatastoreId,
    ledger_datastore: DatastoreId,
    change_sets: Vec<ChangeSet>,
    prior_confirmed: HashMap<(String, String), SourceRecord>,
    subjects: SubjectMapper,
    patterns: PatternCatalog,
}

/// Orchestrates the journal flows
#[derive(Clone)]
pub struct JournalPipeline {
    ports: JournalPorts,
    config: Arc<PipelineConfig>,
}

impl JournalPipeline {
    pub fn new(ports: JournalPorts, config: PipelineConfig) -> Self {
        Self {
            ports,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Registers a job and runs it in the background
    pub async fn spawn(&self, kind: JournalKind, request: RunRequest) -> JobHandle {
        let job_id = JobId::new();
        self.register(job_id, kind, &request).await;

        let pipeline = self.clone();
        let handle = tokio::spawn(async move { pipeline.execute(job_id, kind, request).await });
        JobHandle { job_id, handle }
    }

    /// Registers a job and runs it to completion
    pub async fn run(&self, kind: JournalKind, request: RunRequest) -> Result<RunSummary, JournalError> {
        let job_id = JobId::new();
        self.register(job_id, kind, &request).await;
        self.execute(job_id, kind, request).await
    }

    async fn register(&self, job_id: JobId, kind: JournalKind, request: &RunRequest) {
        let task = TaskSpec {
            job_id,
            job_name: format!("{}_{}", kind.name(), request.app_id),
            kind,
            tenant: request.tenant.clone(),
            app_id: request.app_id.clone(),
            user_id: request.user_id.clone(),
            steps: ProgressStep::ALL.to_vec(),
            started_at: Utc::now(),
        };
        self.reporter(job_id, request).register(&task).await;
    }

    fn reporter(&self, job_id: JobId, request: &RunRequest) -> ProgressReporter {
        ProgressReporter::new(Arc::clone(&self.ports.tracker), job_id, request.tenant.clone())
    }

    async fn execute(&self, job_id: JobId, kind: JournalKind, request: RunRequest) -> Result<RunSummary, JournalError> {
        let span = info_span!(
            "journal_run",
            job_id = %job_id,
            app_id = %request.app_id,
            kind = %kind
        );

        async move {
            let localizer = Localizer::negotiate(&request.language, &self.config.default_language);
            let progress = self.reporter(job_id, &request);
            let mut step = ProgressStep::Start;
            info!("Journal run started");

            match self
                .run_steps(job_id, kind, &request, &localizer, &progress, &mut step)
                .await
            {
                Ok(summary) => {
                    info!(
                        voucher = %summary.voucher,
                        lines = summary.lines_generated,
                        inserted = summary.inserted,
                        deleted = summary.deleted,
                        "Journal run finished"
                    );
                    progress.completed(localizer.run_completed(summary.inserted)).await;
                    Ok(summary)
                }
                Err(run_error) => {
                    error!(step = step.as_str(), error = %run_error, "Journal run failed");
                    let error_file = self.write_error_log(job_id, &request, &run_error).await;
                    progress
                        .failed(step, localizer.run_failed(&run_error), error_file)
                        .await;
                    Err(run_error)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_steps(
        &self,
        job_id: JobId,
        kind: JournalKind,
        request: &RunRequest,
        localizer: &Localizer,
        progress: &ProgressReporter,
        step: &mut ProgressStep,
    ) -> Result<RunSummary, JournalError> {
        progress.step(*step, localizer.progress(*step)).await;
        let settings = call_with_timeout(
            "settings.app_settings",
            self.config.read_timeout(),
            self.ports.settings.app_settings(&request.tenant, &request.app_id),
        )
        .await?;

        *step = ProgressStep::CollectData;
        progress.step(*step, localizer.progress(*step)).await;
        let collected = self.collect(kind, request, settings).await?;
        let voucher = SequenceAllocator::new(Arc::clone(&self.ports.sequences))
            .allocate(&ScopeKey::voucher(request.tenant.clone(), &request.app_id))
            .await?;

        *step = ProgressStep::DeleteOldData;
        progress.step(*step, localizer.progress(*step)).await;
        let deleted = call_with_timeout(
            "ledger.delete_unconfirmed",
            self.config.read_timeout(),
            self.ports.ledger.delete_unconfirmed(&DeleteRequest {
                tenant: request.tenant.clone(),
                app_id: request.app_id.clone(),
                datastore_id: collected.ledger_datastore.clone(),
                kind,
                user_id: request.user_id.clone(),
            }),
        )
        .await?;
        debug!(deleted, "Unconfirmed lines deleted");

        *step = ProgressStep::GenerateData;
        progress.step(*step, localizer.progress(*step)).await;
        let month = collected.settings.handling_month;
        let context = LineContext {
            voucher: voucher.clone(),
            entry_date: request
                .entry_date
                .unwrap_or_else(|| Local::now().date_naive()),
            handling_month: month,
            kind,
            remark: remark_for(kind, localizer, &month),
        };
        let lines = generate_lines(kind, &collected, context)?;
        let lines_generated = lines.len() as u64;
        info!(lines = lines_generated, voucher = %voucher, "Journal lines generated");

        let (inserted, updated) = if lines.is_empty() {
            (0, 0)
        } else {
            let metadata = ImportMetadata {
                key: job_id,
                tenant: request.tenant.clone(),
                app_id: request.app_id.clone(),
                datastore_id: collected.ledger_datastore.clone(),
                writer: request.user_id.clone(),
                owners: request.owner_keys.clone(),
            };
            let records = lines.iter().map(JournalLine::to_record).collect();
            let streamer = BulkImportStreamer::new(
                Arc::clone(&self.ports.ledger),
                self.config.import_batch_size,
                self.config.write_timeout(),
            );
            let result = streamer
                .stream(metadata, records, localizer, &request.field_labels)
                .await?;
            if !result.is_success() {
                return Err(JournalError::ValidationFailure {
                    errors: result.errors,
                    inserted: result.inserted_count,
                    updated: result.updated_count,
                });
            }
            (result.inserted_count, result.updated_count)
        };

        *step = ProgressStep::UpdateStatus;
        progress.step(*step, localizer.progress(*step)).await;
        call_with_timeout(
            "records.mark_journaled",
            self.config.read_timeout(),
            self.ports.records.mark_journaled(&StatusUpdate {
                tenant: request.tenant.clone(),
                app_id: request.app_id.clone(),
                datastore_id: collected.source_datastore.clone(),
                kind,
                month,
                user_id: request.user_id.clone(),
            }),
        )
        .await?;

        *step = ProgressStep::End;
        Ok(RunSummary {
            job_id,
            kind,
            voucher,
            lines_generated,
            inserted,
            updated,
            deleted,
        })
    }

    async fn collect(
        &self,
        kind: JournalKind,
        request: &RunRequest,
        settings: AppSettings,
    ) -> Result<CollectedData, JournalError> {
        let read_timeout = self.config.read_timeout();
        let source_datastore = self.datastore(request, kind.source_datastore()).await?;
        let ledger_datastore = self.datastore(request, LEDGER_DATASTORE).await?;
        let asset_datastore = self.datastore(request, ASSET_DATASTORE).await?;

        let owners = call_with_timeout(
            "access.readable_owners",
            read_timeout,
            self.ports
                .access
                .readable_owners(&request.tenant, &request.user_id, &source_datastore),
        )
        .await?;
        let pager = SourcePager::new(Arc::clone(&self.ports.records), self.config.page_size, read_timeout);

        let month = settings.handling_month;
        let base = RecordQuery::new(request.tenant.clone(), request.app_id.clone(), source_datastore.clone())
            .with_owners(owners.clone());
        let window = base
            .clone()
            .with_conditions(month_window(kind.window_field(), &month))
            .with_condition(Condition::eq(fields::CONFIRMED_DATE, DataType::Date, ZERO_DATE));

        let change_sets = match kind {
            JournalKind::LeaseChange => {
                let query = window
                    .sorted_by(SortKey::ascend(fields::HISTORY_NO))
                    .sorted_by(SortKey::ascend(fields::CREATED_AT));
                pager.change_sets(&query).await?
            }
            JournalKind::Payment | JournalKind::Depreciation => {
                let query = window
                    .sorted_by(SortKey::ascend(fields::ASSET_PARENT_NO))
                    .sorted_by(SortKey::ascend(fields::ASSET_BRANCH_NO))
                    .sorted_by(SortKey::ascend(kind.window_field()));
                pager
                    .fetch_all(&query)
                    .await?
                    .into_iter()
                    .map(ChangeSet::single)
                    .collect()
            }
        };
        debug!(change_sets = change_sets.len(), "Source records collected");

        let prior_confirmed = if kind == JournalKind::Depreciation && settings.confirm_method.needs_prior() {
            let query = base
                .with_conditions(month_window(fields::DEPRECIATION_DATE, &month))
                .with_condition(Condition::not_eq(fields::CONFIRMED_DATE, DataType::Date, ZERO_DATE))
                .sorted_by(SortKey::ascend(fields::ASSET_PARENT_NO))
                .sorted_by(SortKey::ascend(fields::ASSET_BRANCH_NO))
                .sorted_by(SortKey::descend(fields::REGISTERED_DATE));
            latest_per_asset(pager.fetch_all(&query).await?)
        } else {
            HashMap::new()
        };

        let asset_query = RecordQuery::new(request.tenant.clone(), request.app_id.clone(), asset_datastore)
            .with_owners(owners);
        let classifications = SubjectLoader::discover_classifications(&pager, asset_query).await?;
        let subjects = SubjectLoader::new(Arc::clone(&self.ports.subjects), read_timeout)
            .load(&request.tenant, &request.app_id, classifications)
            .await?;

        let patterns = call_with_timeout(
            "patterns.get_patterns",
            read_timeout,
            self.ports
                .patterns
                .get_patterns(&request.tenant, &request.app_id, kind.pattern_group()),
        )
        .await?;
        let patterns = PatternCatalog::new(kind.pattern_group(), patterns)?;

        Ok(CollectedData {
            settings,
            source_datastore,
            ledger_datastore,
            change_sets,
            prior_confirmed,
            subjects,
            patterns,
        })
    }

    async fn datastore(&self, request: &RunRequest, key: &str) -> Result<DatastoreId, JournalError> {
        call_with_timeout(
            "records.datastore_id",
            self.config.read_timeout(),
            self.ports
                .records
                .datastore_id(&request.tenant, &request.app_id, key),
        )
        .await
    }

    /// Writes the error text as `<job>.log`; a storage failure only logs
    async fn write_error_log(&self, job_id: JobId, request: &RunRequest, run_error: &JournalError) -> Option<StoredFile> {
        let mut content = run_error.to_string();
        if let JournalError::ValidationFailure { errors, .. } = run_error {
            for line in errors {
                content.push('\n');
                content.push_str(line);
            }
        }

        let file_name = format!("{job_id}.log");
        match self
            .ports
            .error_logs
            .write_error_log(&request.tenant, &request.app_id, &file_name, &content)
            .await
        {
            Ok(file) => Some(file),
            Err(store_error) => {
                warn!(error = %store_error, file = %file_name, "Could not store error log");
                None
            }
        }
    }
}

impl std::fmt::Debug for JournalPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JournalPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn month_window(field_id: &str, month: &HandlingMonth) -> [Condition; 2] {
    [
        Condition::new(field_id, DataType::Date, Operator::GtEq, format_date(month.first_day())),
        Condition::new(field_id, DataType::Date, Operator::LtEq, format_date(month.last_day())),
    ]
}

fn remark_for(kind: JournalKind, localizer: &Localizer, month: &HandlingMonth) -> Remark {
    match kind {
        JournalKind::LeaseChange => Remark::PatternName,
        JournalKind::Payment => Remark::Fixed(localizer.payment_remark(month)),
        JournalKind::Depreciation => Remark::Fixed(localizer.depreciation_remark(month)),
    }
}

fn asset_key(record: &SourceRecord) -> (String, String) {
    (
        record.text(fields::ASSET_PARENT_NO).trim().to_string(),
        record.text(fields::ASSET_BRANCH_NO).trim().to_string(),
    )
}

/// Keeps the first record per asset; callers sort by registration date, newest first
fn latest_per_asset(records: Vec<SourceRecord>) -> HashMap<(String, String), SourceRecord> {
    let mut latest = HashMap::new();
    for record in records {
        latest.entry(asset_key(&record)).or_insert(record);
    }
    latest
}

/// Builds every line of a run, in change-set order
fn generate_lines(
    kind: JournalKind,
    collected: &CollectedData,
    context: LineContext,
) -> Result<Vec<JournalLine>, JournalError> {
    let mut builder = JournalLineBuilder::new(context, &collected.subjects);
    let mut lines = Vec::new();

    match kind {
        JournalKind::LeaseChange => {
            let selector = PatternSelector::new();
            for change_set in &collected.change_sets {
                let Some(selected) = selector.select(change_set)? else {
                    continue;
                };
                let Some(pattern) = collected.patterns.for_kind(selected) else {
                    debug!(
                        history_no = change_set.key(),
                        pattern_id = selected.pattern_id(),
                        "Pattern not in catalog, change-set skipped"
                    );
                    continue;
                };
                lines.extend(builder.build(change_set, pattern)?);
            }
        }
        JournalKind::Payment => {
            let pattern = collected.patterns.first()?;
            for change_set in &collected.change_sets {
                lines.extend(builder.build(change_set, pattern)?);
            }
        }
        JournalKind::Depreciation => {
            let pattern = collected.patterns.first()?;
            let method = collected.settings.confirm_method;
            for change_set in &collected.change_sets {
                let prior = collected.prior_confirmed.get(&asset_key(change_set.current()));
                let event = match (method, prior) {
                    (ConfirmMethod::Difference, Some(prior)) => {
                        let confirmed = prior.decimal(fields::DEPRECIATION_AMOUNT)?;
                        builder.build_event(&[LineSegment::new(change_set, pattern)
                            .adjusted(AmountAdjustment::Subtract(confirmed))])?
                    }
                    (ConfirmMethod::Reissue, Some(prior)) => {
                        let reversed = ChangeSet::single(prior.clone());
                        builder.build_event(&[
                            LineSegment::new(&reversed, pattern).adjusted(AmountAdjustment::Reverse),
                            LineSegment::new(change_set, pattern),
                        ])?
                    }
                    _ => builder.build(change_set, pattern)?,
                };
                lines.extend(event);
            }
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::FieldValue;

    fn repayment(parent: &str, branch: &str, registered: &str) -> SourceRecord {
        SourceRecord::new()
            .with(fields::ASSET_PARENT_NO, FieldValue::text(parent))
            .with(fields::ASSET_BRANCH_NO, FieldValue::text(branch))
            .with(fields::DEPRECIATION_DATE, FieldValue::date("2023-04-30"))
            .with(fields::REGISTERED_DATE, FieldValue::date(registered))
    }

    #[test]
    fn test_month_window_covers_whole_month() {
        let month = HandlingMonth::new(2024, 2).unwrap();
        let [from, to] = month_window(fields::RECORDED_DATE, &month);
        assert_eq!(from.operator, Operator::GtEq);
        assert_eq!(from.value, "2024-02-01");
        assert_eq!(to.operator, Operator::LtEq);
        assert_eq!(to.value, "2024-02-29");
    }

    #[test]
    fn test_latest_per_asset_keeps_first_seen() {
        let latest = latest_per_asset(vec![
            repayment("A1", "1", "2023-04-20"),
            repayment("A1", "1", "2023-04-05"),
            repayment("A2", "1", "2023-04-02"),
        ]);

        assert_eq!(latest.len(), 2);
        let a1 = &latest[&("A1".to_string(), "1".to_string())];
        assert_eq!(a1.text(fields::REGISTERED_DATE), "2023-04-20");
    }

    #[test]
    fn test_remark_follows_kind() {
        let localizer = Localizer::negotiate("en", "ja");
        let month = HandlingMonth::new(2023, 4).unwrap();
        assert_eq!(remark_for(JournalKind::LeaseChange, &localizer, &month), Remark::PatternName);
        assert_eq!(
            remark_for(JournalKind::Payment, &localizer, &month),
            Remark::Fixed("Payment_2023-04".to_string())
        );
    }
}
