//! In-memory mock adapters for every journal port
//!
//! Each mock keeps its state behind an `Arc<Mutex<_>>`, so a clone handed
//! to the pipeline and the clone kept by a test observe the same state.

use super::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use core_kernel::{Operator, SortOrder};

use crate::import::{ImportErrorDetail, ImportMetadata, ImportRequest, ImportResponse};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Record source
// ============================================================================

#[derive(Debug, Default)]
struct RecordStoreState {
    datastores: HashMap<String, DatastoreId>,
    records: HashMap<DatastoreId, Vec<SourceRecord>>,
    fail_on_page: Option<u64>,
    fetched_pages: Vec<(DatastoreId, u64)>,
    queries: Vec<RecordQuery>,
    marked: Vec<StatusUpdate>,
}

/// In-memory record store applying conditions and sort keys
#[derive(Debug, Clone, Default)]
pub struct MockRecordSource {
    state: Arc<Mutex<RecordStoreState>>,
}

impl MockRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a datastore key with its id and records
    pub fn with_datastore(
        self,
        key: impl Into<String>,
        datastore_id: impl Into<String>,
        records: Vec<SourceRecord>,
    ) -> Self {
        {
            let mut state = lock(&self.state);
            let id = DatastoreId::new(datastore_id);
            state.datastores.insert(key.into(), id.clone());
            state.records.insert(id, records);
        }
        self
    }

    /// Fails every fetch of the given 1-based page
    pub fn failing_on_page(self, page_index: u64) -> Self {
        lock(&self.state).fail_on_page = Some(page_index);
        self
    }

    /// Pages fetched so far, in order
    pub fn fetched_pages(&self) -> Vec<(DatastoreId, u64)> {
        lock(&self.state).fetched_pages.clone()
    }

    /// Queries received by `count`, in order
    pub fn queries(&self) -> Vec<RecordQuery> {
        lock(&self.state).queries.clone()
    }

    pub fn marked(&self) -> Vec<StatusUpdate> {
        lock(&self.state).marked.clone()
    }

    fn select(state: &RecordStoreState, query: &RecordQuery) -> Vec<SourceRecord> {
        let mut selected: Vec<SourceRecord> = state
            .records
            .get(&query.datastore_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| query.conditions.iter().all(|c| matches(record, c)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        selected.sort_by(|a, b| {
            query
                .sorts
                .iter()
                .map(|sort| {
                    let ordering = a.text(&sort.field_id).cmp(b.text(&sort.field_id));
                    match sort.order {
                        SortOrder::Ascend => ordering,
                        SortOrder::Descend => ordering.reverse(),
                    }
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        selected
    }
}

fn matches(record: &SourceRecord, condition: &core_kernel::Condition) -> bool {
    let actual = record.text(&condition.field_id);
    let expected = condition.value.as_str();
    match condition.operator {
        Operator::Eq => actual == expected,
        Operator::NotEq => actual != expected,
        Operator::Gt => actual > expected,
        Operator::GtEq => actual >= expected,
        Operator::Lt => actual < expected,
        Operator::LtEq => actual <= expected,
        Operator::Like => actual.contains(expected),
        Operator::In => expected.split(',').any(|v| v.trim() == actual),
    }
}

impl DomainPort for MockRecordSource {}

#[async_trait]
impl RecordSourcePort for MockRecordSource {
    async fn datastore_id(
        &self,
        _tenant: &TenantDb,
        _app_id: &AppId,
        key: &str,
    ) -> Result<DatastoreId, PortError> {
        lock(&self.state)
            .datastores
            .get(key)
            .cloned()
            .ok_or_else(|| PortError::not_found("Datastore", key))
    }

    async fn count(&self, query: &RecordQuery) -> Result<u64, PortError> {
        let mut state = lock(&self.state);
        state.queries.push(query.clone());
        Ok(Self::select(&state, query).len() as u64)
    }

    async fn fetch(
        &self,
        query: &RecordQuery,
        page_index: u64,
        page_size: u64,
    ) -> Result<Vec<SourceRecord>, PortError> {
        let mut state = lock(&self.state);
        if page_index == 0 || page_size == 0 {
            return Err(PortError::validation("page index and size are 1-based"));
        }
        state.fetched_pages.push((query.datastore_id.clone(), page_index));
        if state.fail_on_page == Some(page_index) {
            return Err(PortError::connection(format!("page {page_index} unavailable")));
        }
        let skip = usize::try_from((page_index - 1) * page_size).unwrap_or(usize::MAX);
        let take = usize::try_from(page_size).unwrap_or(usize::MAX);
        Ok(Self::select(&state, query).into_iter().skip(skip).take(take).collect())
    }

    async fn mark_journaled(&self, update: &StatusUpdate) -> Result<(), PortError> {
        lock(&self.state).marked.push(update.clone());
        Ok(())
    }
}

// ============================================================================
// Settings and access
// ============================================================================

/// Returns the same settings for every application
#[derive(Debug, Clone)]
pub struct MockSettingsPort {
    settings: AppSettings,
}

impl MockSettingsPort {
    pub fn new(settings: AppSettings) -> Self {
        Self { settings }
    }
}

impl DomainPort for MockSettingsPort {}

#[async_trait]
impl SettingsPort for MockSettingsPort {
    async fn app_settings(&self, _tenant: &TenantDb, _app_id: &AppId) -> Result<AppSettings, PortError> {
        Ok(self.settings.clone())
    }
}

/// Grants a fixed set of owner keys
#[derive(Debug, Clone)]
pub struct MockAccessPort {
    owners: Vec<String>,
}

impl MockAccessPort {
    pub fn new(owners: Vec<String>) -> Self {
        Self { owners }
    }
}

impl Default for MockAccessPort {
    fn default() -> Self {
        Self::new(vec!["owner-all".to_string()])
    }
}

impl DomainPort for MockAccessPort {}

#[async_trait]
impl AccessPort for MockAccessPort {
    async fn readable_owners(
        &self,
        _tenant: &TenantDb,
        _user_id: &UserId,
        _datastore_id: &DatastoreId,
    ) -> Result<Vec<String>, PortError> {
        Ok(self.owners.clone())
    }
}

// ============================================================================
// Sequence
// ============================================================================

/// Atomic in-memory counters
#[derive(Debug, Clone, Default)]
pub struct MockSequencePort {
    counters: Arc<Mutex<HashMap<ScopeKey, i64>>>,
    failing: bool,
}

impl MockSequencePort {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sequence service that is down
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Seeds a counter with its current value
    pub fn with_value(self, scope: ScopeKey, value: i64) -> Self {
        lock(&self.counters).insert(scope, value);
        self
    }

    pub fn current(&self, scope: &ScopeKey) -> Option<i64> {
        lock(&self.counters).get(scope).copied()
    }
}

impl DomainPort for MockSequencePort {}

#[async_trait]
impl SequencePort for MockSequencePort {
    async fn get_or_create(&self, scope: &ScopeKey) -> Result<i64, PortError> {
        if self.failing {
            return Err(PortError::unavailable("sequence"));
        }
        let mut counters = lock(&self.counters);
        let value = counters.entry(scope.clone()).and_modify(|v| *v += 1).or_insert(1);
        Ok(*value)
    }
}

// ============================================================================
// Catalogs
// ============================================================================

#[derive(Debug, Default)]
struct SubjectCatalogState {
    default: Vec<SubjectEntry>,
    classified: HashMap<String, Vec<SubjectEntry>>,
    failing: Option<String>,
    calls: Vec<Option<String>>,
}

/// Subject lists per classification
#[derive(Debug, Clone, Default)]
pub struct MockSubjectCatalog {
    state: Arc<Mutex<SubjectCatalogState>>,
}

impl MockSubjectCatalog {
    pub fn new(default: Vec<SubjectEntry>) -> Self {
        let catalog = Self::default();
        lock(&catalog.state).default = default;
        catalog
    }

    pub fn with_classification(self, classification: impl Into<String>, entries: Vec<SubjectEntry>) -> Self {
        lock(&self.state).classified.insert(classification.into(), entries);
        self
    }

    /// Fails the lookup for one classification
    pub fn failing_for(self, classification: impl Into<String>) -> Self {
        lock(&self.state).failing = Some(classification.into());
        self
    }

    /// Classifications requested so far (`None` for the default list)
    pub fn calls(&self) -> Vec<Option<String>> {
        lock(&self.state).calls.clone()
    }
}

impl DomainPort for MockSubjectCatalog {}

#[async_trait]
impl SubjectCatalogPort for MockSubjectCatalog {
    async fn list_subjects(
        &self,
        _tenant: &TenantDb,
        _app_id: &AppId,
        classification: Option<&str>,
    ) -> Result<Vec<SubjectEntry>, PortError> {
        let mut state = lock(&self.state);
        state.calls.push(classification.map(str::to_string));
        match classification {
            None => Ok(state.default.clone()),
            Some(c) if state.failing.as_deref() == Some(c) => {
                Err(PortError::connection(format!("subject list for {c} unavailable")))
            }
            Some(c) => Ok(state.classified.get(c).cloned().unwrap_or_default()),
        }
    }
}

/// Patterns per group
#[derive(Debug, Clone, Default)]
pub struct MockPatternCatalog {
    groups: Arc<Mutex<HashMap<String, Vec<BookkeepingPattern>>>>,
}

impl MockPatternCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(self, group: impl Into<String>, patterns: Vec<BookkeepingPattern>) -> Self {
        lock(&self.groups).insert(group.into(), patterns);
        self
    }
}

impl DomainPort for MockPatternCatalog {}

#[async_trait]
impl PatternCatalogPort for MockPatternCatalog {
    async fn get_patterns(
        &self,
        _tenant: &TenantDb,
        _app_id: &AppId,
        group: &str,
    ) -> Result<Vec<BookkeepingPattern>, PortError> {
        Ok(lock(&self.groups).get(group).cloned().unwrap_or_default())
    }
}

// ============================================================================
// Ledger sink
// ============================================================================

#[derive(Debug, Default)]
struct SinkState {
    metadata: Vec<ImportMetadata>,
    accepted: Vec<SourceRecord>,
    received: u64,
    completed: bool,
    deletes: Vec<DeleteRequest>,
    unconfirmed: u64,
}

#[derive(Debug, Clone, Default)]
struct SinkBehaviour {
    fail_at: Option<(u64, Vec<ImportErrorDetail>)>,
    fail_open: bool,
    stalled: bool,
}

/// Streaming sink that accepts lines until a configured failure
#[derive(Debug, Clone, Default)]
pub struct MockLedgerSink {
    state: Arc<Mutex<SinkState>>,
    behaviour: SinkBehaviour,
}

impl MockLedgerSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects the given 1-based session line with these errors
    pub fn failing_at(mut self, line: u64, errors: Vec<ImportErrorDetail>) -> Self {
        self.behaviour.fail_at = Some((line, errors));
        self
    }

    /// Refuses to open sessions
    pub fn refusing_sessions(mut self) -> Self {
        self.behaviour.fail_open = true;
        self
    }

    /// Accepts requests but never answers
    pub fn stalled(mut self) -> Self {
        self.behaviour.stalled = true;
        self
    }

    /// Seeds how many unconfirmed lines a delete will find
    pub fn with_unconfirmed(self, count: u64) -> Self {
        lock(&self.state).unconfirmed = count;
        self
    }

    pub fn accepted(&self) -> Vec<SourceRecord> {
        lock(&self.state).accepted.clone()
    }

    /// Lines received, including rejected ones
    pub fn received(&self) -> u64 {
        lock(&self.state).received
    }

    pub fn metadata(&self) -> Vec<ImportMetadata> {
        lock(&self.state).metadata.clone()
    }

    pub fn completed(&self) -> bool {
        lock(&self.state).completed
    }

    pub fn deletes(&self) -> Vec<DeleteRequest> {
        lock(&self.state).deletes.clone()
    }
}

impl DomainPort for MockLedgerSink {}

#[async_trait]
impl LedgerSinkPort for MockLedgerSink {
    async fn open_import(&self) -> Result<ImportSession, PortError> {
        if self.behaviour.fail_open {
            return Err(PortError::unavailable("ledger sink"));
        }
        let (session, mut requests, responses) = ImportSession::channel(16);
        let state = Arc::clone(&self.state);
        let behaviour = self.behaviour.clone();

        tokio::spawn(async move {
            let mut line_no = 0u64;
            let mut failed = false;
            while let Some(request) = requests.recv().await {
                let batch = match request {
                    ImportRequest::Metadata(metadata) => {
                        lock(&state).metadata.push(metadata);
                        continue;
                    }
                    ImportRequest::Complete => {
                        lock(&state).completed = true;
                        break;
                    }
                    ImportRequest::Lines(batch) => batch,
                };

                let mut inserted = 0u64;
                let mut errors = Vec::new();
                {
                    let mut state = lock(&state);
                    for line in batch {
                        line_no += 1;
                        state.received += 1;
                        if failed {
                            continue;
                        }
                        match &behaviour.fail_at {
                            Some((at, details)) if *at == line_no => {
                                errors = details.clone();
                                failed = true;
                            }
                            _ => {
                                state.accepted.push(line);
                                inserted += 1;
                            }
                        }
                    }
                }
                if behaviour.stalled {
                    continue;
                }
                let response = if errors.is_empty() {
                    ImportResponse::success(inserted, 0)
                } else {
                    ImportResponse::failure(inserted, 0, errors)
                };
                if responses.send(response).await.is_err() {
                    break;
                }
            }
        });

        Ok(session)
    }

    async fn delete_unconfirmed(&self, request: &DeleteRequest) -> Result<u64, PortError> {
        let mut state = lock(&self.state);
        state.deletes.push(request.clone());
        Ok(std::mem::take(&mut state.unconfirmed))
    }
}

// ============================================================================
// Tracker and error logs
// ============================================================================

#[derive(Debug, Default)]
struct TrackerState {
    tasks: Vec<TaskSpec>,
    updates: Vec<TaskUpdate>,
}

/// Records every task and update
#[derive(Debug, Clone, Default)]
pub struct MockTaskTracker {
    state: Arc<Mutex<TrackerState>>,
    failing: bool,
}

impl MockTaskTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tracker that rejects every call
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn tasks(&self) -> Vec<TaskSpec> {
        lock(&self.state).tasks.clone()
    }

    pub fn updates(&self) -> Vec<TaskUpdate> {
        lock(&self.state).updates.clone()
    }
}

impl DomainPort for MockTaskTracker {}

#[async_trait]
impl TaskTrackerPort for MockTaskTracker {
    async fn create_task(&self, task: &TaskSpec) -> Result<(), PortError> {
        if self.failing {
            return Err(PortError::unavailable("task tracker"));
        }
        lock(&self.state).tasks.push(task.clone());
        Ok(())
    }

    async fn update_task(&self, update: &TaskUpdate) -> Result<(), PortError> {
        if self.failing {
            return Err(PortError::unavailable("task tracker"));
        }
        lock(&self.state).updates.push(update.clone());
        Ok(())
    }
}

/// Keeps written logs in memory
#[derive(Debug, Clone, Default)]
pub struct MockErrorLogStore {
    files: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockErrorLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(file name, content)` of every log written
    pub fn files(&self) -> Vec<(String, String)> {
        lock(&self.files).clone()
    }
}

impl DomainPort for MockErrorLogStore {}

#[async_trait]
impl ErrorLogStorePort for MockErrorLogStore {
    async fn write_error_log(
        &self,
        tenant: &TenantDb,
        app_id: &AppId,
        file_name: &str,
        content: &str,
    ) -> Result<StoredFile, PortError> {
        lock(&self.files).push((file_name.to_string(), content.to_string()));
        Ok(StoredFile {
            url: format!("mock://{tenant}/{app_id}/{file_name}"),
            name: file_name.to_string(),
        })
    }
}
