//! Journal Domain Ports
//!
//! Every collaborator the journal engine needs lives behind one of these
//! traits. The application layer receives them as `Arc<dyn ...>` and never
//! knows whether it talks to PostgreSQL, a remote record store or the
//! in-memory mocks in [`mock`].
//!
//! | port | collaborator |
//! |---|---|
//! | [`RecordSourcePort`] | paginated business records, status updates |
//! | [`SettingsPort`] | handling month and confirm method per application |
//! | [`AccessPort`] | owner keys a user may read |
//! | [`SequencePort`] | atomic voucher counters |
//! | [`SubjectCatalogPort`] | account subject lists |
//! | [`PatternCatalogPort`] | bookkeeping patterns |
//! | [`LedgerSinkPort`] | streaming bulk import of ledger lines |
//! | [`TaskTrackerPort`] | job progress (fire-and-forget) |
//! | [`ErrorLogStorePort`] | error log files |

use async_trait::async_trait;
use core_kernel::{
    AppId, DatastoreId, DomainPort, HandlingMonth, PortError, RecordQuery, SourceRecord, TenantDb,
    UserId,
};

use crate::import::ImportSession;
use crate::kind::JournalKind;
use crate::pattern::BookkeepingPattern;
use crate::sequence::ScopeKey;
use crate::settings::AppSettings;
use crate::subject::SubjectEntry;
use crate::task::{StoredFile, TaskSpec, TaskUpdate};

#[cfg(any(test, feature = "mock"))]
pub mod mock;

/// Marks the source records of a handling month as journaled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub tenant: TenantDb,
    pub app_id: AppId,
    pub datastore_id: DatastoreId,
    pub kind: JournalKind,
    pub month: HandlingMonth,
    pub user_id: UserId,
}

/// Deletes still-unconfirmed ledger lines of one journal kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub tenant: TenantDb,
    pub app_id: AppId,
    pub datastore_id: DatastoreId,
    pub kind: JournalKind,
    pub user_id: UserId,
}

/// The external record store
#[async_trait]
pub trait RecordSourcePort: DomainPort {
    /// Resolves a datastore key (`zougenrireki`, `shiwake`, ...) to its id
    async fn datastore_id(
        &self,
        tenant: &TenantDb,
        app_id: &AppId,
        key: &str,
    ) -> Result<DatastoreId, PortError>;

    /// Counts the records matching a query
    async fn count(&self, query: &RecordQuery) -> Result<u64, PortError>;

    /// Fetches one page (1-based `page_index`) in the query's sort order
    async fn fetch(
        &self,
        query: &RecordQuery,
        page_index: u64,
        page_size: u64,
    ) -> Result<Vec<SourceRecord>, PortError>;

    /// Marks the month's source records as journaled
    async fn mark_journaled(&self, update: &StatusUpdate) -> Result<(), PortError>;
}

/// Per-application journal settings
#[async_trait]
pub trait SettingsPort: DomainPort {
    async fn app_settings(&self, tenant: &TenantDb, app_id: &AppId) -> Result<AppSettings, PortError>;
}

/// The access-control resolver
#[async_trait]
pub trait AccessPort: DomainPort {
    /// Owner keys whose records the user may read in a datastore
    async fn readable_owners(
        &self,
        tenant: &TenantDb,
        user_id: &UserId,
        datastore_id: &DatastoreId,
    ) -> Result<Vec<String>, PortError>;
}

/// The sequence service
#[async_trait]
pub trait SequencePort: DomainPort {
    /// Creates the counter at 1 or increments it, returning the new value
    ///
    /// Implementations must be atomic across concurrent callers.
    async fn get_or_create(&self, scope: &ScopeKey) -> Result<i64, PortError>;
}

/// The subject/account catalog
#[async_trait]
pub trait SubjectCatalogPort: DomainPort {
    /// Lists subjects; `None` asks for the default (unclassified) list
    async fn list_subjects(
        &self,
        tenant: &TenantDb,
        app_id: &AppId,
        classification: Option<&str>,
    ) -> Result<Vec<SubjectEntry>, PortError>;
}

/// The pattern/template catalog
#[async_trait]
pub trait PatternCatalogPort: DomainPort {
    async fn get_patterns(
        &self,
        tenant: &TenantDb,
        app_id: &AppId,
        group: &str,
    ) -> Result<Vec<BookkeepingPattern>, PortError>;
}

/// The bulk ledger sink
#[async_trait]
pub trait LedgerSinkPort: DomainPort {
    /// Opens a streaming import session
    async fn open_import(&self) -> Result<ImportSession, PortError>;

    /// Deletes previously generated, unconfirmed lines; returns how many
    async fn delete_unconfirmed(&self, request: &DeleteRequest) -> Result<u64, PortError>;
}

/// The job/progress tracker
#[async_trait]
pub trait TaskTrackerPort: DomainPort {
    async fn create_task(&self, task: &TaskSpec) -> Result<(), PortError>;

    async fn update_task(&self, update: &TaskUpdate) -> Result<(), PortError>;
}

/// Object storage for error logs
#[async_trait]
pub trait ErrorLogStorePort: DomainPort {
    async fn write_error_log(
        &self,
        tenant: &TenantDb,
        app_id: &AppId,
        file_name: &str,
        content: &str,
    ) -> Result<StoredFile, PortError>;
}
