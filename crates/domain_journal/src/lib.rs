//! Journal Domain - Bookkeeping Line Generation
//!
//! This crate turns business-event records of a lease/asset accounting
//! application into double-entry ledger lines. It is free of I/O: every
//! collaborator sits behind a port trait in [`ports`].
//!
//! # Flow of one change-set
//!
//! ```text
//! SourceRecord* ──ChangeSetGrouper──▶ ChangeSet ──PatternSelector──▶ PatternKind
//!                                         │                              │
//!                                         ▼                              ▼
//!                                JournalLineBuilder ◀──────── PatternCatalog
//!                                  │   │
//!                FormulaEvaluator ─┘   └─ SubjectMapper
//!                                         │
//!                                         ▼
//!                                   JournalLine*
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_journal::{ChangeSetGrouper, JournalLineBuilder, PatternSelector};
//!
//! let mut builder = JournalLineBuilder::new(context, &subjects);
//! for change_set in ChangeSetGrouper::group(records)? {
//!     if let Some(kind) = PatternSelector::new().select(&change_set)? {
//!         if let Some(pattern) = catalog.for_kind(kind) {
//!             lines.extend(builder.build(&change_set, pattern)?);
//!         }
//!     }
//! }
//! ```

pub mod change_set;
pub mod error;
pub mod fields;
pub mod formula;
pub mod import;
pub mod kind;
pub mod line;
pub mod pattern;
pub mod ports;
pub mod selector;
pub mod sequence;
pub mod settings;
pub mod subject;
pub mod task;

pub use change_set::{ChangeSet, ChangeSetGrouper};
pub use error::{FormulaError, JournalError};
pub use formula::{extract_tokens, Formula, FormulaEvaluator};
pub use import::{
    ImportErrorDetail, ImportMetadata, ImportRequest, ImportResponse, ImportResult, ImportSession,
    ImportStatus,
};
pub use kind::{JournalKind, ASSET_DATASTORE, LEDGER_DATASTORE};
pub use line::{AmountAdjustment, JournalLine, JournalLineBuilder, LineContext, LineSegment, Remark};
pub use pattern::{
    BookkeepingPattern, LendingDivision, LineTemplate, PatternCatalog, PatternKind, SourceSide,
};
pub use ports::{
    AccessPort, DeleteRequest, ErrorLogStorePort, LedgerSinkPort, PatternCatalogPort,
    RecordSourcePort, SequencePort, SettingsPort, StatusUpdate, SubjectCatalogPort,
    TaskTrackerPort,
};
pub use selector::{AssetEvent, LeaseAction, PatternSelector};
pub use sequence::{ScopeKey, SequenceAllocator, VoucherNumber};
pub use settings::{AppSettings, ConfirmMethod};
pub use subject::{SubjectEntry, SubjectMap, SubjectMapper};
pub use task::{ProgressStep, StoredFile, TaskSpec, TaskState, TaskUpdate};
