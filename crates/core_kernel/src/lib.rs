//! Core Kernel - Foundational types shared by the journal generation crates
//!
//! This crate provides the vocabulary every other crate speaks:
//! - Typed business records (`FieldValue`, `SourceRecord`) as served by the record store
//! - Query predicates and sort keys used when paging through a datastore
//! - The handling month that bounds every journal run
//! - Strongly-typed identifiers and the shared port error taxonomy

pub mod identifiers;
pub mod ports;
pub mod query;
pub mod record;
pub mod temporal;

pub use identifiers::{AppId, DatastoreId, JobId, TenantDb, UserId};
pub use ports::{DomainPort, PortError};
pub use query::{Condition, Operator, RecordQuery, SortKey, SortOrder};
pub use record::{parse_decimal, DataType, FieldValue, RecordError, SourceRecord};
pub use temporal::{
    format_date, is_unset_date, parse_date, HandlingMonth, TemporalError, DATE_FORMAT, ZERO_DATE,
};
