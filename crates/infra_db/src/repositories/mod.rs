//! Repository implementations for the journal catalogs
//!
//! Repositories own the SQL and the row types; the adapters in
//! [`crate::adapters`] translate rows into domain types behind the ports.
//! Queries are checked at runtime so the crate builds without a live
//! database.

pub mod pattern;
pub mod sequence;
pub mod subject;

pub use pattern::{PatternRepository, PatternRow};
pub use sequence::SequenceRepository;
pub use subject::{SubjectRepository, SubjectRow};
