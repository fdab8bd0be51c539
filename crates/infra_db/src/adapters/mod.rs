//! Domain Adapters
//!
//! PostgreSQL implementations of the journal domain's catalog ports. Each
//! adapter implements the port traits, translates rows into domain types and
//! maps `DatabaseError` into `PortError`.

pub mod catalog;

pub use catalog::PostgresCatalogAdapter;
