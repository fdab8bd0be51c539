//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! journal engine test suite.
//!
//! # Modules
//!
//! - `fixtures`: the standard lease pattern catalog, subject lists and run identity
//! - `builders`: builders for source records and bookkeeping patterns
//! - `assertions`: invariant checks over generated journal lines
//! - `generators`: property-based test data generators

pub mod assertions;
pub mod builders;
pub mod fixtures;
pub mod generators;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
pub use generators::*;
