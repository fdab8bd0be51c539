//! Infrastructure Database Layer
//!
//! PostgreSQL implementations of the journal engine's catalog ports:
//!
//! - voucher sequences (`journal_sequences`), incremented atomically with an
//!   upsert so concurrent journal runs never share a voucher number
//! - bookkeeping patterns (`journal_patterns`), one row per pattern with the
//!   line templates stored as JSONB
//! - account subjects (`journal_subjects`), keyed by an optional asset
//!   classification
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, PostgresCatalogAdapter, DatabaseConfig};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/journal")).await?;
//! run_migrations(&pool).await?;
//! let catalogs = PostgresCatalogAdapter::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::PostgresCatalogAdapter;
pub use error::DatabaseError;
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool, APPLICATION_NAME};
