//! Journal Pipeline - Application Layer
//!
//! Wires the pure journal domain to its collaborators and runs the three
//! journal flows (lease changes, payments, depreciation) as background jobs.
//!
//! # Architecture
//!
//! - **Pager**: count and sequential page fetches with a read timeout
//! - **Subjects**: classification discovery and the concurrent subject fan-out
//! - **Streamer**: the bulk import session with the ledger sink
//! - **Progress**: fire-and-forget job tracker updates
//! - **Localization**: Fluent messages for import errors, remarks and progress
//! - **Pipeline**: the orchestrator
//!
//! # Example
//!
//! ```rust,ignore
//! use journal_pipeline::{JournalPipeline, JournalPorts, PipelineConfig, RunRequest};
//! use domain_journal::JournalKind;
//!
//! let config = PipelineConfig::from_env()?;
//! journal_pipeline::telemetry::init_tracing(&config.telemetry());
//!
//! let pipeline = JournalPipeline::new(ports, config);
//! let job = pipeline.spawn(JournalKind::Payment, RunRequest::new(tenant, app, user)).await;
//! let summary = job.join().await?;
//! ```

pub mod config;
pub mod localization;
pub mod pager;
pub mod pipeline;
pub mod progress;
pub mod streamer;
pub mod subjects;
pub mod telemetry;

pub use config::{ConfigError, PipelineConfig};
pub use localization::{FieldLabels, Localizer};
pub use pager::SourcePager;
pub use pipeline::{JobHandle, JournalPipeline, JournalPorts, RunRequest, RunSummary};
pub use progress::ProgressReporter;
pub use streamer::BulkImportStreamer;
pub use subjects::SubjectLoader;
pub use telemetry::{init_tracing, TelemetryConfig};
