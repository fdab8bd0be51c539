//! Pipeline configuration
//!
//! Values come from built-in defaults, overridden by `JOURNAL_*` environment
//! variables (a `.env` file is loaded first when present).
//!
//! | variable | default |
//! |---|---|
//! | `JOURNAL_PAGE_SIZE` | 500 |
//! | `JOURNAL_READ_TIMEOUT_SECS` | 600 |
//! | `JOURNAL_WRITE_TIMEOUT_SECS` | 3600 |
//! | `JOURNAL_IMPORT_BATCH_SIZE` | 1 |
//! | `JOURNAL_DEFAULT_LANGUAGE` | ja |
//! | `JOURNAL_LOG_LEVEL` | info |
//! | `JOURNAL_LOG_JSON` | false |

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::telemetry::TelemetryConfig;

const ENV_PREFIX: &str = "JOURNAL";

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PipelineConfig {
    /// Records per fetched page
    pub page_size: u64,
    /// Timeout of every read call (count, fetch, lookups)
    pub read_timeout_secs: u64,
    /// Timeout of a whole bulk import session
    pub write_timeout_secs: u64,
    /// Lines per import batch
    pub import_batch_size: usize,
    /// Language used when the request's language is not available
    pub default_language: String,
    pub log_level: String,
    pub log_json: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            page_size: 500,
            read_timeout_secs: 600,
            write_timeout_secs: 3600,
            import_batch_size: 1,
            default_language: "ja".to_string(),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl PipelineConfig {
    /// Loads configuration from `.env` and the `JOURNAL_` environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    /// Loads configuration from defaults overridden by one source
    pub fn from_source<S>(source: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults = Self::default();
        let loaded: Self = config::Config::builder()
            .set_default("page_size", defaults.page_size)?
            .set_default("read_timeout_secs", defaults.read_timeout_secs)?
            .set_default("write_timeout_secs", defaults.write_timeout_secs)?
            .set_default("import_batch_size", defaults.import_batch_size as u64)?
            .set_default("default_language", defaults.default_language)?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_json", defaults.log_json)?
            .add_source(source)
            .build()?
            .try_deserialize()?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Rejects values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be positive".to_string()));
        }
        if self.import_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "import_batch_size must be positive".to_string(),
            ));
        }
        if self.read_timeout_secs == 0 || self.write_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be positive".to_string()));
        }
        if self.default_language.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "default_language must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig {
            level: self.log_level.clone(),
            json: self.log_json,
        }
    }
}
