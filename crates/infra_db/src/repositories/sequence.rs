//! Voucher sequence counters

use sqlx::PgPool;
use tracing::{debug, instrument};

use crate::error::DatabaseError;

const NEXT_VALUE_SQL: &str = r#"
    INSERT INTO journal_sequences (tenant, sequence_key, value)
    VALUES ($1, $2, 1)
    ON CONFLICT (tenant, sequence_key)
    DO UPDATE SET value = journal_sequences.value + 1, updated_at = now()
    RETURNING value
"#;

/// Repository for `journal_sequences`
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    pool: PgPool,
}

impl SequenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the counter at 1 or increments it, returning the new value
    ///
    /// The upsert runs as a single statement, so concurrent callers each
    /// observe a distinct value.
    ///
    /// # Errors
    ///
    /// Returns a `DatabaseError` if the statement fails
    #[instrument(skip(self))]
    pub async fn next_value(&self, tenant: &str, key: &str) -> Result<i64, DatabaseError> {
        let value: i64 = sqlx::query_scalar(NEXT_VALUE_SQL)
            .bind(tenant)
            .bind(key)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::from(&e))?;

        debug!(value, "Sequence advanced");
        Ok(value)
    }

    /// Reads the current value without advancing it
    pub async fn current_value(&self, tenant: &str, key: &str) -> Result<Option<i64>, DatabaseError> {
        sqlx::query_scalar(
            "SELECT value FROM journal_sequences WHERE tenant = $1 AND sequence_key = $2",
        )
        .bind(tenant)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(&e))
    }
}
