//! Account subject storage

use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument};

use crate::error::DatabaseError;

/// Classification value of the default subject list
pub const DEFAULT_CLASSIFICATION: &str = "";

/// One row of `journal_subjects`
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SubjectRow {
    pub subject_key: String,
    pub subject_name: String,
    pub default_name: String,
}

/// Repository for `journal_subjects`
#[derive(Debug, Clone)]
pub struct SubjectRepository {
    pool: PgPool,
}

impl SubjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists the subjects of a classification; `None` lists the defaults
    ///
    /// # Errors
    ///
    /// Returns a `DatabaseError` if the query fails
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        tenant: &str,
        app_id: &str,
        classification: Option<&str>,
    ) -> Result<Vec<SubjectRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, SubjectRow>(
            r#"
            SELECT subject_key, subject_name, default_name
            FROM journal_subjects
            WHERE tenant = $1 AND app_id = $2 AND classification = $3
            ORDER BY display_order, subject_key
            "#,
        )
        .bind(tenant)
        .bind(app_id)
        .bind(classification.unwrap_or(DEFAULT_CLASSIFICATION))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(&e))?;

        debug!(count = rows.len(), "Loaded subject list");
        Ok(rows)
    }

    /// Inserts or replaces one subject
    pub async fn upsert(
        &self,
        tenant: &str,
        app_id: &str,
        classification: Option<&str>,
        row: &SubjectRow,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO journal_subjects
                (tenant, app_id, classification, subject_key, subject_name, default_name)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (tenant, app_id, classification, subject_key)
            DO UPDATE SET subject_name = EXCLUDED.subject_name,
                          default_name = EXCLUDED.default_name
            "#,
        )
        .bind(tenant)
        .bind(app_id)
        .bind(classification.unwrap_or(DEFAULT_CLASSIFICATION))
        .bind(&row.subject_key)
        .bind(&row.subject_name)
        .bind(&row.default_name)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(&e))?;

        Ok(())
    }
}
