//! Bookkeeping pattern storage

use serde_json::Value as JsonValue;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument};

use crate::error::DatabaseError;

/// One row of `journal_patterns`
#[derive(Debug, Clone, FromRow)]
pub struct PatternRow {
    pub pattern_id: String,
    pub pattern_name: String,
    /// Ordered line templates, decoded by the adapter
    pub subjects: Json<JsonValue>,
    pub display_order: i32,
}

/// Repository for `journal_patterns`
#[derive(Debug, Clone)]
pub struct PatternRepository {
    pool: PgPool,
}

impl PatternRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists the patterns of one group in display order
    ///
    /// # Errors
    ///
    /// Returns a `DatabaseError` if the query fails
    #[instrument(skip(self))]
    pub async fn list_group(
        &self,
        tenant: &str,
        app_id: &str,
        group: &str,
    ) -> Result<Vec<PatternRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, PatternRow>(
            r#"
            SELECT pattern_id, pattern_name, subjects, display_order
            FROM journal_patterns
            WHERE tenant = $1 AND app_id = $2 AND pattern_group = $3
            ORDER BY display_order, pattern_id
            "#,
        )
        .bind(tenant)
        .bind(app_id)
        .bind(group)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(&e))?;

        debug!(count = rows.len(), "Loaded pattern group");
        Ok(rows)
    }

    /// Inserts or replaces one pattern
    pub async fn upsert(
        &self,
        tenant: &str,
        app_id: &str,
        group: &str,
        row: &PatternRow,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO journal_patterns
                (tenant, app_id, pattern_group, pattern_id, pattern_name, subjects, display_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (tenant, app_id, pattern_group, pattern_id)
            DO UPDATE SET pattern_name = EXCLUDED.pattern_name,
                          subjects = EXCLUDED.subjects,
                          display_order = EXCLUDED.display_order
            "#,
        )
        .bind(tenant)
        .bind(app_id)
        .bind(group)
        .bind(&row.pattern_id)
        .bind(&row.pattern_name)
        .bind(&row.subjects)
        .bind(row.display_order)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(&e))?;

        Ok(())
    }
}
