//! PostgreSQL Catalog Adapter
//!
//! Serves [`SequencePort`], [`PatternCatalogPort`] and
//! [`SubjectCatalogPort`] from one connection pool.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::PostgresCatalogAdapter;
//! use domain_journal::SequencePort;
//! use std::sync::Arc;
//!
//! let adapter = Arc::new(PostgresCatalogAdapter::new(pool));
//! let sequences: Arc<dyn SequencePort> = adapter.clone();
//! ```

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{AppId, DomainPort, PortError, TenantDb};
use domain_journal::{
    BookkeepingPattern, LineTemplate, PatternCatalogPort, ScopeKey, SequencePort,
    SubjectCatalogPort, SubjectEntry,
};

use crate::error::DatabaseError;
use crate::repositories::{
    PatternRepository, PatternRow, SequenceRepository, SubjectRepository, SubjectRow,
};

/// PostgreSQL-backed catalogs
///
/// Database errors are translated to `PortError` through
/// `From<DatabaseError>`; a pattern whose stored templates cannot be decoded
/// is reported as `PortError::Internal` naming the pattern.
#[derive(Debug, Clone)]
pub struct PostgresCatalogAdapter {
    sequences: SequenceRepository,
    patterns: PatternRepository,
    subjects: SubjectRepository,
}

impl PostgresCatalogAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            sequences: SequenceRepository::new(pool.clone()),
            patterns: PatternRepository::new(pool.clone()),
            subjects: SubjectRepository::new(pool),
        }
    }

    pub fn sequences(&self) -> &SequenceRepository {
        &self.sequences
    }

    /// Stores a pattern group, keeping the given order
    pub async fn seed_patterns(
        &self,
        tenant: &TenantDb,
        app_id: &AppId,
        group: &str,
        patterns: &[BookkeepingPattern],
    ) -> Result<(), PortError> {
        for (order, pattern) in patterns.iter().enumerate() {
            let row = pattern_to_row(pattern, order)?;
            self.patterns
                .upsert(tenant.as_str(), app_id.as_str(), group, &row)
                .await?;
        }
        Ok(())
    }

    /// Stores a subject list; `None` seeds the default list
    pub async fn seed_subjects(
        &self,
        tenant: &TenantDb,
        app_id: &AppId,
        classification: Option<&str>,
        entries: &[SubjectEntry],
    ) -> Result<(), PortError> {
        for entry in entries {
            let row = SubjectRow {
                subject_key: entry.subject_key.clone(),
                subject_name: entry.subject_name.clone(),
                default_name: entry.default_name.clone(),
            };
            self.subjects
                .upsert(tenant.as_str(), app_id.as_str(), classification, &row)
                .await?;
        }
        Ok(())
    }
}

impl DomainPort for PostgresCatalogAdapter {}

#[async_trait]
impl SequencePort for PostgresCatalogAdapter {
    #[instrument(skip(self), fields(scope = %scope))]
    async fn get_or_create(&self, scope: &ScopeKey) -> Result<i64, PortError> {
        Ok(self
            .sequences
            .next_value(scope.tenant.as_str(), &scope.key)
            .await?)
    }
}

#[async_trait]
impl PatternCatalogPort for PostgresCatalogAdapter {
    #[instrument(skip(self), fields(tenant = %tenant, app_id = %app_id))]
    async fn get_patterns(
        &self,
        tenant: &TenantDb,
        app_id: &AppId,
        group: &str,
    ) -> Result<Vec<BookkeepingPattern>, PortError> {
        let rows = self
            .patterns
            .list_group(tenant.as_str(), app_id.as_str(), group)
            .await?;

        rows.into_iter().map(row_to_pattern).collect()
    }
}

#[async_trait]
impl SubjectCatalogPort for PostgresCatalogAdapter {
    #[instrument(skip(self), fields(tenant = %tenant, app_id = %app_id))]
    async fn list_subjects(
        &self,
        tenant: &TenantDb,
        app_id: &AppId,
        classification: Option<&str>,
    ) -> Result<Vec<SubjectEntry>, PortError> {
        let rows = self
            .subjects
            .list(tenant.as_str(), app_id.as_str(), classification)
            .await?;

        debug!(count = rows.len(), "Resolved subject list");
        Ok(rows.into_iter().map(row_to_subject).collect())
    }
}

fn row_to_pattern(row: PatternRow) -> Result<BookkeepingPattern, PortError> {
    let Json(subjects) = row.subjects;
    let lines: Vec<LineTemplate> = serde_json::from_value(subjects).map_err(|e| {
        PortError::from(DatabaseError::SerializationError(format!(
            "pattern {}: {}",
            row.pattern_id, e
        )))
    })?;

    Ok(BookkeepingPattern {
        pattern_id: row.pattern_id,
        pattern_name: row.pattern_name,
        lines,
    })
}

fn pattern_to_row(pattern: &BookkeepingPattern, order: usize) -> Result<PatternRow, PortError> {
    let subjects = serde_json::to_value(&pattern.lines)
        .map_err(|e| PortError::from(DatabaseError::SerializationError(e.to_string())))?;
    let display_order = i32::try_from(order)
        .map_err(|_| PortError::validation("too many patterns in one group"))?;

    Ok(PatternRow {
        pattern_id: pattern.pattern_id.clone(),
        pattern_name: pattern.pattern_name.clone(),
        subjects: Json(subjects),
        display_order,
    })
}

fn row_to_subject(row: SubjectRow) -> SubjectEntry {
    SubjectEntry::new(row.subject_key, row.subject_name, row.default_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_journal::{LendingDivision, SourceSide};
    use serde_json::json;

    #[test]
    fn test_row_decodes_stored_templates() {
        let row = PatternRow {
            pattern_id: "01001".to_string(),
            pattern_name: "New contract".to_string(),
            subjects: Json(json!([
                {"subject_key": "lease_asset", "lending_division": "1", "amount_field": "[leaseasset]"},
                {"subject_key": "lease_debt", "lending_division": "2", "amount_field": "[leasedebt]", "change_flag": "before"}
            ])),
            display_order: 0,
        };

        let pattern = row_to_pattern(row).unwrap();
        assert_eq!(pattern.pattern_id, "01001");
        assert_eq!(pattern.lines.len(), 2);
        assert_eq!(pattern.lines[0].lending_division, LendingDivision::Debit);
        assert_eq!(pattern.lines[0].source_side, SourceSide::After);
        assert_eq!(pattern.lines[1].source_side, SourceSide::Before);
    }

    #[test]
    fn test_undecodable_templates_name_the_pattern() {
        let row = PatternRow {
            pattern_id: "01002".to_string(),
            pattern_name: "Info change".to_string(),
            subjects: Json(json!({"not": "a list"})),
            display_order: 1,
        };

        let err = row_to_pattern(row).unwrap_err();
        assert!(matches!(err, PortError::Internal { .. }));
        assert!(err.to_string().contains("01002"));
    }

    #[test]
    fn test_pattern_survives_storage_shape() {
        let pattern = BookkeepingPattern::new("01006", "Midway cancel")
            .with_line(LineTemplate::debit("lease_debt", "[leasedebt]").from_side(SourceSide::Before))
            .with_line(LineTemplate::credit("lease_asset", "[leaseasset]"));

        let row = pattern_to_row(&pattern, 5).unwrap();
        assert_eq!(row.display_order, 5);
        assert_eq!(row_to_pattern(row).unwrap(), pattern);
    }

    #[test]
    fn test_subject_row_maps_all_names() {
        let entry = row_to_subject(SubjectRow {
            subject_key: "lease_asset".to_string(),
            subject_name: "リース資産".to_string(),
            default_name: "Lease asset".to_string(),
        });
        assert_eq!(entry, SubjectEntry::new("lease_asset", "リース資産", "Lease asset"));
    }
}
