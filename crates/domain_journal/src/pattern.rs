//! Bookkeeping patterns
//!
//! A pattern is an ordered list of line templates. Each template names the
//! side of the entry (debit or credit), the account subject it posts to,
//! the amount formula, and which record of a change-set (before or after)
//! the formula reads. Patterns are data: adding a new business event means
//! adding a pattern to the catalog, not writing code.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::JournalError;
use crate::formula::Formula;

/// Debit/credit side of a ledger line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LendingDivision {
    #[serde(rename = "1")]
    Debit,
    #[serde(rename = "2")]
    Credit,
}

impl LendingDivision {
    /// Code written to the ledger line
    pub fn code(&self) -> &'static str {
        match self {
            LendingDivision::Debit => "1",
            LendingDivision::Credit => "2",
        }
    }
}

impl fmt::Display for LendingDivision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LendingDivision::Debit => f.write_str("debit"),
            LendingDivision::Credit => f.write_str("credit"),
        }
    }
}

/// Which record of a modification a template reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceSide {
    Before,
    #[default]
    After,
}

impl SourceSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceSide::Before => "before",
            SourceSide::After => "after",
        }
    }
}

/// One line rule of a pattern (a "subject")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTemplate {
    pub subject_key: String,
    pub lending_division: LendingDivision,
    #[serde(rename = "amount_field")]
    pub amount_formula: String,
    #[serde(rename = "change_flag", default)]
    pub source_side: SourceSide,
    /// Display label of the amount, informational only
    #[serde(default)]
    pub amount_name: String,
}

impl LineTemplate {
    pub fn new(
        lending_division: LendingDivision,
        subject_key: impl Into<String>,
        amount_formula: impl Into<String>,
    ) -> Self {
        Self {
            subject_key: subject_key.into(),
            lending_division,
            amount_formula: amount_formula.into(),
            source_side: SourceSide::After,
            amount_name: String::new(),
        }
    }

    pub fn debit(subject_key: impl Into<String>, amount_formula: impl Into<String>) -> Self {
        Self::new(LendingDivision::Debit, subject_key, amount_formula)
    }

    pub fn credit(subject_key: impl Into<String>, amount_formula: impl Into<String>) -> Self {
        Self::new(LendingDivision::Credit, subject_key, amount_formula)
    }

    pub fn from_side(mut self, side: SourceSide) -> Self {
        self.source_side = side;
        self
    }
}

/// A named bookkeeping pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookkeepingPattern {
    pub pattern_id: String,
    pub pattern_name: String,
    #[serde(rename = "subjects", default)]
    pub lines: Vec<LineTemplate>,
}

impl BookkeepingPattern {
    pub fn new(pattern_id: impl Into<String>, pattern_name: impl Into<String>) -> Self {
        Self {
            pattern_id: pattern_id.into(),
            pattern_name: pattern_name.into(),
            lines: Vec::new(),
        }
    }

    pub fn with_line(mut self, line: LineTemplate) -> Self {
        self.lines.push(line);
        self
    }

    /// Checks every template has a subject key and a parseable formula
    pub fn validate(&self) -> Result<(), JournalError> {
        for (position, line) in self.lines.iter().enumerate() {
            if line.subject_key.trim().is_empty() {
                return Err(JournalError::InvalidPattern {
                    pattern_id: self.pattern_id.clone(),
                    reason: format!("line {} has no subject key", position + 1),
                });
            }
            Formula::parse(&line.amount_formula).map_err(|e| JournalError::InvalidPattern {
                pattern_id: self.pattern_id.clone(),
                reason: format!("line {} formula {:?}: {e}", position + 1, line.amount_formula),
            })?;
        }
        Ok(())
    }
}

/// Business events a pattern can be selected for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    NewContract,
    InfoChange,
    DebtChange,
    ProportionalReduction,
    ProportionalReductionPercentage,
    MidwayCancel,
    AssetAcquisition,
    AssetTransfer,
    AssetDisposal,
    AssetSaleLoss,
    AssetSaleGain,
}

impl PatternKind {
    /// Catalog id of the pattern for this event
    pub fn pattern_id(&self) -> &'static str {
        match self {
            PatternKind::NewContract => "01001",
            PatternKind::InfoChange => "01002",
            PatternKind::DebtChange => "01003",
            PatternKind::ProportionalReduction => "01004",
            PatternKind::ProportionalReductionPercentage => "01005",
            PatternKind::MidwayCancel => "01006",
            PatternKind::AssetAcquisition => "01010",
            PatternKind::AssetTransfer => "01011",
            PatternKind::AssetDisposal => "01012",
            PatternKind::AssetSaleLoss => "01013",
            PatternKind::AssetSaleGain => "01014",
        }
    }
}

/// The patterns of one pattern group, loaded once per run
#[derive(Debug, Clone, Default)]
pub struct PatternCatalog {
    group: String,
    patterns: Vec<BookkeepingPattern>,
    index: HashMap<String, usize>,
}

impl PatternCatalog {
    /// Builds a catalog, validating every pattern
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` for a malformed template or a duplicate
    /// pattern id.
    pub fn new(group: impl Into<String>, patterns: Vec<BookkeepingPattern>) -> Result<Self, JournalError> {
        let mut index = HashMap::with_capacity(patterns.len());
        for (position, pattern) in patterns.iter().enumerate() {
            pattern.validate()?;
            if index.insert(pattern.pattern_id.clone(), position).is_some() {
                return Err(JournalError::InvalidPattern {
                    pattern_id: pattern.pattern_id.clone(),
                    reason: "duplicate pattern id".to_string(),
                });
            }
        }
        Ok(Self {
            group: group.into(),
            patterns,
            index,
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn get(&self, pattern_id: &str) -> Option<&BookkeepingPattern> {
        self.index.get(pattern_id).map(|&i| &self.patterns[i])
    }

    /// Pattern for a selected business event, if the catalog carries one
    pub fn for_kind(&self, kind: PatternKind) -> Option<&BookkeepingPattern> {
        self.get(kind.pattern_id())
    }

    /// First pattern of the group; single-pattern groups use this
    pub fn first(&self) -> Result<&BookkeepingPattern, JournalError> {
        self.patterns
            .first()
            .ok_or_else(|| JournalError::PatternNotFound(format!("group {}", self.group)))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BookkeepingPattern> {
        self.patterns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lease_pattern() -> BookkeepingPattern {
        BookkeepingPattern::new("01001", "New contract")
            .with_line(LineTemplate::debit("lease_asset", "[leasekingaku]"))
            .with_line(LineTemplate::credit("lease_debt", "[leasekingaku]"))
    }

    #[test]
    fn test_pattern_deserializes_catalog_shape() {
        let json = r#"{
            "pattern_id": "01003",
            "pattern_name": "Debt change",
            "subjects": [
                {"subject_key": "lease_debt", "lending_division": "1",
                 "amount_field": "[leasesaimu]", "change_flag": "before"},
                {"subject_key": "lease_debt", "lending_division": "2",
                 "amount_field": "[leasesaimu]", "change_flag": "after", "amount_name": "Debt"}
            ]
        }"#;
        let pattern: BookkeepingPattern = serde_json::from_str(json).unwrap();

        assert_eq!(pattern.lines.len(), 2);
        assert_eq!(pattern.lines[0].lending_division, LendingDivision::Debit);
        assert_eq!(pattern.lines[0].source_side, SourceSide::Before);
        assert_eq!(pattern.lines[1].amount_name, "Debt");
    }

    #[test]
    fn test_catalog_lookup_by_kind() {
        let catalog = PatternCatalog::new("01", vec![lease_pattern()]).unwrap();

        assert!(catalog.for_kind(PatternKind::NewContract).is_some());
        assert!(catalog.for_kind(PatternKind::MidwayCancel).is_none());
        assert_eq!(catalog.first().unwrap().pattern_id, "01001");
    }

    #[test]
    fn test_catalog_rejects_duplicates() {
        let err = PatternCatalog::new("01", vec![lease_pattern(), lease_pattern()]).unwrap_err();
        assert!(matches!(err, JournalError::InvalidPattern { .. }));
    }

    #[test]
    fn test_catalog_rejects_bad_formula() {
        let bad = BookkeepingPattern::new("01009", "Broken")
            .with_line(LineTemplate::debit("cash", "[a] +"));
        let err = PatternCatalog::new("01", vec![bad]).unwrap_err();
        assert!(err.to_string().contains("01009"));
    }

    #[test]
    fn test_empty_catalog_has_no_first() {
        let catalog = PatternCatalog::new("04", Vec::new()).unwrap();
        assert!(matches!(catalog.first(), Err(JournalError::PatternNotFound(_))));
    }
}
