//! Test Data Builders
//!
//! Provides builder patterns for constructing source records and
//! bookkeeping patterns. Builders start from the values a real record of
//! the kind carries (unconfirmed, dated inside the fixture month) so tests
//! only spell out the fields they care about.

use core_kernel::{FieldValue, SourceRecord, ZERO_DATE};
use domain_journal::fields;
use domain_journal::{BookkeepingPattern, LendingDivision, LineTemplate, SourceSide};
use rust_decimal::Decimal;

/// Builder for constructing source records
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    record: SourceRecord,
}

impl RecordBuilder {
    /// Creates an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// A lease history registration (a new contract or an asset event)
    pub fn registration(history_no: impl Into<String>) -> Self {
        Self::new()
            .text(fields::HISTORY_NO, history_no)
            .recorded("2023-04-10")
            .unconfirmed()
    }

    /// The `before` image of a lease history modification
    pub fn before(history_no: impl Into<String>) -> Self {
        Self::registration(history_no).options(fields::BEFORE_AFTER, "before")
    }

    /// The `after` image of a lease history modification
    pub fn after(history_no: impl Into<String>, action: &str) -> Self {
        Self::registration(history_no)
            .options(fields::BEFORE_AFTER, "after")
            .options(fields::ACTION, action)
    }

    /// A payment schedule row of one asset
    pub fn payment(parent: &str, branch: &str) -> Self {
        Self::new()
            .asset(parent, branch)
            .recorded("2023-04-25")
            .unconfirmed()
    }

    /// A depreciation row of one asset, dated inside the fixture month
    pub fn depreciation(parent: &str, branch: &str, amount: Decimal) -> Self {
        Self::new()
            .asset(parent, branch)
            .date(fields::DEPRECIATION_DATE, "2023-04-30")
            .amount(fields::DEPRECIATION_AMOUNT, amount)
            .unconfirmed()
    }

    /// An asset master row
    pub fn asset_master(parent: &str, branch: &str, classification: &str) -> Self {
        Self::new()
            .asset(parent, branch)
            .lookup(fields::ASSET_CLASS_ID, classification)
    }

    pub fn text(mut self, field_id: &str, value: impl Into<String>) -> Self {
        self.record = self.record.with(field_id, FieldValue::text(value));
        self
    }

    pub fn number(mut self, field_id: &str, value: impl Into<String>) -> Self {
        self.record = self.record.with(field_id, FieldValue::number(value));
        self
    }

    pub fn amount(mut self, field_id: &str, value: Decimal) -> Self {
        self.record = self.record.with(field_id, FieldValue::decimal(value));
        self
    }

    pub fn date(mut self, field_id: &str, value: impl Into<String>) -> Self {
        self.record = self.record.with(field_id, FieldValue::date(value));
        self
    }

    pub fn options(mut self, field_id: &str, value: impl Into<String>) -> Self {
        self.record = self.record.with(field_id, FieldValue::options(value));
        self
    }

    pub fn lookup(mut self, field_id: &str, value: impl Into<String>) -> Self {
        self.record = self.record.with(field_id, FieldValue::lookup(value));
        self
    }

    /// Sets the account classification used for subject names
    pub fn classification(self, classification: &str) -> Self {
        self.lookup(fields::CLASSIFICATION, classification)
    }

    pub fn asset(self, parent: &str, branch: &str) -> Self {
        self.text(fields::ASSET_PARENT_NO, parent)
            .text(fields::ASSET_BRANCH_NO, branch)
    }

    pub fn recorded(self, date: &str) -> Self {
        self.date(fields::RECORDED_DATE, date)
    }

    pub fn created_at(self, timestamp: &str) -> Self {
        self.text(fields::CREATED_AT, timestamp)
    }

    pub fn registered(self, date: &str) -> Self {
        self.date(fields::REGISTERED_DATE, date)
    }

    /// Marks the record as not yet confirmed
    pub fn unconfirmed(self) -> Self {
        self.date(fields::CONFIRMED_DATE, ZERO_DATE)
    }

    pub fn confirmed(self, date: &str) -> Self {
        self.date(fields::CONFIRMED_DATE, date)
    }

    /// Names the asset event of a registration
    pub fn asset_event(self, event: &str) -> Self {
        self.text(fields::ASSET_EVENT, event)
    }

    pub fn build(self) -> SourceRecord {
        self.record
    }
}

/// Builder for constructing bookkeeping patterns
#[derive(Debug, Clone)]
pub struct PatternBuilder {
    pattern: BookkeepingPattern,
}

impl PatternBuilder {
    pub fn new(pattern_id: impl Into<String>, pattern_name: impl Into<String>) -> Self {
        Self {
            pattern: BookkeepingPattern::new(pattern_id, pattern_name),
        }
    }

    /// Adds a template reading the `after` record
    pub fn debit(self, subject_key: &str, formula: &str) -> Self {
        self.line(LendingDivision::Debit, SourceSide::After, subject_key, formula)
    }

    pub fn credit(self, subject_key: &str, formula: &str) -> Self {
        self.line(LendingDivision::Credit, SourceSide::After, subject_key, formula)
    }

    pub fn debit_from(self, side: SourceSide, subject_key: &str, formula: &str) -> Self {
        self.line(LendingDivision::Debit, side, subject_key, formula)
    }

    pub fn credit_from(self, side: SourceSide, subject_key: &str, formula: &str) -> Self {
        self.line(LendingDivision::Credit, side, subject_key, formula)
    }

    fn line(mut self, division: LendingDivision, side: SourceSide, subject_key: &str, formula: &str) -> Self {
        self.pattern = self
            .pattern
            .with_line(LineTemplate::new(division, subject_key, formula).from_side(side));
        self
    }

    pub fn build(self) -> BookkeepingPattern {
        self.pattern
    }
}
