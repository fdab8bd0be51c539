//! Journal line building
//!
//! [`JournalLineBuilder`] turns one change-set plus its pattern into ledger
//! lines. Templates are evaluated in order; a template whose amount comes
//! out as zero is skipped, so the branch numbers of the kept lines stay
//! dense. Parent aggregation numbers and the overall index run across the
//! whole run, which is why one builder is used per run.

use chrono::NaiveDate;
use core_kernel::{format_date, FieldValue, HandlingMonth, SourceRecord, ZERO_DATE};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::change_set::ChangeSet;
use crate::error::JournalError;
use crate::fields;
use crate::formula::FormulaEvaluator;
use crate::kind::JournalKind;
use crate::pattern::{BookkeepingPattern, LendingDivision};
use crate::sequence::VoucherNumber;
use crate::subject::SubjectMapper;

/// One generated ledger line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalLine {
    /// Copy of the record the line's amount was read from
    pub source: SourceRecord,
    pub voucher: VoucherNumber,
    pub entry_date: NaiveDate,
    pub handling_month: HandlingMonth,
    pub kind: JournalKind,
    pub pattern_id: String,
    /// 1-based position of the template within its pattern
    pub line_number: u32,
    pub lending_division: LendingDivision,
    pub subject_key: String,
    pub account_name: String,
    pub amount: Decimal,
    pub parent_aggregation: u64,
    pub branch_aggregation: u32,
    pub remark: String,
    pub index: u64,
}

impl JournalLine {
    /// Renders the line as a ledger record: the source fields overwritten
    /// with the generated ones
    pub fn to_record(&self) -> SourceRecord {
        self.source
            .clone()
            .with(fields::VOUCHER_NO, FieldValue::text(self.voucher.as_str()))
            .with(fields::ENTRY_DATE, FieldValue::date(format_date(self.entry_date)))
            .with(fields::HANDLING_MONTH, FieldValue::text(self.handling_month.to_string()))
            .with(fields::PATTERN_ID, FieldValue::text(&self.pattern_id))
            .with(fields::LINE_NO, FieldValue::number(self.line_number.to_string()))
            .with(
                fields::LENDING_DIVISION,
                FieldValue::options(self.lending_division.code()),
            )
            .with(fields::SUBJECT_KEY, FieldValue::text(&self.subject_key))
            .with(fields::ACCOUNT_NAME, FieldValue::text(&self.account_name))
            .with(fields::AMOUNT, FieldValue::decimal(self.amount))
            .with(
                fields::PARENT_AGG_NO,
                FieldValue::number(self.parent_aggregation.to_string()),
            )
            .with(
                fields::BRANCH_AGG_NO,
                FieldValue::number(self.branch_aggregation.to_string()),
            )
            .with(fields::JOURNAL_TYPE, FieldValue::options(self.kind.type_tag()))
            .with(fields::REMARK, FieldValue::text(&self.remark))
            .with(fields::INDEX, FieldValue::number(self.index.to_string()))
    }
}

/// How a line's remark is filled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Remark {
    /// The selected pattern's name
    PatternName,
    /// A fixed text for every line of the run
    Fixed(String),
}

/// Values shared by every line of a run
#[derive(Debug, Clone)]
pub struct LineContext {
    pub voucher: VoucherNumber,
    pub entry_date: NaiveDate,
    pub handling_month: HandlingMonth,
    pub kind: JournalKind,
    pub remark: Remark,
}

/// Adjustment applied to evaluated amounts before the zero check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmountAdjustment {
    #[default]
    None,
    /// Journal only the difference from an already confirmed amount
    Subtract(Decimal),
    /// Reverse a confirmed entry: negate amounts and mark the copy unconfirmed
    Reverse,
}

impl AmountAdjustment {
    fn apply(&self, amount: Decimal) -> Decimal {
        match self {
            AmountAdjustment::None => amount,
            AmountAdjustment::Subtract(confirmed) => amount - confirmed,
            AmountAdjustment::Reverse => -amount,
        }
    }
}

/// One change-set and pattern contributing lines to a business event
#[derive(Debug, Clone, Copy)]
pub struct LineSegment<'a> {
    pub change_set: &'a ChangeSet,
    pub pattern: &'a BookkeepingPattern,
    pub adjustment: AmountAdjustment,
}

impl<'a> LineSegment<'a> {
    pub fn new(change_set: &'a ChangeSet, pattern: &'a BookkeepingPattern) -> Self {
        Self {
            change_set,
            pattern,
            adjustment: AmountAdjustment::None,
        }
    }

    pub fn adjusted(mut self, adjustment: AmountAdjustment) -> Self {
        self.adjustment = adjustment;
        self
    }
}

/// Builds ledger lines for the business events of one run
#[derive(Debug)]
pub struct JournalLineBuilder<'a> {
    context: LineContext,
    subjects: &'a SubjectMapper,
    evaluator: FormulaEvaluator,
    events: u64,
    emitted: u64,
}

impl<'a> JournalLineBuilder<'a> {
    pub fn new(context: LineContext, subjects: &'a SubjectMapper) -> Self {
        Self {
            context,
            subjects,
            evaluator: FormulaEvaluator::new(),
            events: 0,
            emitted: 0,
        }
    }

    pub fn context(&self) -> &LineContext {
        &self.context
    }

    /// Number of business events that produced at least one line
    pub fn events(&self) -> u64 {
        self.events
    }

    /// Number of lines produced so far
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Builds the lines of one change-set under one pattern
    pub fn build(
        &mut self,
        change_set: &ChangeSet,
        pattern: &BookkeepingPattern,
    ) -> Result<Vec<JournalLine>, JournalError> {
        self.build_event(&[LineSegment::new(change_set, pattern)])
    }

    /// Builds the lines of one business event from one or more segments
    ///
    /// All lines share one parent aggregation number and a single dense
    /// branch sequence. An event whose every amount is zero emits nothing
    /// and does not consume a parent number.
    ///
    /// # Errors
    ///
    /// Returns `FormulaBinding`/`Formula` for amounts that cannot be
    /// evaluated and `SubjectResolution` for unknown subject keys.
    pub fn build_event(&mut self, segments: &[LineSegment<'_>]) -> Result<Vec<JournalLine>, JournalError> {
        let parent = self.events + 1;
        let mut lines: Vec<JournalLine> = Vec::new();

        for segment in segments {
            let remark = match &self.context.remark {
                Remark::PatternName => segment.pattern.pattern_name.clone(),
                Remark::Fixed(text) => text.clone(),
            };

            for (position, template) in segment.pattern.lines.iter().enumerate() {
                let record = segment.change_set.record_for(template.source_side);
                let evaluated = self
                    .evaluator
                    .evaluate_record(&template.amount_formula, record)?;
                let amount = segment.adjustment.apply(evaluated);
                if amount.is_zero() {
                    continue;
                }

                let classification = record.text(fields::CLASSIFICATION);
                let account_name = self
                    .subjects
                    .resolve(&template.subject_key, classification)?
                    .to_string();

                let source = match segment.adjustment {
                    AmountAdjustment::Reverse => record
                        .clone()
                        .with(fields::CONFIRMED_DATE, FieldValue::date(ZERO_DATE)),
                    _ => record.clone(),
                };

                let branch = u32::try_from(lines.len() + 1).map_err(|_| {
                    JournalError::Configuration("too many lines in one event".to_string())
                })?;
                let line_number = u32::try_from(position + 1).map_err(|_| {
                    JournalError::Configuration("too many templates in one pattern".to_string())
                })?;

                lines.push(JournalLine {
                    source,
                    voucher: self.context.voucher.clone(),
                    entry_date: self.context.entry_date,
                    handling_month: self.context.handling_month,
                    kind: self.context.kind,
                    pattern_id: segment.pattern.pattern_id.clone(),
                    line_number,
                    lending_division: template.lending_division,
                    subject_key: template.subject_key.clone(),
                    account_name,
                    amount,
                    parent_aggregation: parent,
                    branch_aggregation: branch,
                    remark: remark.clone(),
                    index: self.emitted + lines.len() as u64 + 1,
                });
            }
        }

        if !lines.is_empty() {
            self.events = parent;
            self.emitted += lines.len() as u64;
        }
        Ok(lines)
    }
}
