//! Pattern selection
//!
//! [`PatternSelector`] maps a change-set to the business event it records.
//! It is a pure function of the change-set: the same input always selects
//! the same pattern. `Ok(None)` means the event produces no journal lines,
//! which covers both "nothing accounting-relevant changed" and action codes
//! no pattern models.

use core_kernel::{is_unset_date, parse_decimal, SourceRecord};
use tracing::debug;

use crate::change_set::ChangeSet;
use crate::error::JournalError;
use crate::fields;
use crate::pattern::PatternKind;

/// Action recorded on a lease history modification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaseAction {
    InfoChange,
    DebtChange,
    MidwayCancel,
    Other(String),
}

impl LeaseAction {
    pub fn parse(code: &str) -> Self {
        match code.trim() {
            "infoalter" | "info-change" => LeaseAction::InfoChange,
            "debtchange" | "debt-change" => LeaseAction::DebtChange,
            "midcancel" | "midway-cancel" => LeaseAction::MidwayCancel,
            other => LeaseAction::Other(other.to_string()),
        }
    }
}

/// Asset event named on a single asset record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetEvent {
    Acquisition,
    Transfer,
    Disposal,
    Sale,
}

impl AssetEvent {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "固定資産取得" | "acquisition" => Some(AssetEvent::Acquisition),
            "固定資産移動" | "transfer" => Some(AssetEvent::Transfer),
            "固定資産除却" | "disposal" => Some(AssetEvent::Disposal),
            "固定資産売却" | "sale" => Some(AssetEvent::Sale),
            _ => None,
        }
    }
}

/// Chooses the pattern for a change-set
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternSelector;

impl PatternSelector {
    pub fn new() -> Self {
        Self
    }

    /// Selects the business event a change-set records
    ///
    /// # Errors
    ///
    /// Returns `FormulaBinding` when an asset sale carries a non-numeric
    /// price or book value; every other input selects without error.
    pub fn select(&self, change_set: &ChangeSet) -> Result<Option<PatternKind>, JournalError> {
        match change_set {
            ChangeSet::Registration { record, .. } => Self::select_registration(record).map(Some),
            ChangeSet::Modification { key, before, after } => {
                let selected = Self::select_modification(before, after);
                if selected.is_none() {
                    debug!(
                        history_no = %key,
                        action = after.text(fields::ACTION),
                        "change-set selects no pattern"
                    );
                }
                Ok(selected)
            }
        }
    }

    fn select_registration(record: &SourceRecord) -> Result<PatternKind, JournalError> {
        let kind = match AssetEvent::parse(record.text(fields::ASSET_EVENT)) {
            None => PatternKind::NewContract,
            Some(AssetEvent::Acquisition) => PatternKind::AssetAcquisition,
            Some(AssetEvent::Transfer) => PatternKind::AssetTransfer,
            Some(AssetEvent::Disposal) => PatternKind::AssetDisposal,
            Some(AssetEvent::Sale) => {
                let price = record.decimal(fields::SALE_PRICE)?;
                let book_value = record.decimal(fields::SALE_BOOK_VALUE)?;
                if price < book_value {
                    PatternKind::AssetSaleLoss
                } else {
                    PatternKind::AssetSaleGain
                }
            }
        };
        Ok(kind)
    }

    fn select_modification(before: &SourceRecord, after: &SourceRecord) -> Option<PatternKind> {
        match LeaseAction::parse(after.text(fields::ACTION)) {
            LeaseAction::InfoChange => {
                let reclassified = differs(before, after, fields::CLASSIFICATION)
                    || differs(before, after, fields::SEGMENT);
                reclassified.then_some(PatternKind::InfoChange)
            }
            LeaseAction::DebtChange => {
                if !is_unset_date(after.text(fields::CANCELLATION_DATE)) {
                    if is_enabled(after.text(fields::CANCELLATION_RIGHT)) {
                        Some(PatternKind::ProportionalReduction)
                    } else {
                        Some(PatternKind::DebtChange)
                    }
                } else if percentage_changed(before, after) {
                    Some(PatternKind::ProportionalReductionPercentage)
                } else {
                    Some(PatternKind::DebtChange)
                }
            }
            LeaseAction::MidwayCancel => Some(PatternKind::MidwayCancel),
            LeaseAction::Other(_) => None,
        }
    }
}

fn differs(before: &SourceRecord, after: &SourceRecord, field_id: &str) -> bool {
    before.text(field_id).trim() != after.text(field_id).trim()
}

fn is_enabled(flag: &str) -> bool {
    matches!(
        flag.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "on" | "yes"
    )
}

/// Numeric comparison when both sides parse, textual otherwise
fn percentage_changed(before: &SourceRecord, after: &SourceRecord) -> bool {
    let old = before.text(fields::PERCENTAGE);
    let new = after.text(fields::PERCENTAGE);
    match (parse_decimal(old), parse_decimal(new)) {
        (Some(old), Some(new)) => old != new,
        _ => old.trim() != new.trim(),
    }
}
