//! Journal kinds and the datastores they read and write

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::fields;

/// Datastore key of the ledger lines every kind writes to
pub const LEDGER_DATASTORE: &str = "shiwake";

/// Datastore key of the asset master, used to discover asset classifications
pub const ASSET_DATASTORE: &str = "assets";

/// The three journal flows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalKind {
    /// Increase/decrease journals from lease history change-sets
    LeaseChange,
    /// Depreciation (repayment) journals
    Depreciation,
    /// Payment journals
    Payment,
}

impl JournalKind {
    pub const ALL: [JournalKind; 3] = [
        JournalKind::LeaseChange,
        JournalKind::Depreciation,
        JournalKind::Payment,
    ];

    /// Type tag written to `shiwaketype` on every line
    pub fn type_tag(&self) -> &'static str {
        match self {
            JournalKind::LeaseChange => "1",
            JournalKind::Depreciation => "2",
            JournalKind::Payment => "3",
        }
    }

    /// Datastore key the kind reads its source records from
    pub fn source_datastore(&self) -> &'static str {
        match self {
            JournalKind::LeaseChange => "zougenrireki",
            JournalKind::Depreciation => "repayment",
            JournalKind::Payment => "paymentInterest",
        }
    }

    /// Pattern group loaded from the pattern catalog
    pub fn pattern_group(&self) -> &'static str {
        match self {
            JournalKind::LeaseChange => "01",
            JournalKind::Depreciation => "02",
            JournalKind::Payment => "04",
        }
    }

    /// Date field that must fall inside the handling month
    pub fn window_field(&self) -> &'static str {
        match self {
            JournalKind::Depreciation => fields::DEPRECIATION_DATE,
            JournalKind::LeaseChange | JournalKind::Payment => fields::RECORDED_DATE,
        }
    }

    /// Short name used for job and log naming
    pub fn name(&self) -> &'static str {
        match self {
            JournalKind::LeaseChange => "lease_change",
            JournalKind::Depreciation => "depreciation",
            JournalKind::Payment => "payment",
        }
    }
}

impl fmt::Display for JournalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tags_are_distinct() {
        let tags: std::collections::HashSet<_> =
            JournalKind::ALL.iter().map(|k| k.type_tag()).collect();
        assert_eq!(tags.len(), 3);
    }

    #[test]
    fn test_depreciation_window_uses_depreciation_date() {
        assert_eq!(JournalKind::Depreciation.window_field(), "syokyakuymd");
        assert_eq!(JournalKind::Payment.window_field(), "keijoudate");
    }
}
