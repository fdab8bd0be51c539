//! Change-set grouping
//!
//! The lease history datastore stores one record per registration and two
//! records (tagged `before` and `after`) per modification, all sharing the
//! history key `no`. Sorted by that key, the records of one business event
//! are adjacent; [`ChangeSetGrouper`] folds them back together.
//!
//! The grouper is fed page by page and always holds back the last group of
//! a page until it sees the next page (or `finish`), so a change-set split
//! across a page boundary is re-merged.

use core_kernel::SourceRecord;

use crate::error::JournalError;
use crate::fields;
use crate::pattern::SourceSide;

/// One accounting-relevant business event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSet {
    /// A single record: a new registration (or a standalone event record)
    Registration { key: String, record: SourceRecord },
    /// A modification with its before and after images
    Modification {
        key: String,
        before: SourceRecord,
        after: SourceRecord,
    },
}

impl ChangeSet {
    /// Wraps a standalone record (payments, depreciation)
    pub fn single(record: SourceRecord) -> Self {
        let key = record.text(fields::HISTORY_NO).to_string();
        ChangeSet::Registration { key, record }
    }

    pub fn key(&self) -> &str {
        match self {
            ChangeSet::Registration { key, .. } | ChangeSet::Modification { key, .. } => key,
        }
    }

    pub fn is_modification(&self) -> bool {
        matches!(self, ChangeSet::Modification { .. })
    }

    /// Record a template reads; a registration serves both sides
    pub fn record_for(&self, side: SourceSide) -> &SourceRecord {
        match (self, side) {
            (ChangeSet::Registration { record, .. }, _) => record,
            (ChangeSet::Modification { before, .. }, SourceSide::Before) => before,
            (ChangeSet::Modification { after, .. }, SourceSide::After) => after,
        }
    }

    /// The record describing the event's resulting state
    pub fn current(&self) -> &SourceRecord {
        self.record_for(SourceSide::After)
    }

    fn from_group(key: String, mut group: Vec<SourceRecord>) -> Result<Self, JournalError> {
        match group.len() {
            1 => {
                let record = group.remove(0);
                Ok(ChangeSet::Registration { key, record })
            }
            2 => {
                let second = group.remove(1);
                let first = group.remove(0);
                let (before, after) = match (side_of(&first), side_of(&second)) {
                    (Some(SourceSide::Before), Some(SourceSide::After)) => (first, second),
                    (Some(SourceSide::After), Some(SourceSide::Before)) => (second, first),
                    _ => {
                        return Err(JournalError::invalid_change_set(
                            key,
                            "a modification needs exactly one before and one after record",
                        ))
                    }
                };
                Ok(ChangeSet::Modification { key, before, after })
            }
            n => Err(JournalError::invalid_change_set(
                key,
                format!("{n} records share the history key"),
            )),
        }
    }
}

fn side_of(record: &SourceRecord) -> Option<SourceSide> {
    match record.text(fields::BEFORE_AFTER).trim() {
        "before" => Some(SourceSide::Before),
        "after" => Some(SourceSide::After),
        _ => None,
    }
}

/// Folds a sorted record stream into change-sets
#[derive(Debug)]
pub struct ChangeSetGrouper {
    key_field: String,
    pending_key: Option<String>,
    pending: Vec<SourceRecord>,
}

impl Default for ChangeSetGrouper {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeSetGrouper {
    /// Groups by the history key `no`
    pub fn new() -> Self {
        Self::with_key_field(fields::HISTORY_NO)
    }

    pub fn with_key_field(key_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
            pending_key: None,
            pending: Vec::new(),
        }
    }

    /// Consumes one page and returns every change-set completed by it
    ///
    /// The trailing group is held back; it may continue on the next page.
    /// A record with a blank history key is always its own change-set.
    pub fn push_page(&mut self, records: Vec<SourceRecord>) -> Result<Vec<ChangeSet>, JournalError> {
        let mut completed = Vec::new();
        for record in records {
            let key = record.text(&self.key_field).trim().to_string();
            let continues = !key.is_empty() && self.pending_key.as_deref() == Some(key.as_str());
            if !continues {
                if let Some(change_set) = self.flush()? {
                    completed.push(change_set);
                }
                self.pending_key = Some(key);
            }
            self.pending.push(record);
        }
        Ok(completed)
    }

    /// Finalizes the held-back group at end of input
    pub fn finish(mut self) -> Result<Option<ChangeSet>, JournalError> {
        self.flush()
    }

    /// Groups a complete, sorted record list
    pub fn group(records: Vec<SourceRecord>) -> Result<Vec<ChangeSet>, JournalError> {
        let mut grouper = Self::new();
        let mut change_sets = grouper.push_page(records)?;
        change_sets.extend(grouper.finish()?);
        Ok(change_sets)
    }

    fn flush(&mut self) -> Result<Option<ChangeSet>, JournalError> {
        let key = self.pending_key.take();
        if self.pending.is_empty() {
            return Ok(None);
        }
        let group = std::mem::take(&mut self.pending);
        ChangeSet::from_group(key.unwrap_or_default(), group).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::FieldValue;

    fn record(no: &str, side: Option<&str>) -> SourceRecord {
        let record = SourceRecord::new().with(fields::HISTORY_NO, FieldValue::text(no));
        match side {
            Some(side) => record.with(fields::BEFORE_AFTER, FieldValue::options(side)),
            None => record,
        }
    }

    #[test]
    fn test_single_record_is_registration() {
        let sets = ChangeSetGrouper::group(vec![record("1", None)]).unwrap();
        assert_eq!(sets.len(), 1);
        assert!(!sets[0].is_modification());
        assert_eq!(sets[0].key(), "1");
    }

    #[test]
    fn test_pair_is_tagged_by_field_not_position() {
        let sets =
            ChangeSetGrouper::group(vec![record("1", Some("after")), record("1", Some("before"))])
                .unwrap();

        match &sets[0] {
            ChangeSet::Modification { before, after, .. } => {
                assert_eq!(before.text(fields::BEFORE_AFTER), "before");
                assert_eq!(after.text(fields::BEFORE_AFTER), "after");
            }
            other => panic!("expected modification, got {other:?}"),
        }
    }

    #[test]
    fn test_pair_without_tags_is_rejected() {
        let err = ChangeSetGrouper::group(vec![record("1", None), record("1", Some("after"))])
            .unwrap_err();
        assert!(matches!(err, JournalError::InvalidChangeSet { .. }));
    }

    #[test]
    fn test_three_records_under_one_key_is_rejected() {
        let err = ChangeSetGrouper::group(vec![
            record("1", Some("before")),
            record("1", Some("after")),
            record("1", Some("after")),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("3 records"));
    }

    #[test]
    fn test_group_split_across_pages_is_merged() {
        let mut grouper = ChangeSetGrouper::new();
        let first = grouper
            .push_page(vec![record("1", None), record("2", Some("before"))])
            .unwrap();
        assert_eq!(first.len(), 1);

        let second = grouper
            .push_page(vec![record("2", Some("after")), record("3", None)])
            .unwrap();
        assert_eq!(second.len(), 1);
        assert!(second[0].is_modification());
        assert_eq!(second[0].key(), "2");

        let last = grouper.finish().unwrap().unwrap();
        assert_eq!(last.key(), "3");
    }

    #[test]
    fn test_blank_keys_never_merge() {
        let sets = ChangeSetGrouper::group(vec![record("", None), record("", None)]).unwrap();
        assert_eq!(sets.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(ChangeSetGrouper::group(Vec::new()).unwrap().is_empty());
    }
}
