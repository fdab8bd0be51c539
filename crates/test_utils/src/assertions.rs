//! Custom Test Assertions
//!
//! Provides invariant checks over the ledger records a run produced (as
//! captured by the mock ledger sink). They give more meaningful failure
//! messages than comparing whole vectors.

use std::collections::BTreeMap;

use core_kernel::SourceRecord;
use domain_journal::fields;
use domain_journal::LendingDivision;
use rust_decimal::Decimal;

fn counter(record: &SourceRecord, field_id: &str) -> u64 {
    let raw = record.text(field_id);
    raw.parse()
        .unwrap_or_else(|_| panic!("Field {field_id} is not a counter: {raw:?}"))
}

fn amount(record: &SourceRecord) -> Decimal {
    record
        .decimal(fields::AMOUNT)
        .unwrap_or_else(|e| panic!("Line amount is not a number: {e}"))
}

/// Asserts that every line of a run carries the same voucher number
///
/// # Panics
///
/// Panics if two lines carry different vouchers
pub fn assert_single_voucher(lines: &[SourceRecord]) {
    if let Some(first) = lines.first() {
        let expected = first.text(fields::VOUCHER_NO);
        for line in lines {
            assert_eq!(
                line.text(fields::VOUCHER_NO),
                expected,
                "Line {} carries another voucher",
                line.text(fields::INDEX)
            );
        }
    }
}

/// Asserts that no line carries a zero amount
pub fn assert_no_zero_amounts(lines: &[SourceRecord]) {
    for line in lines {
        assert!(
            !amount(line).is_zero(),
            "Line {} (pattern {}, subject {}) has a zero amount",
            line.text(fields::INDEX),
            line.text(fields::PATTERN_ID),
            line.text(fields::SUBJECT_KEY)
        );
    }
}

/// Asserts the aggregation numbering of a run
///
/// Parent numbers start at 1 and grow by one per event; within an event
/// the branch numbers run 1, 2, 3 without gaps; the overall index runs
/// 1..=n.
///
/// # Panics
///
/// Panics at the first line breaking the numbering
pub fn assert_dense_numbering(lines: &[SourceRecord]) {
    let mut expected_parent = 0u64;
    let mut expected_branch = 0u64;

    for (position, line) in lines.iter().enumerate() {
        let index = counter(line, fields::INDEX);
        let parent = counter(line, fields::PARENT_AGG_NO);
        let branch = counter(line, fields::BRANCH_AGG_NO);

        assert_eq!(index, position as u64 + 1, "Index out of sequence at position {position}");
        if parent != expected_parent {
            assert_eq!(parent, expected_parent + 1, "Parent number jumped at line {index}");
            expected_parent = parent;
            expected_branch = 0;
        }
        expected_branch += 1;
        assert_eq!(branch, expected_branch, "Branch number has a gap at line {index}");
    }
}

/// Asserts that each event's debits equal its credits
pub fn assert_balanced(lines: &[SourceRecord]) {
    let mut totals: BTreeMap<u64, (Decimal, Decimal)> = BTreeMap::new();
    for line in lines {
        let entry = totals.entry(counter(line, fields::PARENT_AGG_NO)).or_default();
        let division = line.text(fields::LENDING_DIVISION);
        if division == LendingDivision::Debit.code() {
            entry.0 += amount(line);
        } else if division == LendingDivision::Credit.code() {
            entry.1 += amount(line);
        } else {
            panic!("Unknown lending division {division:?}");
        }
    }

    for (parent, (debit, credit)) in totals {
        assert_eq!(debit, credit, "Event {parent} is unbalanced: debit={debit}, credit={credit}");
    }
}

/// Asserts the raw value of a field on a record
pub fn assert_field(record: &SourceRecord, field_id: &str, expected: &str) {
    assert_eq!(
        record.value(field_id),
        Some(expected),
        "Field {field_id} mismatch on record {record:?}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::RecordBuilder;

    fn line(index: u64, parent: u64, branch: u64, division: LendingDivision, amount: &str) -> SourceRecord {
        RecordBuilder::new()
            .text(fields::VOUCHER_NO, "0000000000001")
            .number(fields::INDEX, index.to_string())
            .number(fields::PARENT_AGG_NO, parent.to_string())
            .number(fields::BRANCH_AGG_NO, branch.to_string())
            .options(fields::LENDING_DIVISION, division.code())
            .number(fields::AMOUNT, amount)
            .build()
    }

    #[test]
    fn test_numbering_and_balance_of_two_events() {
        let lines = vec![
            line(1, 1, 1, LendingDivision::Debit, "10"),
            line(2, 1, 2, LendingDivision::Credit, "10"),
            line(3, 2, 1, LendingDivision::Debit, "5.5"),
            line(4, 2, 2, LendingDivision::Credit, "5.5"),
        ];
        assert_dense_numbering(&lines);
        assert_balanced(&lines);
        assert_single_voucher(&lines);
        assert_no_zero_amounts(&lines);
    }

    #[test]
    #[should_panic(expected = "Branch number has a gap")]
    fn test_branch_gap_is_reported() {
        let lines = vec![
            line(1, 1, 1, LendingDivision::Debit, "10"),
            line(2, 1, 3, LendingDivision::Credit, "10"),
        ];
        assert_dense_numbering(&lines);
    }

    #[test]
    #[should_panic(expected = "unbalanced")]
    fn test_one_sided_event_is_reported() {
        assert_balanced(&[line(1, 1, 1, LendingDivision::Debit, "10")]);
    }

    #[test]
    #[should_panic(expected = "zero amount")]
    fn test_zero_amount_is_reported() {
        assert_no_zero_amounts(&[line(1, 1, 1, LendingDivision::Debit, "0")]);
    }
}
