//! Tests for domain_journal: grouping, selection and line building together

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{FieldValue, HandlingMonth, SourceRecord};
use domain_journal::fields;
use domain_journal::{
    BookkeepingPattern, ChangeSet, ChangeSetGrouper, JournalKind, JournalLine, JournalLineBuilder,
    LineContext, LineTemplate, PatternCatalog, PatternKind, PatternSelector, Remark, SourceSide,
    SubjectEntry, SubjectMap, SubjectMapper, VoucherNumber,
};

fn context() -> LineContext {
    LineContext {
        voucher: VoucherNumber::from_value(7).unwrap(),
        entry_date: NaiveDate::from_ymd_opt(2023, 4, 28).unwrap(),
        handling_month: HandlingMonth::new(2023, 4).unwrap(),
        kind: JournalKind::LeaseChange,
        remark: Remark::PatternName,
    }
}

fn subjects() -> SubjectMapper {
    SubjectMapper::new(SubjectMap::from_default_entries(&[
        SubjectEntry::new("lease_asset", "", "Lease assets"),
        SubjectEntry::new("lease_debt", "", "Lease debt"),
        SubjectEntry::new("loss", "", "Loss on cancellation"),
    ]))
}

fn catalog() -> PatternCatalog {
    PatternCatalog::new(
        "01",
        vec![
            BookkeepingPattern::new("01001", "New contract")
                .with_line(LineTemplate::debit("lease_asset", "[leasekingaku]"))
                .with_line(LineTemplate::credit("lease_debt", "[leasekingaku]")),
            BookkeepingPattern::new("01002", "Info change")
                .with_line(LineTemplate::credit("lease_asset", "[leasekingaku]").from_side(SourceSide::Before))
                .with_line(LineTemplate::debit("lease_asset", "[leasekingaku]").from_side(SourceSide::After)),
            BookkeepingPattern::new("01006", "Midway cancel")
                .with_line(LineTemplate::debit("lease_debt", "[zansai]"))
                .with_line(LineTemplate::debit("loss", "[leasekingaku] - [zansai]"))
                .with_line(LineTemplate::credit("lease_asset", "[leasekingaku]")),
        ],
    )
    .unwrap()
}

fn history(no: &str, side: Option<&str>, action: &str, amount: &str) -> SourceRecord {
    let record = SourceRecord::new()
        .with(fields::HISTORY_NO, FieldValue::text(no))
        .with(fields::ACTION, FieldValue::options(action))
        .with(fields::CLASSIFICATION, FieldValue::lookup("A01"))
        .with(fields::SEGMENT, FieldValue::lookup("S1"))
        .with("leasekingaku", FieldValue::number(amount));
    match side {
        Some(side) => record.with(fields::BEFORE_AFTER, FieldValue::options(side)),
        None => record,
    }
}

fn generate(records: Vec<SourceRecord>) -> Vec<JournalLine> {
    let catalog = catalog();
    let subjects = subjects();
    let selector = PatternSelector::new();
    let mut builder = JournalLineBuilder::new(context(), &subjects);
    let mut lines = Vec::new();
    for change_set in ChangeSetGrouper::group(records).unwrap() {
        let Some(kind) = selector.select(&change_set).unwrap() else {
            continue;
        };
        if let Some(pattern) = catalog.for_kind(kind) {
            lines.extend(builder.build(&change_set, pattern).unwrap());
        }
    }
    lines
}

// ============================================================================
// End-to-end generation over a history stream
// ============================================================================

mod history_stream_tests {
    use super::*;

    #[test]
    fn test_mixed_history_stream() {
        let records = vec![
            history("1", None, "create", "1000"),
            history("2", Some("before"), "infoalter", "500"),
            history("2", Some("after"), "infoalter", "500"),
            history("3", Some("before"), "midcancel", "900")
                .with("zansai", FieldValue::number("900")),
            history("3", Some("after"), "midcancel", "900")
                .with("zansai", FieldValue::number("900")),
        ];

        let lines = generate(records);

        // new contract: 2 lines; unchanged info change: none; cancel: loss is zero
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].pattern_id, "01001");
        assert_eq!(lines[2].pattern_id, "01006");
        assert_eq!(lines[2].parent_aggregation, 2);
        assert_eq!(
            lines.iter().map(|l| l.index).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        assert_eq!(lines[3].line_number, 3);
        assert_eq!(lines[3].branch_aggregation, 2);
    }

    #[test]
    fn test_reclassified_info_change_moves_the_asset() {
        let before = history("5", Some("before"), "infoalter", "800");
        let after = history("5", Some("after"), "infoalter", "800")
            .with(fields::CLASSIFICATION, FieldValue::lookup("B02"));

        let lines = generate(vec![after, before]);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].source.text(fields::CLASSIFICATION), "A01");
        assert_eq!(lines[1].source.text(fields::CLASSIFICATION), "B02");
        assert!(lines.iter().all(|l| l.remark == "Info change"));
    }

    #[test]
    fn test_every_line_shares_the_voucher() {
        let lines = generate(vec![
            history("1", None, "create", "10"),
            history("2", None, "create", "20"),
        ]);

        assert!(lines.iter().all(|l| l.voucher.as_str() == "0000000000007"));
    }

    #[test]
    fn test_missing_pattern_produces_no_lines() {
        // debt change selects a pattern this catalog does not carry
        let lines = generate(vec![
            history("9", Some("before"), "debtchange", "10"),
            history("9", Some("after"), "debtchange", "10"),
        ]);

        assert!(lines.is_empty());
        assert!(catalog().for_kind(PatternKind::DebtChange).is_none());
    }
}

// ============================================================================
// Properties
// ============================================================================

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        3 => Just(Decimal::ZERO),
        7 => (-1_000_000i64..1_000_000i64, 0u32..3u32).prop_map(|(m, s)| Decimal::new(m, s)),
    ]
}

proptest! {
    #[test]
    fn prop_no_zero_lines_and_dense_branches(amounts in prop::collection::vec(amount_strategy(), 1..8)) {
        let mut pattern = BookkeepingPattern::new("01001", "New contract");
        let mut record = SourceRecord::new().with(fields::HISTORY_NO, FieldValue::text("1"));
        for (i, amount) in amounts.iter().enumerate() {
            let field = format!("amount{i}");
            record = record.with(field.clone(), FieldValue::decimal(*amount));
            pattern = pattern.with_line(LineTemplate::debit("lease_asset", format!("[{field}]")));
        }
        let subjects = subjects();
        let mut builder = JournalLineBuilder::new(context(), &subjects);

        let lines = builder.build(&ChangeSet::single(record), &pattern).unwrap();

        let non_zero = amounts.iter().filter(|a| !a.is_zero()).count();
        prop_assert_eq!(lines.len(), non_zero);
        prop_assert!(lines.iter().all(|l| !l.amount.is_zero()));
        for (i, line) in lines.iter().enumerate() {
            prop_assert_eq!(line.branch_aggregation as usize, i + 1);
        }
    }

    #[test]
    fn prop_grouping_preserves_every_record(keys in prop::collection::vec(0u8..20, 0..40)) {
        let mut keys = keys;
        keys.sort_unstable();
        keys.dedup();
        let records: Vec<SourceRecord> = keys
            .iter()
            .map(|k| history(&k.to_string(), None, "create", "1"))
            .collect();

        let sets = ChangeSetGrouper::group(records).unwrap();

        prop_assert_eq!(sets.len(), keys.len());
    }

    #[test]
    fn prop_sum_formula_matches_decimal_sum(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
        let record = SourceRecord::new()
            .with("a", FieldValue::decimal(Decimal::new(a, 2)))
            .with("b", FieldValue::decimal(Decimal::new(b, 2)));
        let mut evaluator = domain_journal::FormulaEvaluator::new();

        let result = evaluator.evaluate_record("[a] + [b]", &record).unwrap();

        prop_assert_eq!(result, Decimal::new(a, 2) + Decimal::new(b, 2));
    }
}

#[test]
fn test_subtraction_formula_scenario() {
    let record = SourceRecord::new()
        .with("leasekingaku", FieldValue::number("1000"))
        .with("zansai", FieldValue::number("999.99"));
    let mut evaluator = domain_journal::FormulaEvaluator::new();

    assert_eq!(
        evaluator.evaluate_record("[leasekingaku] - [zansai]", &record).unwrap(),
        dec!(0.01)
    );
}
