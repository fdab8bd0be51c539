//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating source data that keeps the
//! invariants the record store guarantees: history records arrive sorted by
//! their key, and a modification is exactly one `before` plus one `after`.

use core_kernel::SourceRecord;
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::builders::RecordBuilder;

/// Strategy for amounts with up to two decimals, zero included
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        1 => Just(Decimal::ZERO),
        9 => (1i64..10_000_000_000i64).prop_map(|minor| Decimal::new(minor, 2)),
    ]
}

/// Shape of one generated history event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryShape {
    Registration,
    /// A modification whose `after` image is stored first
    ModificationAfterFirst,
    Modification,
}

/// Strategy for the shape of one history event
pub fn history_shape_strategy() -> impl Strategy<Value = HistoryShape> {
    prop_oneof![
        Just(HistoryShape::Registration),
        Just(HistoryShape::Modification),
        Just(HistoryShape::ModificationAfterFirst),
    ]
}

/// Strategy for a sorted history stream and the shapes it was built from
///
/// Keys are zero-padded so text order equals numeric order.
pub fn history_stream_strategy(max_events: usize) -> impl Strategy<Value = (Vec<HistoryShape>, Vec<SourceRecord>)> {
    prop::collection::vec(history_shape_strategy(), 0..=max_events).prop_map(|shapes| {
        let mut records = Vec::new();
        for (position, shape) in shapes.iter().enumerate() {
            let key = format!("{:06}", position + 1);
            match shape {
                HistoryShape::Registration => {
                    records.push(RecordBuilder::registration(&key).build());
                }
                HistoryShape::Modification => {
                    records.push(RecordBuilder::before(&key).build());
                    records.push(RecordBuilder::after(&key, "debtchange").build());
                }
                HistoryShape::ModificationAfterFirst => {
                    records.push(RecordBuilder::after(&key, "debtchange").build());
                    records.push(RecordBuilder::before(&key).build());
                }
            }
        }
        (shapes, records)
    })
}
