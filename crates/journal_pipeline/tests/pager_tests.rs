//! Property tests for paged change-set extraction

use std::sync::Arc;
use std::time::Duration;

use core_kernel::{AppId, DatastoreId, RecordQuery, SortKey, TenantDb};
use domain_journal::fields;
use domain_journal::ports::mock::MockRecordSource;
use journal_pipeline::SourcePager;
use proptest::prelude::*;
use test_utils::{history_stream_strategy, HistoryShape};

fn query() -> RecordQuery {
    RecordQuery::new(TenantDb::new("t"), AppId::new("a"), DatastoreId::new("ds_history"))
        .sorted_by(SortKey::ascend(fields::HISTORY_NO))
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

mod change_set_paging_tests {
    use super::*;

    proptest! {
        #[test]
        fn prop_page_size_never_changes_the_change_sets(
            (shapes, records) in history_stream_strategy(20),
            page_size in 1u64..7,
        ) {
            let total = records.len() as u64;
            let source = MockRecordSource::new().with_datastore("zougenrireki", "ds_history", records);
            let pager = SourcePager::new(Arc::new(source.clone()), page_size, Duration::from_secs(1));

            let change_sets = runtime().block_on(pager.change_sets(&query())).unwrap();

            prop_assert_eq!(change_sets.len(), shapes.len());
            for (change_set, shape) in change_sets.iter().zip(&shapes) {
                prop_assert_eq!(
                    change_set.is_modification(),
                    *shape != HistoryShape::Registration
                );
            }
            prop_assert_eq!(source.fetched_pages().len() as u64, total.div_ceil(page_size));
        }
    }
}
