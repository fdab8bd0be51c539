//! Tests for the bulk import streamer and its error localization

use std::sync::Arc;
use std::time::Duration;

use core_kernel::{AppId, DatastoreId, FieldValue, JobId, SourceRecord, TenantDb, UserId};
use domain_journal::ports::mock::MockLedgerSink;
use domain_journal::{ImportErrorDetail, ImportMetadata, JournalError};
use journal_pipeline::{BulkImportStreamer, FieldLabels, Localizer};

fn metadata() -> ImportMetadata {
    ImportMetadata {
        key: JobId::new(),
        tenant: TenantDb::new("tenant_test"),
        app_id: AppId::new("app_lease"),
        datastore_id: DatastoreId::new("ds_ledger"),
        writer: UserId::new("user_accountant"),
        owners: vec!["group_accounting".to_string()],
    }
}

fn lines(count: u64) -> Vec<SourceRecord> {
    (1..=count)
        .map(|i| SourceRecord::new().with("index", FieldValue::number(i.to_string())))
        .collect()
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

mod streaming_tests {
    use super::*;

    #[tokio::test]
    async fn test_all_lines_accepted() {
        let sink = MockLedgerSink::new();
        let streamer = BulkImportStreamer::new(Arc::new(sink.clone()), 1, Duration::from_secs(5));

        let result = streamer
            .stream(metadata(), lines(10), &Localizer::negotiate("en", "ja"), &FieldLabels::new())
            .await
            .unwrap();
        settle().await;

        assert!(result.is_success());
        assert_eq!(result.inserted_count, 10);
        assert_eq!(sink.accepted().len(), 10);
        assert_eq!(sink.metadata().len(), 1);
        assert!(sink.completed());
    }

    #[tokio::test]
    async fn test_failure_at_line_37_stops_the_stream() {
        let sink = MockLedgerSink::new()
            .failing_at(37, vec![ImportErrorDetail::at_line(37, "account name is required")]);
        let streamer = BulkImportStreamer::new(Arc::new(sink.clone()), 1, Duration::from_secs(5));

        let result = streamer
            .stream(metadata(), lines(100), &Localizer::negotiate("en", "ja"), &FieldLabels::new())
            .await
            .unwrap();
        settle().await;

        assert!(!result.is_success());
        assert_eq!(result.inserted_count, 36);
        assert_eq!(result.errors, vec!["line 37: account name is required".to_string()]);
        assert_eq!(sink.received(), 37);
        assert_eq!(sink.accepted().len(), 36);
        assert!(sink.completed());
    }

    #[tokio::test]
    async fn test_larger_batches_stop_at_the_failing_batch() {
        let sink = MockLedgerSink::new()
            .failing_at(37, vec![ImportErrorDetail::at_line(37, "account name is required")]);
        let streamer = BulkImportStreamer::new(Arc::new(sink.clone()), 10, Duration::from_secs(5));

        let result = streamer
            .stream(metadata(), lines(100), &Localizer::negotiate("en", "ja"), &FieldLabels::new())
            .await
            .unwrap();

        assert_eq!(result.inserted_count, 36);
        assert_eq!(sink.received(), 40);
    }

    #[tokio::test]
    async fn test_errors_follow_the_negotiated_language() {
        let sink = MockLedgerSink::new().failing_at(
            2,
            vec![
                ImportErrorDetail::at_field(2, "shiwakekingaku", "数値を入力してください"),
                ImportErrorDetail::in_range(1, 2, "重複しています"),
            ],
        );
        let streamer = BulkImportStreamer::new(Arc::new(sink), 1, Duration::from_secs(5));
        let mut labels = FieldLabels::new();
        labels.insert("shiwakekingaku".to_string(), "仕訳金額".to_string());

        let result = streamer
            .stream(metadata(), lines(3), &Localizer::negotiate("ja-JP", "ja"), &labels)
            .await
            .unwrap();

        assert_eq!(
            result.errors,
            vec![
                "2行目 項目[仕訳金額]: 数値を入力してください".to_string(),
                "1行目から2行目: 重複しています".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_stalled_sink_times_out() {
        let sink = MockLedgerSink::new().stalled();
        let streamer = BulkImportStreamer::new(Arc::new(sink), 1, Duration::from_secs(1));

        let err = streamer
            .stream(metadata(), lines(1), &Localizer::negotiate("en", "ja"), &FieldLabels::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            JournalError::RemoteCall { ref operation, .. } if operation == "ledger.import"
        ));
    }
}
