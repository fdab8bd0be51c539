//! Tests for the kernel error types

use std::time::Duration;

use core_kernel::{parse_date, FieldValue, HandlingMonth, PortError, RecordError, SourceRecord, TemporalError};

mod port_error_tests {
    use super::*;

    #[test]
    fn test_transient_kinds() {
        assert!(PortError::connection("refused").is_transient());
        assert!(PortError::unavailable("ledger").is_transient());
        assert!(PortError::timeout("records.fetch", Duration::from_millis(1500)).is_transient());

        assert!(!PortError::internal("broken").is_transient());
        assert!(!PortError::validation("bad filter").is_transient());
        assert!(!PortError::not_found("Datastore", "shiwake").is_transient());
    }

    #[test]
    fn test_timeout_names_the_operation() {
        let error = PortError::timeout("ledger.import", Duration::from_secs(3600));

        match &error {
            PortError::Timeout { operation, duration_ms } => {
                assert_eq!(operation, "ledger.import");
                assert_eq!(*duration_ms, 3_600_000);
            }
            other => panic!("Expected Timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_keeps_the_field() {
        let error = PortError::validation_field("required", "kanjokamoku");

        assert!(matches!(
            error,
            PortError::Validation { ref field, .. } if field.as_deref() == Some("kanjokamoku")
        ));
        assert_eq!(error.to_string(), "Validation error: required");
    }
}

mod record_error_tests {
    use super::*;

    #[test]
    fn test_non_numeric_value_names_field_and_value() {
        let record = SourceRecord::new().with("leasekingaku", FieldValue::number("abc"));

        let error = record.decimal("leasekingaku").unwrap_err();

        assert_eq!(
            error,
            RecordError::NonNumeric {
                field_id: "leasekingaku".to_string(),
                value: "abc".to_string(),
            }
        );
        assert!(error.to_string().contains("leasekingaku"));
        assert!(error.to_string().contains("\"abc\""));
    }
}

mod temporal_error_tests {
    use super::*;

    #[test]
    fn test_invalid_month_reports_the_input() {
        let error = "2023-13".parse::<HandlingMonth>().unwrap_err();

        assert_eq!(error, TemporalError::InvalidMonth("2023-13".to_string()));
        assert_eq!(error.to_string(), "Invalid handling month: 2023-13");
    }

    #[test]
    fn test_invalid_date_reports_the_input() {
        let error = parse_date("2023/04/31").unwrap_err();

        assert_eq!(error, TemporalError::InvalidDate("2023/04/31".to_string()));
    }
}
