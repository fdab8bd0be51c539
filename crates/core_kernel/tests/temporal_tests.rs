//! Unit tests for the handling month and date helpers

use chrono::NaiveDate;
use core_kernel::temporal::{format_date, is_unset_date, parse_date};
use core_kernel::{HandlingMonth, TemporalError};
use proptest::prelude::*;

mod handling_month {
    use super::*;

    #[test]
    fn test_new_computes_month_bounds() {
        let month = HandlingMonth::new(2024, 2).unwrap();

        assert_eq!(month.first_day(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(month.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let month = HandlingMonth::new(2023, 12).unwrap();

        assert_eq!(month.last_day(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn test_new_rejects_month_thirteen() {
        assert!(matches!(
            HandlingMonth::new(2024, 13),
            Err(TemporalError::InvalidMonth(_))
        ));
    }

    #[test]
    fn test_parse_year_month() {
        let month: HandlingMonth = "2023-04".parse().unwrap();
        assert_eq!(month.year(), 2023);
        assert_eq!(month.month(), 4);
        assert_eq!(month.to_string(), "2023-04");
    }

    #[test]
    fn test_parse_full_date() {
        let month: HandlingMonth = "2023-04-17".parse().unwrap();
        assert_eq!(month.to_string(), "2023-04");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("April".parse::<HandlingMonth>().is_err());
        assert!("2023/04".parse::<HandlingMonth>().is_err());
    }

    #[test]
    fn test_contains() {
        let month = HandlingMonth::new(2023, 4).unwrap();
        assert!(month.contains(NaiveDate::from_ymd_opt(2023, 4, 30).unwrap()));
        assert!(!month.contains(NaiveDate::from_ymd_opt(2023, 5, 1).unwrap()));
    }

    #[test]
    fn test_serde_as_string() {
        let month = HandlingMonth::new(2023, 4).unwrap();
        let json = serde_json::to_string(&month).unwrap();
        assert_eq!(json, "\"2023-04\"");
        let back: HandlingMonth = serde_json::from_str(&json).unwrap();
        assert_eq!(back, month);
    }

    proptest! {
        #[test]
        fn prop_bounds_belong_to_the_month(year in 1900i32..2200, m in 1u32..=12) {
            let month = HandlingMonth::new(year, m).unwrap();
            prop_assert!(month.contains(month.first_day()));
            prop_assert!(month.contains(month.last_day()));
            prop_assert!(!month.contains(month.last_day().succ_opt().unwrap()));
        }
    }
}

mod date_helpers {
    use super::*;

    #[test]
    fn test_zero_date_is_unset() {
        assert!(is_unset_date("0001-01-01"));
        assert!(is_unset_date("0001-01-01T00:00:00Z"));
        assert!(is_unset_date("  "));
        assert!(!is_unset_date("2023-04-01"));
    }

    #[test]
    fn test_parse_and_format_date() {
        let date = parse_date("2023-04-01").unwrap();
        assert_eq!(format_date(date), "2023-04-01");
        assert!(parse_date("01/04/2023").is_err());
    }
}
