//! Field ids exchanged with the record store
//!
//! These are the platform's own field identifiers and are part of the data
//! contract with the lease datastores; they are not renamed here.

// Change-set grouping
pub const HISTORY_NO: &str = "no";
pub const BEFORE_AFTER: &str = "zengokbn";
pub const ACTION: &str = "actkbn";

// Pattern selection
pub const CLASSIFICATION: &str = "bunruicd";
pub const SEGMENT: &str = "segmentcd";
pub const CANCELLATION_DATE: &str = "kaiyakuymd";
pub const CANCELLATION_RIGHT: &str = "cancellationrightoption";
pub const PERCENTAGE: &str = "percentage";
pub const ASSET_EVENT: &str = "setteikubunname";
pub const SALE_PRICE: &str = "baikyakukagaku";
pub const SALE_BOOK_VALUE: &str = "baikyakuchoubokagaku";

// Source windows
pub const RECORDED_DATE: &str = "keijoudate";
pub const DEPRECIATION_DATE: &str = "syokyakuymd";
pub const CONFIRMED_DATE: &str = "kakuteidate";
pub const CREATED_AT: &str = "created_at";
/// Registration date of a repayment row; the newest confirmed row of a month wins
pub const REGISTERED_DATE: &str = "sakuseidate";
pub const DEPRECIATION_AMOUNT: &str = "syokyaku";
pub const ASSET_PARENT_NO: &str = "shisanbangouoya";
pub const ASSET_BRANCH_NO: &str = "shisanbangoueda";

// Asset master
pub const ASSET_CLASS_ID: &str = "assets_class_id";

// Generated ledger line fields
pub const VOUCHER_NO: &str = "shiwakeno";
pub const ENTRY_DATE: &str = "shiwakeymd";
pub const HANDLING_MONTH: &str = "shiwakeym";
pub const PATTERN_ID: &str = "partten";
pub const LINE_NO: &str = "lineno";
pub const LENDING_DIVISION: &str = "taishakukubun";
pub const SUBJECT_KEY: &str = "kanjokamokucd";
pub const ACCOUNT_NAME: &str = "kanjokamoku";
pub const AMOUNT: &str = "shiwakekingaku";
pub const PARENT_AGG_NO: &str = "shiwakeaggno_parent";
pub const BRANCH_AGG_NO: &str = "shiwakeaggno_branch";
pub const JOURNAL_TYPE: &str = "shiwaketype";
pub const REMARK: &str = "remark";
pub const INDEX: &str = "index";
