//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for the lease journal flows: the run
//! identity, the standard pattern catalog of each group and the subject
//! lists. Every fixture is deterministic so tests can assert exact amounts
//! and account names.

use chrono::NaiveDate;
use core_kernel::{AppId, HandlingMonth, TenantDb, UserId};
use domain_journal::{
    AppSettings, BookkeepingPattern, ConfirmMethod, LineTemplate, SourceSide, SubjectEntry,
};

use crate::builders::PatternBuilder;

/// Fixture for the identity of a journal run
pub struct RunFixtures;

impl RunFixtures {
    pub fn tenant() -> TenantDb {
        TenantDb::new("tenant_test")
    }

    pub fn app_id() -> AppId {
        AppId::new("app_lease")
    }

    pub fn user_id() -> UserId {
        UserId::new("user_accountant")
    }

    /// The handling month every fixture record falls into
    pub fn handling_month() -> HandlingMonth {
        HandlingMonth::new(2023, 4).unwrap()
    }

    /// Entry date used instead of today so lines are reproducible
    pub fn entry_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 4, 30).unwrap()
    }

    pub fn settings() -> AppSettings {
        AppSettings::new(Self::handling_month())
    }

    pub fn settings_with(confirm_method: ConfirmMethod) -> AppSettings {
        Self::settings().with_confirm_method(confirm_method)
    }

    pub fn owner_keys() -> Vec<String> {
        vec!["group_accounting".to_string()]
    }
}

/// Fixture for the bookkeeping pattern catalog
///
/// Lease change patterns read these history fields:
///
/// | field | meaning |
/// |---|---|
/// | `shutokukagaku` | acquisition value of the leased asset |
/// | `leasesaimu` | outstanding lease debt |
/// | `ruikeigaku` | accumulated depreciation |
/// | `choubokagaku` | book value at disposal |
pub struct PatternFixtures;

impl PatternFixtures {
    /// Group `01`, one pattern per lease or asset event
    pub fn lease_change() -> Vec<BookkeepingPattern> {
        vec![
            PatternBuilder::new("01001", "New contract")
                .debit("lease_asset", "[shutokukagaku]")
                .credit("lease_debt", "[leasesaimu]")
                .build(),
            PatternBuilder::new("01002", "Reclassification")
                .debit("lease_asset", "[shutokukagaku]")
                .credit_from(SourceSide::Before, "lease_asset", "[shutokukagaku]")
                .build(),
            PatternBuilder::new("01003", "Debt change")
                .debit_from(SourceSide::Before, "lease_debt", "[leasesaimu]")
                .credit_from(SourceSide::Before, "lease_asset", "[leasesaimu]")
                .debit("lease_asset", "[leasesaimu]")
                .credit("lease_debt", "[leasesaimu]")
                .build(),
            PatternBuilder::new("01004", "Proportional reduction")
                .debit_from(SourceSide::Before, "lease_debt", "[leasesaimu]")
                .credit_from(SourceSide::Before, "lease_asset", "[shutokukagaku]")
                .credit_from(
                    SourceSide::Before,
                    "reduction_gain",
                    "[leasesaimu]-[shutokukagaku]",
                )
                .build(),
            PatternBuilder::new("01005", "Proportional reduction by percentage")
                .debit_from(SourceSide::Before, "lease_debt", "[leasesaimu]*[percentage]/100")
                .credit_from(
                    SourceSide::Before,
                    "lease_asset",
                    "[shutokukagaku]*[percentage]/100",
                )
                .build(),
            PatternBuilder::new("01006", "Midway cancellation")
                .debit_from(SourceSide::Before, "lease_debt", "[leasesaimu]")
                .debit_from(SourceSide::Before, "accumulated_depreciation", "[ruikeigaku]")
                .debit_from(
                    SourceSide::Before,
                    "cancel_loss",
                    "[shutokukagaku]-[ruikeigaku]-[leasesaimu]",
                )
                .credit_from(SourceSide::Before, "lease_asset", "[shutokukagaku]")
                .build(),
            PatternBuilder::new("01010", "Asset acquisition")
                .debit("fixed_asset", "[shutokukagaku]")
                .credit("cash", "[shutokukagaku]")
                .build(),
            PatternBuilder::new("01011", "Asset transfer")
                .debit("fixed_asset", "[shutokukagaku]")
                .credit("fixed_asset", "[shutokukagaku]")
                .build(),
            PatternBuilder::new("01012", "Asset disposal")
                .debit("disposal_loss", "[choubokagaku]")
                .credit("fixed_asset", "[choubokagaku]")
                .build(),
            PatternBuilder::new("01013", "Asset sale at a loss")
                .debit("cash", "[baikyakukagaku]")
                .debit("sale_loss", "[baikyakuchoubokagaku]-[baikyakukagaku]")
                .credit("fixed_asset", "[baikyakuchoubokagaku]")
                .build(),
            PatternBuilder::new("01014", "Asset sale at a gain")
                .debit("cash", "[baikyakukagaku]")
                .credit("fixed_asset", "[baikyakuchoubokagaku]")
                .credit("sale_gain", "[baikyakukagaku]-[baikyakuchoubokagaku]")
                .build(),
        ]
    }

    /// Group `02`: depreciation of the month
    pub fn depreciation() -> Vec<BookkeepingPattern> {
        vec![PatternBuilder::new("02001", "Depreciation")
            .debit("depreciation_expense", "[syokyaku]")
            .credit("accumulated_depreciation", "[syokyaku]")
            .build()]
    }

    /// Group `04`: lease payment split into principal and interest
    pub fn payment() -> Vec<BookkeepingPattern> {
        vec![PatternBuilder::new("04001", "Lease payment")
            .debit("lease_debt", "[gankin]")
            .debit("interest_expense", "[risoku]")
            .credit("cash", "[shiharaigaku]")
            .build()]
    }

    /// A pattern whose only template references a text field
    pub fn broken_payment() -> Vec<BookkeepingPattern> {
        vec![BookkeepingPattern::new("04001", "Lease payment")
            .with_line(LineTemplate::debit("lease_debt", "[paymentmemo]"))]
    }
}

/// Fixture for subject lists
pub struct SubjectFixtures;

impl SubjectFixtures {
    /// Classification with its own names for assets
    pub const BUILDINGS: &'static str = "B01";
    /// Classification that only falls back to the defaults
    pub const VEHICLES: &'static str = "V01";

    /// The default list, covering every subject of [`PatternFixtures`]
    pub fn defaults() -> Vec<SubjectEntry> {
        vec![
            SubjectEntry::new("lease_asset", "", "リース資産"),
            SubjectEntry::new("lease_debt", "", "リース債務"),
            SubjectEntry::new("accumulated_depreciation", "", "減価償却累計額"),
            SubjectEntry::new("depreciation_expense", "", "減価償却費"),
            SubjectEntry::new("interest_expense", "", "支払利息"),
            SubjectEntry::new("cash", "", "現金預金"),
            SubjectEntry::new("reduction_gain", "", "リース債務減額益"),
            SubjectEntry::new("cancel_loss", "", "解約損"),
            SubjectEntry::new("fixed_asset", "", "固定資産"),
            SubjectEntry::new("disposal_loss", "", "固定資産除却損"),
            SubjectEntry::new("sale_loss", "", "固定資産売却損"),
            SubjectEntry::new("sale_gain", "", "固定資産売却益"),
        ]
    }

    /// Buildings name their lease asset and depreciation accounts
    pub fn buildings() -> Vec<SubjectEntry> {
        vec![
            SubjectEntry::new("lease_asset", "リース資産(建物)", ""),
            SubjectEntry::new("depreciation_expense", "減価償却費(建物)", ""),
        ]
    }

    /// Vehicles carry blank names, so everything falls back
    pub fn vehicles() -> Vec<SubjectEntry> {
        vec![SubjectEntry::new("lease_asset", "", "")]
    }
}
