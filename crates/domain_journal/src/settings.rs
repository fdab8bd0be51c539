//! Per-application journal settings

use core_kernel::HandlingMonth;
use serde::{Deserialize, Serialize};

/// How depreciation journals treat a previously confirmed depreciation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfirmMethod {
    /// Journal the current amounts as they are
    #[default]
    #[serde(rename = "plain", alias = "")]
    Plain,
    /// Journal only the difference from the last confirmed depreciation
    #[serde(rename = "sabun")]
    Difference,
    /// Reverse the last confirmed depreciation, then journal the new amounts
    #[serde(rename = "araigae")]
    Reissue,
}

impl ConfirmMethod {
    /// Whether the flow has to look up the last confirmed record
    pub fn needs_prior(&self) -> bool {
        !matches!(self, ConfirmMethod::Plain)
    }
}

/// Settings the application layer holds for one application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    pub handling_month: HandlingMonth,
    #[serde(default)]
    pub confirm_method: ConfirmMethod,
}

impl AppSettings {
    pub fn new(handling_month: HandlingMonth) -> Self {
        Self {
            handling_month,
            confirm_method: ConfirmMethod::Plain,
        }
    }

    pub fn with_confirm_method(mut self, confirm_method: ConfirmMethod) -> Self {
        self.confirm_method = confirm_method;
        self
    }
}
