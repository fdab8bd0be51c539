//! Voucher number allocation
//!
//! Every line of one run carries the same voucher number. Numbers come from
//! an external counter keyed per tenant and application, which must provide
//! atomic read-modify-write so concurrent runs never share a number.

use core_kernel::{AppId, TenantDb};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::JournalError;
use crate::ports::SequencePort;

/// Width of a voucher number
pub const VOUCHER_DIGITS: usize = 13;

const VOUCHER_MAX: i64 = 9_999_999_999_999;

/// Key of one sequence counter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeKey {
    pub tenant: TenantDb,
    pub key: String,
}

impl ScopeKey {
    /// Voucher counter of an application (`<app>_shiwakeno`)
    pub fn voucher(tenant: TenantDb, app_id: &AppId) -> Self {
        Self {
            tenant,
            key: format!("{app_id}_shiwakeno"),
        }
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tenant, self.key)
    }
}

/// A 13-digit, zero-padded voucher number
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoucherNumber(String);

impl VoucherNumber {
    /// Formats a counter value
    ///
    /// # Errors
    ///
    /// Returns `SequenceOverflow` for values outside `1..=9_999_999_999_999`.
    pub fn from_value(value: i64) -> Result<Self, JournalError> {
        if !(1..=VOUCHER_MAX).contains(&value) {
            return Err(JournalError::SequenceOverflow(value));
        }
        Ok(Self(format!("{value:0width$}", width = VOUCHER_DIGITS)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoucherNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Issues voucher numbers from the sequence service
#[derive(Clone)]
pub struct SequenceAllocator {
    port: Arc<dyn SequencePort>,
}

impl SequenceAllocator {
    pub fn new(port: Arc<dyn SequencePort>) -> Self {
        Self { port }
    }

    /// Advances the counter for a scope and returns the new voucher number
    pub async fn allocate(&self, scope: &ScopeKey) -> Result<VoucherNumber, JournalError> {
        let value = self
            .port
            .get_or_create(scope)
            .await
            .map_err(|e| JournalError::remote("sequence.get_or_create", e))?;
        let voucher = VoucherNumber::from_value(value)?;
        debug!(scope = %scope, voucher = %voucher, "voucher number allocated");
        Ok(voucher)
    }
}

impl fmt::Debug for SequenceAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceAllocator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::MockSequencePort;
    use proptest::prelude::*;

    #[test]
    fn test_voucher_is_zero_padded() {
        assert_eq!(VoucherNumber::from_value(1).unwrap().as_str(), "0000000000001");
        assert_eq!(
            VoucherNumber::from_value(VOUCHER_MAX).unwrap().as_str(),
            "9999999999999"
        );
    }

    #[test]
    fn test_voucher_rejects_out_of_range() {
        assert!(matches!(
            VoucherNumber::from_value(0),
            Err(JournalError::SequenceOverflow(0))
        ));
        assert!(VoucherNumber::from_value(VOUCHER_MAX + 1).is_err());
    }

    #[test]
    fn test_scope_key_format() {
        let scope = ScopeKey::voucher(TenantDb::new("tenant_a"), &AppId::new("app1"));
        assert_eq!(scope.key, "app1_shiwakeno");
    }

    #[tokio::test]
    async fn test_allocate_creates_then_increments() {
        let allocator = SequenceAllocator::new(Arc::new(MockSequencePort::new()));
        let scope = ScopeKey::voucher(TenantDb::new("t"), &AppId::new("a"));

        assert_eq!(allocator.allocate(&scope).await.unwrap().as_str(), "0000000000001");
        assert_eq!(allocator.allocate(&scope).await.unwrap().as_str(), "0000000000002");
    }

    #[tokio::test]
    async fn test_scopes_are_independent() {
        let allocator = SequenceAllocator::new(Arc::new(MockSequencePort::new()));
        let a = ScopeKey::voucher(TenantDb::new("t"), &AppId::new("a"));
        let b = ScopeKey::voucher(TenantDb::new("t"), &AppId::new("b"));

        allocator.allocate(&a).await.unwrap();
        assert_eq!(allocator.allocate(&b).await.unwrap().as_str(), "0000000000001");
    }

    #[tokio::test]
    async fn test_sequence_failure_is_remote_call_error() {
        let allocator = SequenceAllocator::new(Arc::new(MockSequencePort::failing()));
        let scope = ScopeKey::voucher(TenantDb::new("t"), &AppId::new("a"));

        let err = allocator.allocate(&scope).await.unwrap_err();
        assert!(matches!(err, JournalError::RemoteCall { .. }));
    }

    proptest! {
        #[test]
        fn prop_voucher_has_thirteen_digits(value in 1i64..=VOUCHER_MAX) {
            let voucher = VoucherNumber::from_value(value).unwrap();
            prop_assert_eq!(voucher.as_str().len(), VOUCHER_DIGITS);
            prop_assert!(voucher.as_str().chars().all(|c| c.is_ascii_digit()));
            prop_assert_eq!(voucher.as_str().parse::<i64>().unwrap(), value);
        }
    }
}
