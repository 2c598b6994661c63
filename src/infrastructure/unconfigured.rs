//! Stand-ins for providers whose credentials are not configured.
//!
//! Every call fails with `ProviderUnavailable`, so operations that do not need
//! the provider (force and bulk activation, admin listings) still work, and
//! operations that do need it fail the same way an outage would.

use crate::domain::bank::{AccountNumber, Bank, BankCode, VerifiedAccount};
use crate::domain::ports::{BankDirectory, ProvisioningAutomation, SubaccountProvider};
use crate::domain::provisioning::{ProvisioningRequest, ProvisioningResponse};
use crate::domain::subaccount::SubaccountRecord;
use crate::error::{PayoutError, Result};
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct Unconfigured {
    provider: &'static str,
    setting: &'static str,
}

impl Unconfigured {
    pub fn new(provider: &'static str, setting: &'static str) -> Self {
        Self { provider, setting }
    }

    fn unavailable(&self) -> PayoutError {
        PayoutError::provider_unavailable(self.provider, format!("{} is not set", self.setting))
    }
}

#[async_trait]
impl BankDirectory for Unconfigured {
    async fn resolve_account(
        &self,
        _account_number: &AccountNumber,
        _bank_code: &BankCode,
    ) -> Result<VerifiedAccount> {
        Err(self.unavailable())
    }

    async fn list_banks(&self) -> Result<Vec<Bank>> {
        Err(self.unavailable())
    }
}

#[async_trait]
impl SubaccountProvider for Unconfigured {
    async fn fetch_subaccount(&self, _subaccount_id: &str) -> Result<Option<SubaccountRecord>> {
        Err(self.unavailable())
    }
}

#[async_trait]
impl ProvisioningAutomation for Unconfigured {
    async fn trigger(
        &self,
        _request: &ProvisioningRequest,
        _idempotency_key: &str,
    ) -> Result<ProvisioningResponse> {
        Err(self.unavailable())
    }
}
