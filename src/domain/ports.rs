use super::bank::{AccountNumber, Bank, BankCode, VerifiedAccount};
use super::organizer::OrganizerAccount;
use super::provisioning::{OutboxEntry, ProvisioningRequest, ProvisioningResponse};
use super::subaccount::{ActivationNotice, SubaccountRecord};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Keyed storage holding one record per organizer.
///
/// `upsert` replaces the whole record. There is no locking: concurrent writers
/// to the same key race and the last one wins, so callers read-modify-write.
#[async_trait]
pub trait OrganizerStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<OrganizerAccount>>;
    async fn upsert(&self, record: OrganizerAccount) -> Result<()>;
    /// Records whose `user_id` starts with `prefix`, ordered by `user_id`.
    async fn scan(&self, prefix: &str) -> Result<Vec<OrganizerAccount>>;
}

/// Persistence for provisioning submissions.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<OutboxEntry>>;
    async fn put(&self, entry: OutboxEntry) -> Result<()>;
    async fn entries_for(&self, user_id: &str) -> Result<Vec<OutboxEntry>>;
}

/// External bank directory used to confirm account holders.
#[async_trait]
pub trait BankDirectory: Send + Sync {
    async fn resolve_account(
        &self,
        account_number: &AccountNumber,
        bank_code: &BankCode,
    ) -> Result<VerifiedAccount>;
    async fn list_banks(&self) -> Result<Vec<Bank>>;
}

/// Webhook-triggered workflow that creates payout subaccounts out of band.
#[async_trait]
pub trait ProvisioningAutomation: Send + Sync {
    async fn trigger(
        &self,
        request: &ProvisioningRequest,
        idempotency_key: &str,
    ) -> Result<ProvisioningResponse>;
}

/// Payment provider that owns the payout subaccounts.
#[async_trait]
pub trait SubaccountProvider: Send + Sync {
    /// `Ok(None)` when the provider has no subaccount with this id.
    async fn fetch_subaccount(&self, subaccount_id: &str) -> Result<Option<SubaccountRecord>>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_activated(&self, notice: &ActivationNotice) -> Result<()>;
}

pub type OrganizerStoreRef = Arc<dyn OrganizerStore>;
pub type OutboxStoreRef = Arc<dyn OutboxStore>;
pub type BankDirectoryRef = Arc<dyn BankDirectory>;
pub type ProvisioningAutomationRef = Arc<dyn ProvisioningAutomation>;
pub type SubaccountProviderRef = Arc<dyn SubaccountProvider>;
pub type NotifierRef = Arc<dyn Notifier>;
