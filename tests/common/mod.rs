#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use payout_activation::application::activation::{ActivationGate, BulkActivator};
use payout_activation::application::admin::AdminService;
use payout_activation::application::onboarding::{BankSubmission, OnboardingService};
use payout_activation::application::reconciliation::ReconciliationService;
use payout_activation::domain::bank::{AccountNumber, Bank, BankCode, VerifiedAccount};
use payout_activation::domain::organizer::OrganizerAccount;
use payout_activation::domain::ports::{
    BankDirectory, Notifier, OrganizerStoreRef, OutboxStoreRef, ProvisioningAutomation,
    SubaccountProvider,
};
use payout_activation::domain::provisioning::{ProvisioningRequest, ProvisioningResponse};
use payout_activation::domain::subaccount::{ActivationNotice, SubaccountRecord};
use payout_activation::error::{PayoutError, Result};
use payout_activation::infrastructure::in_memory::{InMemoryOrganizerStore, InMemoryOutboxStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const ACCOUNT: &str = "0102027322";
pub const BANK_CODE: &str = "044";
pub const HOLDER: &str = "JOHN DOE";

/// Bank directory answering from a fixed table.
#[derive(Default)]
pub struct FakeDirectory {
    names: Mutex<HashMap<(String, String), String>>,
    rate_limited: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeDirectory {
    pub fn with_account(self, account_number: &str, bank_code: &str, name: &str) -> Self {
        self.add_account(account_number, bank_code, name);
        self
    }

    pub fn add_account(&self, account_number: &str, bank_code: &str, name: &str) {
        self.names.lock().unwrap().insert(
            (account_number.to_string(), bank_code.to_string()),
            name.to_string(),
        );
    }

    pub fn exhaust_quota(&self) {
        self.rate_limited.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BankDirectory for FakeDirectory {
    async fn resolve_account(
        &self,
        account_number: &AccountNumber,
        bank_code: &BankCode,
    ) -> Result<VerifiedAccount> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.rate_limited.load(Ordering::SeqCst) {
            return Err(PayoutError::RateLimited {
                provider: "PAYSTACK".to_string(),
            });
        }
        let key = (account_number.to_string(), bank_code.to_string());
        let name = self.names.lock().unwrap().get(&key).cloned();
        match name {
            Some(account_name) => Ok(VerifiedAccount {
                account_number: account_number.clone(),
                bank_code: bank_code.clone(),
                account_name,
            }),
            None => Err(PayoutError::InvalidAccount(
                "Could not resolve account name".to_string(),
            )),
        }
    }

    async fn list_banks(&self) -> Result<Vec<Bank>> {
        Ok(vec![Bank {
            name: "Access Bank".to_string(),
            code: BANK_CODE.to_string(),
            slug: "access-bank".to_string(),
        }])
    }
}

#[derive(Debug, Clone)]
pub enum AutomationMode {
    Assign(String),
    Accept,
    Fail,
}

/// Onboarding automation that records every trigger.
pub struct FakeAutomation {
    mode: Mutex<AutomationMode>,
    pub idempotency_keys: Mutex<Vec<String>>,
}

impl FakeAutomation {
    pub fn new(mode: AutomationMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            idempotency_keys: Mutex::new(Vec::new()),
        }
    }

    pub fn set_mode(&self, mode: AutomationMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> usize {
        self.idempotency_keys.lock().unwrap().len()
    }
}

#[async_trait]
impl ProvisioningAutomation for FakeAutomation {
    async fn trigger(
        &self,
        _request: &ProvisioningRequest,
        idempotency_key: &str,
    ) -> Result<ProvisioningResponse> {
        self.idempotency_keys
            .lock()
            .unwrap()
            .push(idempotency_key.to_string());
        let mode = self.mode.lock().unwrap().clone();
        match mode {
            AutomationMode::Assign(id) => Ok(ProvisioningResponse::Assigned(id)),
            AutomationMode::Accept => Ok(ProvisioningResponse::Accepted),
            AutomationMode::Fail => Err(PayoutError::provider_unavailable(
                "AUTOMATION",
                "webhook error: 500 - boom",
            )),
        }
    }
}

/// Subaccount provider backed by a table, optionally unreachable.
#[derive(Default)]
pub struct FakeProvider {
    subaccounts: Mutex<HashMap<String, SubaccountRecord>>,
    unreachable: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeProvider {
    pub fn with_subaccount(self, subaccount_id: &str, account_number: &str) -> Self {
        self.insert(subaccount_id, account_number);
        self
    }

    pub fn insert(&self, subaccount_id: &str, account_number: &str) {
        self.subaccounts.lock().unwrap().insert(
            subaccount_id.to_string(),
            SubaccountRecord {
                subaccount_id: subaccount_id.to_string(),
                business_name: Some("John Events".to_string()),
                settlement_bank: Some("Access Bank".to_string()),
                account_number: Some(account_number.to_string()),
            },
        );
    }

    pub fn go_down(&self) {
        self.unreachable.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubaccountProvider for FakeProvider {
    async fn fetch_subaccount(&self, subaccount_id: &str) -> Result<Option<SubaccountRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(PayoutError::provider_unavailable(
                "PAYSTACK",
                "connection refused",
            ));
        }
        Ok(self.subaccounts.lock().unwrap().get(subaccount_id).cloned())
    }
}

/// Notifier that keeps every notice, optionally failing after recording it.
#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: Mutex<Vec<ActivationNotice>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.failing.store(true, Ordering::SeqCst);
        notifier
    }

    pub fn count(&self) -> usize {
        self.notices.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_activated(&self, notice: &ActivationNotice) -> Result<()> {
        self.notices.lock().unwrap().push(notice.clone());
        if self.failing.load(Ordering::SeqCst) {
            return Err(PayoutError::provider_unavailable("RESEND", "mailbox full"));
        }
        Ok(())
    }
}

/// Every service wired over in-memory stores and the fakes above.
pub struct Harness {
    pub store: OrganizerStoreRef,
    pub outbox: OutboxStoreRef,
    pub directory: Arc<FakeDirectory>,
    pub automation: Arc<FakeAutomation>,
    pub provider: Arc<FakeProvider>,
    pub notifier: Arc<RecordingNotifier>,
    pub onboarding: OnboardingService,
    pub reconciler: Arc<ReconciliationService>,
    pub gate: Arc<ActivationGate>,
    pub bulk: BulkActivator,
    pub admin: AdminService,
}

impl Harness {
    pub fn new(
        directory: FakeDirectory,
        automation: FakeAutomation,
        provider: FakeProvider,
        notifier: RecordingNotifier,
    ) -> Self {
        let store: OrganizerStoreRef = Arc::new(InMemoryOrganizerStore::new());
        let outbox: OutboxStoreRef = Arc::new(InMemoryOutboxStore::new());
        let directory = Arc::new(directory);
        let automation = Arc::new(automation);
        let provider = Arc::new(provider);
        let notifier = Arc::new(notifier);

        let reconciler = Arc::new(ReconciliationService::new(
            store.clone(),
            provider.clone(),
            notifier.clone(),
        ));
        let gate = Arc::new(ActivationGate::new(
            store.clone(),
            reconciler.clone(),
            notifier.clone(),
        ));

        Self {
            onboarding: OnboardingService::new(
                store.clone(),
                outbox.clone(),
                directory.clone(),
                automation.clone(),
            ),
            bulk: BulkActivator::new(gate.clone()),
            admin: AdminService::new(store.clone(), provider.clone()),
            reconciler,
            gate,
            store,
            outbox,
            directory,
            automation,
            provider,
            notifier,
        }
    }

    /// John Doe's account resolves, the automation assigns `SUB_123`, and the
    /// provider knows `SUB_123` settling to the same account.
    pub fn happy_path() -> Self {
        Self::new(
            FakeDirectory::default().with_account(ACCOUNT, BANK_CODE, HOLDER),
            FakeAutomation::new(AutomationMode::Assign("SUB_123".to_string())),
            FakeProvider::default().with_subaccount("SUB_123", ACCOUNT),
            RecordingNotifier::default(),
        )
    }

    pub async fn record(&self, user_id: &str) -> Option<OrganizerAccount> {
        self.store.get(user_id).await.unwrap()
    }

    /// Stores a pending record without going through onboarding.
    pub async fn seed_pending(&self, user_id: &str, name: &str, subaccount_id: Option<&str>) {
        let backup = serde_json::json!({
            "exported_at": Utc::now(),
            "organizers": [pending_json(user_id, name, subaccount_id)],
        });
        let report = self
            .admin
            .restore_backup(serde_json::from_value(backup).unwrap())
            .await
            .unwrap();
        assert_eq!(report.restored, 1);
    }
}

pub fn submission(user_id: &str) -> BankSubmission {
    BankSubmission {
        user_id: user_id.to_string(),
        email: Some("john@example.com".to_string()),
        name: Some("John Events".to_string()),
        bank_name: "Access Bank".to_string(),
        bank_code: BANK_CODE.to_string(),
        account_number: ACCOUNT.to_string(),
    }
}

/// A record with verified bank details and, optionally, a subaccount id.
pub fn pending_json(user_id: &str, name: &str, subaccount_id: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "user_id": user_id,
        "email": format!("{}@example.com", user_id),
        "name": name,
        "bank_name": "Access Bank",
        "bank_code": BANK_CODE,
        "account_number": ACCOUNT,
        "account_name": HOLDER,
        "subaccount_id": subaccount_id,
        "created_at": "2024-01-01T00:00:00Z",
    })
}
