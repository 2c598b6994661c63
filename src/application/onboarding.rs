use crate::domain::bank::{AccountNumber, Bank, BankCode, BankDetails, VerifiedAccount};
use crate::domain::organizer::OrganizerAccount;
use crate::domain::ports::{
    BankDirectoryRef, OrganizerStoreRef, OutboxStoreRef, ProvisioningAutomationRef,
};
use crate::domain::provisioning::{
    OutboxEntry, OutboxStatus, ProvisioningOutcome, ProvisioningRequest, ProvisioningResponse,
};
use crate::error::{PayoutError, Result};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

/// Bank details as entered by an organizer.
#[derive(Debug, Clone)]
pub struct BankSubmission {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub bank_name: String,
    pub bank_code: String,
    pub account_number: String,
}

impl BankSubmission {
    fn details(&self) -> Result<BankDetails> {
        if self.user_id.trim().is_empty() {
            return Err(PayoutError::Validation("User ID is required".to_string()));
        }
        Ok(BankDetails {
            bank_name: self.bank_name.trim().to_string(),
            bank_code: BankCode::new(&self.bank_code)?,
            account_number: AccountNumber::new(&self.account_number)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub record: OrganizerAccount,
    pub provisioning: ProvisioningOutcome,
}

/// Organizer-facing half of the workflow: verify bank details, persist them and
/// ask the automation for a payout subaccount.
pub struct OnboardingService {
    store: OrganizerStoreRef,
    outbox: OutboxStoreRef,
    directory: BankDirectoryRef,
    automation: ProvisioningAutomationRef,
}

impl OnboardingService {
    pub fn new(
        store: OrganizerStoreRef,
        outbox: OutboxStoreRef,
        directory: BankDirectoryRef,
        automation: ProvisioningAutomationRef,
    ) -> Self {
        Self {
            store,
            outbox,
            directory,
            automation,
        }
    }

    /// Confirms an account with the bank directory.
    ///
    /// Malformed input is rejected before any network call. Errors never yield a name.
    pub async fn verify_account(
        &self,
        account_number: &str,
        bank_code: &str,
    ) -> Result<VerifiedAccount> {
        let account_number = AccountNumber::new(account_number)?;
        let bank_code = BankCode::new(bank_code)?;
        self.directory
            .resolve_account(&account_number, &bank_code)
            .await
    }

    pub async fn list_banks(&self) -> Result<Vec<Bank>> {
        self.directory.list_banks().await
    }

    /// Verifies and saves bank details, then triggers subaccount provisioning.
    ///
    /// Verification fails closed: nothing is written if the directory does not
    /// confirm the account. Provisioning fails open: the details stay saved and
    /// the failure is reported in the receipt.
    pub async fn submit_bank_details(&self, submission: BankSubmission) -> Result<SubmissionReceipt> {
        let details = submission.details()?;
        let verified = self
            .directory
            .resolve_account(&details.account_number, &details.bank_code)
            .await?;

        let mut record = self
            .store
            .get(&submission.user_id)
            .await?
            .unwrap_or_else(|| OrganizerAccount::new(submission.user_id.clone(), Utc::now()));
        if submission.email.is_some() {
            record.email = submission.email.clone();
        }
        if submission.name.is_some() {
            record.name = submission.name.clone();
        }

        let change = record.apply_bank_details(&details, &verified)?;
        info!(user_id = %record.user_id, ?change, "Bank details verified");
        self.store.upsert(record.clone()).await?;

        let request = ProvisioningRequest::from_record(&record)?;
        let provisioning = self.provision(&mut record, request, false).await?;
        Ok(SubmissionReceipt {
            record,
            provisioning,
        })
    }

    /// Re-sends the provisioning request for the record's current bank details.
    ///
    /// Only a submission whose previous attempt failed is sent again, unless
    /// `force` is set: then a submission the automation acknowledged without
    /// an id is re-fired too, under the same idempotency key.
    pub async fn retry_provisioning(&self, user_id: &str, force: bool) -> Result<SubmissionReceipt> {
        let mut record = self.load(user_id).await?;
        if record.is_setup_complete() {
            return Err(PayoutError::AlreadyActive(record.display_name().to_string()));
        }

        let request = ProvisioningRequest::from_record(&record)?;
        let provisioning = self.provision(&mut record, request, force).await?;
        Ok(SubmissionReceipt {
            record,
            provisioning,
        })
    }

    /// Records a subaccount id the automation produced out of band.
    pub async fn attach_subaccount(
        &self,
        user_id: &str,
        subaccount_id: &str,
    ) -> Result<OrganizerAccount> {
        let mut record = self.load(user_id).await?;
        record.assign_subaccount(subaccount_id)?;
        self.store.upsert(record.clone()).await?;
        info!(user_id = %user_id, subaccount_id = %subaccount_id, "Subaccount attached");
        Ok(record)
    }

    pub async fn provisioning_history(&self, user_id: &str) -> Result<Vec<OutboxEntry>> {
        self.outbox.entries_for(user_id).await
    }

    async fn provision(
        &self,
        record: &mut OrganizerAccount,
        request: ProvisioningRequest,
        resend_delivered: bool,
    ) -> Result<ProvisioningOutcome> {
        if let Some(subaccount_id) = record.subaccount_id() {
            return Ok(ProvisioningOutcome::Assigned {
                subaccount_id: subaccount_id.to_string(),
            });
        }

        let now = Utc::now();
        let mut entry = match self.outbox.get(&request.outbox_key()).await? {
            Some(entry) => entry,
            None => OutboxEntry::new(request, now),
        };

        if entry.is_delivered() && !resend_delivered {
            info!(
                user_id = %record.user_id,
                attempts = entry.attempts,
                "Submission already delivered to the automation; not sending again"
            );
        } else {
            let idempotency_key = entry.request.submission_hash();
            let status = match self
                .automation
                .trigger(&entry.request, &idempotency_key)
                .await
            {
                Ok(ProvisioningResponse::Assigned(subaccount_id)) => {
                    OutboxStatus::Assigned { subaccount_id }
                }
                Ok(ProvisioningResponse::Accepted) => OutboxStatus::Accepted,
                Err(e) => {
                    warn!(user_id = %record.user_id, "Provisioning trigger failed: {}", e);
                    OutboxStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            entry.record_attempt(status, now);
            self.outbox.put(entry.clone()).await?;
        }

        if let OutboxStatus::Assigned { subaccount_id } = &entry.status {
            record.assign_subaccount(subaccount_id)?;
            self.store.upsert(record.clone()).await?;
        }

        Ok(entry.outcome())
    }

    async fn load(&self, user_id: &str) -> Result<OrganizerAccount> {
        self.store
            .get(user_id)
            .await?
            .ok_or_else(|| PayoutError::NotFound(user_id.to_string()))
    }
}
