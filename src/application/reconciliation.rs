use crate::application::activation::send_notice;
use crate::domain::organizer::{ActivationMethod, OrganizerAccount};
use crate::domain::ports::{NotifierRef, OrganizerStoreRef, SubaccountProviderRef};
use crate::domain::subaccount::SubaccountRecord;
use crate::error::{PayoutError, Result};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// The record was pending and is now active.
    Activated,
    /// The record was already active; only the verification stamp moved.
    Refreshed,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    pub record: OrganizerAccount,
    pub subaccount: SubaccountRecord,
    pub outcome: ReconcileOutcome,
}

/// Confirms locally recorded subaccount ids against the provider.
///
/// Nothing is corrected automatically: a missing or mismatched subaccount leaves
/// the record untouched and is reported to the caller.
pub struct ReconciliationService {
    store: OrganizerStoreRef,
    provider: SubaccountProviderRef,
    notifier: NotifierRef,
}

impl ReconciliationService {
    pub fn new(
        store: OrganizerStoreRef,
        provider: SubaccountProviderRef,
        notifier: NotifierRef,
    ) -> Self {
        Self {
            store,
            provider,
            notifier,
        }
    }

    /// Confirms a record's subaccount, activating it if it was still pending.
    ///
    /// A record activated here gets the same notice as one activated through
    /// the gate.
    pub async fn reconcile(&self, user_id: &str) -> Result<Reconciliation> {
        let record = self
            .store
            .get(user_id)
            .await?
            .ok_or_else(|| PayoutError::NotFound(user_id.to_string()))?;
        let reconciliation = self.confirm(record).await?;
        if reconciliation.outcome == ReconcileOutcome::Activated {
            send_notice(
                &self.notifier,
                &reconciliation.record,
                ActivationMethod::Verified,
            )
            .await;
        }
        Ok(reconciliation)
    }

    /// Provider check shared with the activation gate. Never notifies.

    pub(crate) async fn confirm(&self, mut record: OrganizerAccount) -> Result<Reconciliation> {
        let Some(subaccount_id) = record.subaccount_id().map(str::to_string) else {
            return Err(PayoutError::MissingPrecondition(format!(
                "No subaccount ID for: {}",
                record.display_name()
            )));
        };

        let Some(subaccount) = self.provider.fetch_subaccount(&subaccount_id).await? else {
            warn!(user_id = %record.user_id, subaccount_id = %subaccount_id, "Subaccount not found at provider");
            return Err(PayoutError::NotFoundUpstream {
                user_id: record.user_id.clone(),
                subaccount_id,
            });
        };

        if !subaccount.settles_to(&record) {
            let local_account = record
                .account_number()
                .map(ToString::to_string)
                .unwrap_or_default();
            warn!(user_id = %record.user_id, subaccount_id = %subaccount_id, "Subaccount settles to a different account");
            return Err(PayoutError::HolderMismatch {
                user_id: record.user_id.clone(),
                subaccount_id,
                local_account,
                upstream_account: subaccount.account_number.clone().unwrap_or_default(),
            });
        }

        let now = Utc::now();
        record.record_provider_confirmation(now);
        let outcome = if record.is_setup_complete() {
            ReconcileOutcome::Refreshed
        } else {
            record.activate(ActivationMethod::Verified, now)?;
            ReconcileOutcome::Activated
        };
        self.store.upsert(record.clone()).await?;

        info!(user_id = %record.user_id, ?outcome, "Subaccount confirmed by provider");
        Ok(Reconciliation {
            record,
            subaccount,
            outcome,
        })
    }

    /// Read-only provider lookup of an arbitrary subaccount id.
    pub async fn lookup_subaccount(&self, subaccount_id: &str) -> Result<Option<SubaccountRecord>> {
        self.provider.fetch_subaccount(subaccount_id).await
    }
}
