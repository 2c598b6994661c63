use crate::application::reconciliation::ReconciliationService;
use crate::domain::organizer::{ActivationMethod, OrganizerAccount};
use crate::domain::ports::{NotifierRef, OrganizerStoreRef};
use crate::domain::subaccount::ActivationNotice;
use crate::error::{PayoutError, Result};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Admin entry points that move a record into the active state.
///
/// Both entry points share the same preconditions: the record exists, has a
/// subaccount id and is not active yet. Activation is persisted before the
/// organizer is notified, and a failed notification never undoes it.
pub struct ActivationGate {
    store: OrganizerStoreRef,
    reconciler: Arc<ReconciliationService>,
    notifier: NotifierRef,
}

impl ActivationGate {
    pub fn new(
        store: OrganizerStoreRef,
        reconciler: Arc<ReconciliationService>,
        notifier: NotifierRef,
    ) -> Self {
        Self {
            store,
            reconciler,
            notifier,
        }
    }

    /// Activates a record once the provider confirms its subaccount.
    ///
    /// On an already active record the confirmation still refreshes
    /// `last_verified`, and the call is then rejected with `AlreadyActive`.
    pub async fn activate_verified(&self, user_id: &str) -> Result<OrganizerAccount> {
        let record = self.load(user_id).await?;

        match record.ensure_activatable() {
            Ok(()) => {}
            Err(PayoutError::AlreadyActive(reason)) => {
                if let Err(e) = self.reconciler.confirm(record).await {
                    warn!(user_id = %user_id, "Could not refresh verification: {}", e);
                }
                return Err(PayoutError::AlreadyActive(reason));
            }
            Err(e) => return Err(e),
        }

        let reconciliation = self.reconciler.confirm(record).await?;
        info!(user_id = %user_id, "Organizer activated after provider confirmation");
        self.notify(&reconciliation.record, ActivationMethod::Verified)
            .await;
        Ok(reconciliation.record)
    }

    /// Activates a record on the strength of its local subaccount id alone.
    pub async fn force_activate(&self, user_id: &str) -> Result<OrganizerAccount> {
        self.activate_unverified(user_id, ActivationMethod::Forced)
            .await
    }

    pub(crate) async fn activate_unverified(
        &self,
        user_id: &str,
        method: ActivationMethod,
    ) -> Result<OrganizerAccount> {
        let mut record = self.load(user_id).await?;
        record.activate(method, Utc::now())?;
        self.store.upsert(record.clone()).await?;
        info!(user_id = %user_id, %method, "Organizer activated");
        self.notify(&record, method).await;
        Ok(record)
    }

    async fn notify(&self, record: &OrganizerAccount, method: ActivationMethod) {
        send_notice(&self.notifier, record, method).await;
    }

    async fn load(&self, user_id: &str) -> Result<OrganizerAccount> {
        self.store
            .get(user_id)
            .await?
            .ok_or_else(|| PayoutError::NotFound(user_id.to_string()))
    }
}

/// Best-effort activation notice. A failure is logged and swallowed.
pub(crate) async fn send_notice(
    notifier: &NotifierRef,
    record: &OrganizerAccount,
    method: ActivationMethod,
) {
    let notice = ActivationNotice::for_record(record, method);
    if let Err(e) = notifier.notify_activated(&notice).await {
        warn!(user_id = %record.user_id, "Activation notification failed: {}", e);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    pub user_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkActivationReport {
    pub success_count: usize,
    pub fail_count: usize,
    pub failures: Vec<BulkFailure>,
}

/// Applies the activation gate to a batch of organizers, one at a time.
///
/// The store has no transactions, so items are processed sequentially and
/// batches are serialized against each other.
pub struct BulkActivator {
    gate: Arc<ActivationGate>,
    batch_lock: Mutex<()>,
}

impl BulkActivator {
    pub fn new(gate: Arc<ActivationGate>) -> Self {
        Self {
            gate,
            batch_lock: Mutex::new(()),
        }
    }

    pub async fn activate_all(&self, user_ids: &[String]) -> Result<BulkActivationReport> {
        if user_ids.is_empty() {
            return Err(PayoutError::Validation(
                "User IDs array is required".to_string(),
            ));
        }

        let _batch = self.batch_lock.lock().await;
        info!("Bulk activating {} organizers", user_ids.len());

        let mut report = BulkActivationReport::default();
        for user_id in user_ids {
            match self
                .gate
                .activate_unverified(user_id, ActivationMethod::Bulk)
                .await
            {
                Ok(_) => report.success_count += 1,
                Err(e) => {
                    warn!(user_id = %user_id, "Bulk activation item failed: {}", e);
                    report.fail_count += 1;
                    report.failures.push(BulkFailure {
                        user_id: user_id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Bulk activation complete - Success: {}, Failed: {}",
            report.success_count, report.fail_count
        );
        Ok(report)
    }
}
