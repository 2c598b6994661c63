use crate::domain::organizer::{ActivationMethod, OrganizerAccount, OrganizerState};
use crate::domain::ports::{OrganizerStoreRef, SubaccountProviderRef};
use crate::domain::subaccount::SubaccountRecord;
use crate::error::{PayoutError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One row of the admin organizer listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganizerSummary {
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub account_name: Option<String>,
    pub subaccount_id: Option<String>,
    pub state: OrganizerState,
    pub activation_method: Option<ActivationMethod>,
    pub activated_at: Option<DateTime<Utc>>,
}

impl From<&OrganizerAccount> for OrganizerSummary {
    fn from(record: &OrganizerAccount) -> Self {
        Self {
            user_id: record.user_id.clone(),
            name: record.display_name().to_string(),
            email: record.email.clone(),
            bank_name: record.bank_name().map(str::to_string),
            account_number: record.account_number().map(ToString::to_string),
            account_name: record.account_name().map(str::to_string),
            subaccount_id: record.subaccount_id().map(str::to_string),
            state: record.state(),
            activation_method: record.activation().map(|a| a.method),
            activated_at: record.activation().map(|a| a.activated_at),
        }
    }
}

/// Diagnosis of an organizer's payout setup, combining local and provider state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SetupStatus {
    NotFound,
    NoSubaccount,
    Active,
    NeedsActivation,
    NotInProvider,
    ProviderError { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    #[serde(flatten)]
    pub status: SetupStatus,
    pub record: Option<OrganizerAccount>,
    pub subaccount: Option<SubaccountRecord>,
}

/// Export of every organizer record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupDocument {
    pub exported_at: DateTime<Utc>,
    /// Kept as raw JSON so one bad record does not reject the whole document.
    pub organizers: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub restored: usize,
    pub skipped: Vec<String>,
}

/// Read-mostly admin surfaces over the organizer store.
pub struct AdminService {
    store: OrganizerStoreRef,
    provider: SubaccountProviderRef,
}

impl AdminService {
    pub fn new(store: OrganizerStoreRef, provider: SubaccountProviderRef) -> Self {
        Self { store, provider }
    }

    pub async fn organizer(&self, user_id: &str) -> Result<OrganizerAccount> {
        self.store
            .get(user_id)
            .await?
            .ok_or_else(|| PayoutError::NotFound(user_id.to_string()))
    }

    /// Records with a subaccount id that are not active yet.
    pub async fn pending_queue(&self) -> Result<Vec<OrganizerAccount>> {
        let pending: Vec<_> = self
            .store
            .scan("")
            .await?
            .into_iter()
            .filter(|r| r.state() == OrganizerState::SubaccountPending)
            .collect();
        info!("Found {} pending subaccounts", pending.len());
        Ok(pending)
    }

    pub async fn list_organizers(&self) -> Result<Vec<OrganizerSummary>> {
        Ok(self
            .store
            .scan("")
            .await?
            .iter()
            .map(OrganizerSummary::from)
            .collect())
    }

    /// Reports where an organizer stands without changing anything.
    pub async fn status(&self, user_id: &str) -> Result<StatusReport> {
        let Some(record) = self.store.get(user_id).await? else {
            return Ok(StatusReport {
                status: SetupStatus::NotFound,
                record: None,
                subaccount: None,
            });
        };

        let Some(subaccount_id) = record.subaccount_id() else {
            return Ok(StatusReport {
                status: SetupStatus::NoSubaccount,
                record: Some(record),
                subaccount: None,
            });
        };

        let (status, subaccount) = match self.provider.fetch_subaccount(subaccount_id).await {
            Ok(Some(subaccount)) if record.is_setup_complete() => {
                (SetupStatus::Active, Some(subaccount))
            }
            Ok(Some(subaccount)) => (SetupStatus::NeedsActivation, Some(subaccount)),
            Ok(None) => (SetupStatus::NotInProvider, None),
            Err(e) => {
                warn!(user_id = %user_id, "Provider check failed: {}", e);
                (
                    SetupStatus::ProviderError {
                        reason: e.to_string(),
                    },
                    None,
                )
            }
        };

        Ok(StatusReport {
            status,
            record: Some(record),
            subaccount,
        })
    }

    pub async fn export_backup(&self) -> Result<BackupDocument> {
        let organizers = self
            .store
            .scan("")
            .await?
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(BackupDocument {
            exported_at: Utc::now(),
            organizers,
        })
    }

    /// Writes every valid record of the backup over the stored one with the same key.
    pub async fn restore_backup(&self, backup: BackupDocument) -> Result<RestoreReport> {
        let mut report = RestoreReport::default();
        for (index, value) in backup.organizers.into_iter().enumerate() {
            let record = match serde_json::from_value::<OrganizerAccount>(value) {
                Ok(record) => record,
                Err(e) => {
                    report.skipped.push(format!("record {}: {}", index, e));
                    continue;
                }
            };
            if let Err(e) = record.validate() {
                report.skipped.push(format!("record {}: {}", index, e));
                continue;
            }
            self.store.upsert(record).await?;
            report.restored += 1;
        }
        info!(
            "Backup restore complete: {} restored, {} skipped",
            report.restored,
            report.skipped.len()
        );
        Ok(report)
    }
}
