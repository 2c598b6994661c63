use crate::domain::organizer::OrganizerAccount;
use crate::error::{PayoutError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Payload sent to the onboarding automation to create a payout subaccount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningRequest {
    #[serde(rename = "organizer_id")]
    pub user_id: String,
    pub bank_code: String,
    pub account_number: String,
    pub account_name: String,
    pub email: Option<String>,
    pub business_name: Option<String>,
}

impl ProvisioningRequest {
    /// Builds the payload from a record with verified bank details.
    pub fn from_record(record: &OrganizerAccount) -> Result<Self> {
        let (Some(bank_code), Some(account_number), Some(account_name)) = (
            record.bank_code(),
            record.account_number(),
            record.account_name(),
        ) else {
            return Err(PayoutError::MissingPrecondition(format!(
                "No verified bank details for {}",
                record.user_id
            )));
        };

        Ok(Self {
            user_id: record.user_id.clone(),
            bank_code: bank_code.to_string(),
            account_number: account_number.to_string(),
            account_name: account_name.to_string(),
            email: record.email.clone(),
            business_name: record.name.clone(),
        })
    }

    /// Hex SHA-256 over the fields that identify what gets provisioned upstream.
    ///
    /// Contact details are excluded: a new email must not provision a second subaccount.
    pub fn submission_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for part in [
            self.user_id.as_str(),
            self.bank_code.as_str(),
            self.account_number.as_str(),
            self.account_name.as_str(),
        ] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        hex::encode(hasher.finalize())
    }

    pub fn outbox_key(&self) -> String {
        format!("{}:{}", self.user_id, self.submission_hash())
    }
}

/// What the automation answered to a trigger call that reached it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningResponse {
    /// The subaccount was created synchronously.
    Assigned(String),
    /// Accepted; the subaccount will be created out of band.
    Accepted,
}

/// Outcome of a provisioning attempt as seen by the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProvisioningOutcome {
    Assigned { subaccount_id: String },
    Pending,
    /// The call failed; the details were still saved and show as "processing".
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OutboxStatus {
    Accepted,
    Assigned { subaccount_id: String },
    Failed { reason: String },
}

/// One provisioning submission, keyed by user and submission hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub key: String,
    pub request: ProvisioningRequest,
    pub status: OutboxStatus,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OutboxEntry {
    pub fn new(request: ProvisioningRequest, at: DateTime<Utc>) -> Self {
        Self {
            key: request.outbox_key(),
            request,
            status: OutboxStatus::Failed {
                reason: "not sent".to_string(),
            },
            attempts: 0,
            created_at: at,
            updated_at: at,
        }
    }

    /// Whether the automation already took this submission.
    pub fn is_delivered(&self) -> bool {
        !matches!(self.status, OutboxStatus::Failed { .. })
    }

    pub fn record_attempt(&mut self, status: OutboxStatus, at: DateTime<Utc>) {
        self.status = status;
        self.attempts += 1;
        self.updated_at = at;
    }

    pub fn outcome(&self) -> ProvisioningOutcome {
        match &self.status {
            OutboxStatus::Accepted => ProvisioningOutcome::Pending,
            OutboxStatus::Assigned { subaccount_id } => ProvisioningOutcome::Assigned {
                subaccount_id: subaccount_id.clone(),
            },
            OutboxStatus::Failed { reason } => ProvisioningOutcome::Failed {
                reason: reason.clone(),
            },
        }
    }
}
