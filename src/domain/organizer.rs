use crate::domain::bank::{AccountNumber, BankCode, BankDetails, VerifiedAccount};
use crate::error::{PayoutError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a record reached the active state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationMethod {
    /// Admin activation confirmed by the subaccount provider.
    Verified,
    /// Admin override based only on the local subaccount id.
    Forced,
    /// Admin bulk approval of the pending queue.
    Bulk,
}

impl fmt::Display for ActivationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Verified => "verified",
            Self::Forced => "forced",
            Self::Bulk => "bulk",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activation {
    pub method: ActivationMethod,
    pub activated_at: DateTime<Utc>,
}

/// Position of an organizer in the payout-activation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrganizerState {
    Unregistered,
    BankSubmitted,
    SubaccountPending,
    Active,
}

impl OrganizerState {
    /// State of an optional record; a missing record is `Unregistered`.
    pub fn of(record: Option<&OrganizerAccount>) -> Self {
        record.map_or(Self::Unregistered, OrganizerAccount::state)
    }
}

impl fmt::Display for OrganizerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unregistered => "unregistered",
            Self::BankSubmitted => "bank_submitted",
            Self::SubaccountPending => "subaccount_pending",
            Self::Active => "active",
        };
        f.write_str(label)
    }
}

/// Outcome of applying submitted bank details to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankChange {
    /// First submission for this record.
    Initial,
    /// Same account and bank as before.
    Unchanged,
    /// Account number or bank code changed; previous verification was discarded.
    Replaced,
}

/// The payout record kept for each organizer.
///
/// State-changing fields are private: the only way to mark a record payable is
/// [`OrganizerAccount::activate`], which refuses records without a subaccount id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizerAccount {
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    bank_name: Option<String>,
    #[serde(default)]
    bank_code: Option<BankCode>,
    #[serde(default)]
    account_number: Option<AccountNumber>,
    #[serde(default)]
    account_name: Option<String>,
    #[serde(default)]
    subaccount_id: Option<String>,
    #[serde(default)]
    subaccount_setup_complete: bool,
    #[serde(default)]
    paystack_verified: bool,
    #[serde(default)]
    last_verified: Option<DateTime<Utc>>,
    #[serde(default)]
    activation: Option<Activation>,
    pub created_at: DateTime<Utc>,
}

impl OrganizerAccount {
    pub fn new(user_id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            name: None,
            bank_name: None,
            bank_code: None,
            account_number: None,
            account_name: None,
            subaccount_id: None,
            subaccount_setup_complete: false,
            paystack_verified: false,
            last_verified: None,
            activation: None,
            created_at,
        }
    }

    pub fn bank_name(&self) -> Option<&str> {
        self.bank_name.as_deref()
    }

    pub fn bank_code(&self) -> Option<&BankCode> {
        self.bank_code.as_ref()
    }

    pub fn account_number(&self) -> Option<&AccountNumber> {
        self.account_number.as_ref()
    }

    pub fn account_name(&self) -> Option<&str> {
        self.account_name.as_deref()
    }

    pub fn subaccount_id(&self) -> Option<&str> {
        self.subaccount_id.as_deref()
    }

    pub fn paystack_verified(&self) -> bool {
        self.paystack_verified
    }

    pub fn last_verified(&self) -> Option<DateTime<Utc>> {
        self.last_verified
    }

    pub fn activation(&self) -> Option<&Activation> {
        self.activation.as_ref()
    }

    /// Whether the organizer can create events and receive payouts.
    pub fn is_setup_complete(&self) -> bool {
        self.subaccount_setup_complete
    }

    pub fn state(&self) -> OrganizerState {
        if self.subaccount_setup_complete {
            OrganizerState::Active
        } else if self.subaccount_id.is_some() {
            OrganizerState::SubaccountPending
        } else if self.account_name.is_some() {
            OrganizerState::BankSubmitted
        } else {
            OrganizerState::Unregistered
        }
    }

    /// Applies bank details together with the directory's verification of them.
    ///
    /// A different account number or bank code invalidates the previous
    /// verification and drops a subaccount provisioned for the old account.
    pub fn apply_bank_details(
        &mut self,
        details: &BankDetails,
        verified: &VerifiedAccount,
    ) -> Result<BankChange> {
        if verified.account_number != details.account_number
            || verified.bank_code != details.bank_code
        {
            return Err(PayoutError::Validation(
                "Verification does not match the submitted account".to_string(),
            ));
        }

        let change = match (&self.account_number, &self.bank_code) {
            (None, _) | (_, None) => BankChange::Initial,
            (Some(number), Some(code))
                if *number == details.account_number && *code == details.bank_code =>
            {
                BankChange::Unchanged
            }
            _ => BankChange::Replaced,
        };

        if self.subaccount_setup_complete && change != BankChange::Unchanged {
            return Err(PayoutError::AlreadyActive(format!(
                "{} has an active payout account; bank details cannot change",
                self.user_id
            )));
        }

        if change == BankChange::Replaced {
            self.invalidate_verification();
            self.subaccount_id = None;
        }

        self.bank_name = Some(details.bank_name.clone());
        self.bank_code = Some(details.bank_code.clone());
        self.account_number = Some(details.account_number.clone());
        self.account_name = Some(verified.account_name.clone());
        Ok(change)
    }

    fn invalidate_verification(&mut self) {
        self.account_name = None;
        self.paystack_verified = false;
        self.last_verified = None;
    }

    /// Records the subaccount id produced by the provisioning automation.
    pub fn assign_subaccount(&mut self, subaccount_id: &str) -> Result<()> {
        let subaccount_id = subaccount_id.trim();
        if subaccount_id.is_empty() {
            return Err(PayoutError::Format("Subaccount id is empty".to_string()));
        }
        if self.subaccount_setup_complete {
            return Err(PayoutError::AlreadyActive(self.user_id.clone()));
        }
        if self.account_name.is_none() {
            return Err(PayoutError::MissingPrecondition(format!(
                "No verified bank details for {}",
                self.user_id
            )));
        }
        self.subaccount_id = Some(subaccount_id.to_string());
        Ok(())
    }

    /// Stamps a provider confirmation of the subaccount.
    pub fn record_provider_confirmation(&mut self, at: DateTime<Utc>) {
        self.paystack_verified = true;
        self.last_verified = Some(at);
    }

    /// Checks the preconditions shared by every path into the active state.
    pub fn ensure_activatable(&self) -> Result<()> {
        if self.subaccount_id.is_none() {
            return Err(PayoutError::MissingPrecondition(format!(
                "No subaccount ID for: {}",
                self.display_name()
            )));
        }
        if self.subaccount_setup_complete {
            return Err(PayoutError::AlreadyActive(self.display_name().to_string()));
        }
        Ok(())
    }

    /// Moves a `SubaccountPending` record to `Active`.
    pub fn activate(&mut self, method: ActivationMethod, at: DateTime<Utc>) -> Result<()> {
        self.ensure_activatable()?;
        self.subaccount_setup_complete = true;
        self.activation = Some(Activation {
            method,
            activated_at: at,
        });
        Ok(())
    }

    /// Checks the record is internally consistent, e.g. after loading a backup.
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(PayoutError::Validation("Record has no user_id".to_string()));
        }
        if self.subaccount_setup_complete && self.subaccount_id.is_none() {
            return Err(PayoutError::Validation(format!(
                "{} is marked complete without a subaccount id",
                self.user_id
            )));
        }
        if self.subaccount_setup_complete != self.activation.is_some() {
            return Err(PayoutError::Validation(format!(
                "{} has inconsistent activation provenance",
                self.user_id
            )));
        }
        Ok(())
    }

    /// Name used in admin messages, falling back to the user id.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.user_id)
    }
}
