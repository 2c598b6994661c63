use crate::domain::organizer::{ActivationMethod, OrganizerAccount};
use serde::{Deserialize, Serialize};

/// A payout subaccount as the provider reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubaccountRecord {
    pub subaccount_id: String,
    pub business_name: Option<String>,
    pub settlement_bank: Option<String>,
    pub account_number: Option<String>,
}

impl SubaccountRecord {
    /// Whether the subaccount settles to the account recorded locally.
    ///
    /// A provider record without an account number is not treated as a mismatch.
    pub fn settles_to(&self, record: &OrganizerAccount) -> bool {
        match (&self.account_number, record.account_number()) {
            (Some(upstream), Some(local)) => upstream.trim() == local.as_str(),
            _ => true,
        }
    }
}

/// Message sent to an organizer once their payout account is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationNotice {
    pub user_id: String,
    pub email: Option<String>,
    pub name: String,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub account_name: Option<String>,
    pub method: ActivationMethod,
}

impl ActivationNotice {
    pub fn for_record(record: &OrganizerAccount, method: ActivationMethod) -> Self {
        Self {
            user_id: record.user_id.clone(),
            email: record.email.clone(),
            name: record.display_name().to_string(),
            bank_name: record.bank_name().map(str::to_string),
            account_number: record.account_number().map(ToString::to_string),
            account_name: record.account_name().map(str::to_string),
            method,
        }
    }
}
