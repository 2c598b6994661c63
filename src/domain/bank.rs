use crate::error::{PayoutError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a NUBAN account number.
pub const ACCOUNT_NUMBER_LEN: usize = 10;

/// A bank account number that passed local format checks.
///
/// Construction is the only place format is validated, so anything holding an
/// `AccountNumber` can be sent to the bank directory without another check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountNumber(String);

impl AccountNumber {
    pub fn new(value: &str) -> Result<Self> {
        let value = value.trim();
        if !value.chars().all(|c| c.is_ascii_digit()) {
            return Err(PayoutError::Format(
                "Account number must contain digits only".to_string(),
            ));
        }
        if value.len() != ACCOUNT_NUMBER_LEN {
            return Err(PayoutError::Format(format!(
                "Account number must be exactly {} digits",
                ACCOUNT_NUMBER_LEN
            )));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccountNumber {
    type Error = PayoutError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<AccountNumber> for String {
    fn from(number: AccountNumber) -> Self {
        number.0
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bank code as listed by the bank directory (e.g. `044`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BankCode(String);

impl BankCode {
    pub fn new(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(PayoutError::Format("Bank code is required".to_string()));
        }
        if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(PayoutError::Format(
                "Bank code must be alphanumeric".to_string(),
            ));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BankCode {
    type Error = PayoutError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<BankCode> for String {
    fn from(code: BankCode) -> Self {
        code.0
    }
}

impl fmt::Display for BankCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An account the bank directory confirmed, with the holder name exactly as reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedAccount {
    pub account_number: AccountNumber,
    pub bank_code: BankCode,
    pub account_name: String,
}

/// Bank details an organizer submits for payouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankDetails {
    pub bank_name: String,
    pub bank_code: BankCode,
    pub account_number: AccountNumber,
}

/// Entry of the bank directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub name: String,
    pub code: String,
    pub slug: String,
}
