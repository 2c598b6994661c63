//! Paystack adapter for the bank directory and the subaccount provider.
//!
//! Endpoints used:
//! - `GET /bank/resolve` to confirm an account holder
//! - `GET /bank` to list banks
//! - `GET /subaccount/{id}` to reconcile a provisioned subaccount
//!
//! Response interpretation lives in free functions so it can be exercised with
//! canned bodies.

use crate::domain::bank::{AccountNumber, Bank, BankCode, VerifiedAccount};
use crate::domain::ports::{BankDirectory, SubaccountProvider};
use crate::domain::subaccount::SubaccountRecord;
use crate::error::{PayoutError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

const PROVIDER_ID: &str = "PAYSTACK";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ResolvedAccount {
    account_name: String,
}

#[derive(Debug, Deserialize)]
struct BankItem {
    name: String,
    code: String,
    #[serde(default)]
    slug: String,
}

#[derive(Debug, Deserialize)]
struct SubaccountData {
    subaccount_code: String,
    #[serde(default)]
    business_name: Option<String>,
    #[serde(default)]
    settlement_bank: Option<String>,
    #[serde(default)]
    account_number: Option<String>,
}

/// Paystack HTTP client.
#[derive(Clone)]
pub struct PaystackClient {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl PaystackClient {
    pub fn new(base_url: &str, secret_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PayoutError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    async fn fetch(&self, path: &str, params: &[(&str, &str)]) -> Result<(StatusCode, String)> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Paystack request: {} with {} params", path, params.len());

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.secret_key)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PayoutError::provider_unavailable(PROVIDER_ID, "request timed out")
                } else {
                    PayoutError::provider_unavailable(PROVIDER_ID, format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            PayoutError::provider_unavailable(PROVIDER_ID, format!("failed to read body: {}", e))
        })?;
        Ok((status, body))
    }
}

#[async_trait]
impl BankDirectory for PaystackClient {
    async fn resolve_account(
        &self,
        account_number: &AccountNumber,
        bank_code: &BankCode,
    ) -> Result<VerifiedAccount> {
        let (status, body) = self
            .fetch(
                "/bank/resolve",
                &[
                    ("account_number", account_number.as_str()),
                    ("bank_code", bank_code.as_str()),
                ],
            )
            .await?;
        interpret_resolve(status, &body, account_number, bank_code)
    }

    async fn list_banks(&self) -> Result<Vec<Bank>> {
        let (status, body) = self.fetch("/bank", &[("currency", "NGN")]).await?;
        interpret_banks(status, &body)
    }
}

#[async_trait]
impl SubaccountProvider for PaystackClient {
    async fn fetch_subaccount(&self, subaccount_id: &str) -> Result<Option<SubaccountRecord>> {
        let path = format!("/subaccount/{}", subaccount_id);
        let (status, body) = self.fetch(&path, &[]).await?;
        interpret_subaccount(status, &body)
    }
}

fn parse_envelope<T: DeserializeOwned>(body: &str) -> Option<Envelope<T>> {
    serde_json::from_str(body).ok()
}

fn envelope_message(body: &str) -> Option<String> {
    parse_envelope::<serde_json::Value>(body).and_then(|e| e.message)
}

fn is_quota_exhausted(status: StatusCode, message: Option<&str>) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || message.is_some_and(|m| m.to_ascii_lowercase().contains("daily limit"))
}

/// Errors common to every endpoint: quota, credentials and server failures.
fn classify_failure(status: StatusCode, body: &str) -> Option<PayoutError> {
    let message = envelope_message(body);
    if is_quota_exhausted(status, message.as_deref()) {
        warn!("Paystack verification quota exhausted");
        return Some(PayoutError::RateLimited {
            provider: PROVIDER_ID.to_string(),
        });
    }
    if status == StatusCode::UNAUTHORIZED {
        return Some(PayoutError::provider_unavailable(
            PROVIDER_ID,
            "invalid or missing API key",
        ));
    }
    if status.is_server_error() {
        return Some(PayoutError::provider_unavailable(
            PROVIDER_ID,
            format!("HTTP {}", status.as_u16()),
        ));
    }
    None
}

/// Interprets a `/bank/resolve` response. Never produces a name the provider did not send.
pub fn interpret_resolve(
    status: StatusCode,
    body: &str,
    account_number: &AccountNumber,
    bank_code: &BankCode,
) -> Result<VerifiedAccount> {
    if let Some(err) = classify_failure(status, body) {
        return Err(err);
    }

    let Some(envelope) = parse_envelope::<ResolvedAccount>(body) else {
        return Err(PayoutError::provider_unavailable(
            PROVIDER_ID,
            "unreadable verification response",
        ));
    };

    match (status.is_success() && envelope.status, envelope.data) {
        (true, Some(data)) if !data.account_name.trim().is_empty() => Ok(VerifiedAccount {
            account_number: account_number.clone(),
            bank_code: bank_code.clone(),
            account_name: data.account_name,
        }),
        _ => Err(PayoutError::InvalidAccount(envelope.message.unwrap_or_else(
            || "Could not verify account number. Please check and try again.".to_string(),
        ))),
    }
}

pub fn interpret_banks(status: StatusCode, body: &str) -> Result<Vec<Bank>> {
    if let Some(err) = classify_failure(status, body) {
        return Err(err);
    }
    match parse_envelope::<Vec<BankItem>>(body) {
        Some(Envelope {
            status: true,
            data: Some(items),
            ..
        }) if status.is_success() => Ok(items
            .into_iter()
            .map(|item| Bank {
                name: item.name,
                code: item.code,
                slug: item.slug,
            })
            .collect()),
        _ => Err(PayoutError::provider_unavailable(
            PROVIDER_ID,
            "failed to fetch banks",
        )),
    }
}

/// Interprets a `/subaccount/{id}` response; `Ok(None)` means the provider denies the id.
pub fn interpret_subaccount(status: StatusCode, body: &str) -> Result<Option<SubaccountRecord>> {
    if let Some(err) = classify_failure(status, body) {
        return Err(err);
    }
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }

    let Some(envelope) = parse_envelope::<SubaccountData>(body) else {
        return Err(PayoutError::provider_unavailable(
            PROVIDER_ID,
            "unreadable subaccount response",
        ));
    };

    match envelope.data {
        Some(data) if status.is_success() && envelope.status => Ok(Some(SubaccountRecord {
            subaccount_id: data.subaccount_code,
            business_name: data.business_name,
            settlement_bank: data.settlement_bank,
            account_number: data.account_number,
        })),
        _ if status.is_client_error() || !envelope.status => Ok(None),
        _ => Err(PayoutError::provider_unavailable(
            PROVIDER_ID,
            envelope
                .message
                .unwrap_or_else(|| "unexpected subaccount response".to_string()),
        )),
    }
}
