use crate::domain::ports::Notifier;
use crate::domain::subaccount::ActivationNotice;
use crate::error::{PayoutError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

const PROVIDER_ID: &str = "RESEND";

#[derive(Debug, Serialize)]
struct EmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: String,
}

/// Sends activation notices as email through the Resend API.
#[derive(Clone)]
pub struct ResendNotifier {
    client: Client,
    base_url: String,
    api_key: String,
    from: String,
}

impl ResendNotifier {
    pub fn new(base_url: &str, api_key: &str, from: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PayoutError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            from: from.to_string(),
        })
    }
}

pub fn activation_subject() -> &'static str {
    "Your payout account is approved"
}

pub fn activation_text(notice: &ActivationNotice) -> String {
    let mut text = format!(
        "Hi {},\n\nYour payout account has been approved. You can now create events and receive payouts.\n",
        notice.name
    );
    if let (Some(bank), Some(account)) = (&notice.bank_name, &notice.account_number) {
        text.push_str(&format!("\nPayouts go to {} account {}", bank, account));
        if let Some(holder) = &notice.account_name {
            text.push_str(&format!(" ({})", holder));
        }
        text.push_str(".\n");
    }
    text
}

#[async_trait]
impl Notifier for ResendNotifier {
    async fn notify_activated(&self, notice: &ActivationNotice) -> Result<()> {
        let Some(to) = notice.email.as_deref() else {
            return Err(PayoutError::Validation(format!(
                "No email on record for {}",
                notice.user_id
            )));
        };

        let body = EmailRequest {
            from: &self.from,
            to,
            subject: activation_subject(),
            text: activation_text(notice),
        };

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PayoutError::provider_unavailable(PROVIDER_ID, e.to_string()))?;

        if !response.status().is_success() {
            return Err(PayoutError::provider_unavailable(
                PROVIDER_ID,
                format!("HTTP {}", response.status().as_u16()),
            ));
        }

        info!(user_id = %notice.user_id, "Activation email sent");
        Ok(())
    }
}

/// Notifier used when no email provider is configured.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_activated(&self, notice: &ActivationNotice) -> Result<()> {
        info!(
            user_id = %notice.user_id,
            method = %notice.method,
            "Payout account activated (email delivery not configured)"
        );
        Ok(())
    }
}
