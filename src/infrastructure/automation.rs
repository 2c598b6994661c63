use crate::domain::ports::ProvisioningAutomation;
use crate::domain::provisioning::{ProvisioningRequest, ProvisioningResponse};
use crate::error::{PayoutError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};

const PROVIDER_ID: &str = "ONBOARDING_AUTOMATION";

/// Triggers the onboarding automation through its inbound webhook.
///
/// The automation answers either with the created subaccount or with a bare
/// acknowledgement; both count as delivered.
#[derive(Clone)]
pub struct WebhookAutomation {
    client: Client,
    webhook_url: String,
}

impl WebhookAutomation {
    pub fn new(webhook_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PayoutError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            webhook_url: webhook_url.to_string(),
        })
    }
}

#[async_trait]
impl ProvisioningAutomation for WebhookAutomation {
    async fn trigger(
        &self,
        request: &ProvisioningRequest,
        idempotency_key: &str,
    ) -> Result<ProvisioningResponse> {
        debug!(user_id = %request.user_id, "Sending provisioning request");

        let response = self
            .client
            .post(&self.webhook_url)
            .header("Idempotency-Key", idempotency_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PayoutError::provider_unavailable(PROVIDER_ID, "webhook timed out")
                } else {
                    PayoutError::provider_unavailable(
                        PROVIDER_ID,
                        format!("webhook connection failed: {}", e),
                    )
                }
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        interpret_webhook_response(status, &body)
    }
}

/// Reads the subaccount id out of a webhook answer, if there is one.
///
/// Any successful answer without an id, JSON or not, means the automation
/// accepted the request and will provision out of band.
pub fn interpret_webhook_response(status: StatusCode, body: &str) -> Result<ProvisioningResponse> {
    if !status.is_success() {
        let excerpt: String = body.chars().take(100).collect();
        return Err(PayoutError::provider_unavailable(
            PROVIDER_ID,
            format!("webhook error: {} - {}", status.as_u16(), excerpt),
        ));
    }

    let subaccount_id = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["subaccount_code", "subaccount_id"]
                .iter()
                .find_map(|field| value.get(field).and_then(|v| v.as_str()))
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
        });

    match subaccount_id {
        Some(id) => {
            info!(subaccount_id = %id, "Automation returned subaccount");
            Ok(ProvisioningResponse::Assigned(id))
        }
        None => {
            warn!("Automation accepted the request without a subaccount id");
            Ok(ProvisioningResponse::Accepted)
        }
    }
}
