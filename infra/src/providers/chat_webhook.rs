//! Chat-webhook gateway adapter.
//!
//! Primary delivery channel for phone identities. The gateway accepts a
//! webhook POST carrying a message template and the destination number, and
//! answers with a message identifier. The same gateway carries the
//! best-effort follow-up notification sent after an SMS fallback.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use ch_core::domain::{Channel, Identity};
use ch_core::services::delivery::{CodeSender, Notifier, ProviderError, ProviderReceipt};

use crate::InfrastructureError;

use super::transport_error;

/// Chat-webhook gateway configuration
#[derive(Debug, Clone)]
pub struct ChatWebhookConfig {
    /// Webhook endpoint URL
    pub endpoint_url: String,
    /// Gateway API key
    pub api_key: String,
    /// Template name for verification messages
    pub otp_template: String,
    /// Template name for the follow-up notification
    pub followup_template: String,
    /// Per-call timeout in seconds
    pub request_timeout_secs: u64,
}

impl ChatWebhookConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, InfrastructureError> {
        let endpoint_url = std::env::var("CHAT_WEBHOOK_URL")
            .map_err(|_| InfrastructureError::Config("CHAT_WEBHOOK_URL not set".to_string()))?;
        let api_key = std::env::var("CHAT_WEBHOOK_API_KEY")
            .map_err(|_| InfrastructureError::Config("CHAT_WEBHOOK_API_KEY not set".to_string()))?;

        Ok(Self {
            endpoint_url,
            api_key,
            otp_template: std::env::var("CHAT_WEBHOOK_OTP_TEMPLATE")
                .unwrap_or_else(|_| "verification_code".to_string()),
            followup_template: std::env::var("CHAT_WEBHOOK_FOLLOWUP_TEMPLATE")
                .unwrap_or_else(|_| "getting_started".to_string()),
            request_timeout_secs: std::env::var("CHAT_WEBHOOK_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        })
    }
}

#[derive(Debug, Deserialize)]
struct WebhookResponse {
    message_id: Option<String>,
    error: Option<String>,
}

/// Chat-webhook gateway adapter
pub struct ChatWebhookProvider {
    client: reqwest::Client,
    config: ChatWebhookConfig,
}

impl ChatWebhookProvider {
    /// Create a new adapter with a client honoring the configured timeout
    pub fn new(config: ChatWebhookConfig) -> Result<Self, InfrastructureError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| InfrastructureError::HttpClient(e.to_string()))?;

        info!(
            endpoint = %config.endpoint_url,
            "Chat-webhook provider initialized"
        );
        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self, InfrastructureError> {
        Self::new(ChatWebhookConfig::from_env()?)
    }

    async fn post_template(
        &self,
        destination: &str,
        template: &str,
        params: serde_json::Value,
    ) -> Result<String, ProviderError> {
        let body = serde_json::json!({
            "apiKey": self.config.api_key,
            "destination": destination,
            "template": template,
            "params": params,
        });

        let response = self
            .client
            .post(&self.config.endpoint_url)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected {
                detail: format!("gateway returned {}: {}", status, detail),
            });
        }

        let parsed: WebhookResponse = response.json().await.map_err(transport_error)?;
        if let Some(error) = parsed.error {
            return Err(ProviderError::Rejected { detail: error });
        }
        parsed.message_id.ok_or_else(|| ProviderError::Rejected {
            detail: "gateway response missing message_id".to_string(),
        })
    }
}

#[async_trait]
impl CodeSender for ChatWebhookProvider {
    fn channel(&self) -> Channel {
        Channel::ChatWebhook
    }

    async fn send(
        &self,
        identity: &Identity,
        code: &str,
        display_name: Option<&str>,
    ) -> Result<ProviderReceipt, ProviderError> {
        debug!(
            identity = %identity.masked(),
            template = %self.config.otp_template,
            "Sending verification code via chat-webhook"
        );

        let params = serde_json::json!({
            "code": code,
            "name": display_name.unwrap_or("there"),
        });
        let message_id = self
            .post_template(identity.as_str(), &self.config.otp_template, params)
            .await?;

        info!(
            identity = %identity.masked(),
            message_id = %message_id,
            "Chat-webhook message accepted"
        );
        Ok(ProviderReceipt {
            provider_message_id: message_id,
            correlation_id: None,
        })
    }
}

#[async_trait]
impl Notifier for ChatWebhookProvider {
    async fn notify(
        &self,
        identity: &Identity,
        display_name: Option<&str>,
    ) -> Result<(), ProviderError> {
        let params = serde_json::json!({
            "name": display_name.unwrap_or("there"),
        });
        self.post_template(identity.as_str(), &self.config.followup_template, params)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_requires_endpoint() {
        std::env::remove_var("CHAT_WEBHOOK_URL");
        std::env::set_var("CHAT_WEBHOOK_API_KEY", "key");
        let result = ChatWebhookConfig::from_env();
        assert!(matches!(result, Err(InfrastructureError::Config(_))));
    }
}
