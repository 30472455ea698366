//! Transactional email adapter.
//!
//! Sole channel for college and recruiter identities. There is no automatic
//! retry on this path: a failure is surfaced to the caller, who re-requests
//! subject to the cool-down.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use ch_core::domain::{Channel, Identity};
use ch_core::services::delivery::{CodeSender, ProviderError, ProviderReceipt};

use crate::InfrastructureError;

use super::transport_error;

/// Transactional email service configuration
#[derive(Debug, Clone)]
pub struct EmailApiConfig {
    /// Service endpoint URL
    pub api_url: String,
    /// API credential, sent as HTTP basic auth
    pub api_key: String,
    /// From address on outbound mail
    pub from_address: String,
    /// From display name on outbound mail
    pub from_name: String,
    /// Per-call timeout in seconds
    pub request_timeout_secs: u64,
}

impl EmailApiConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, InfrastructureError> {
        let api_url = std::env::var("EMAIL_API_URL")
            .map_err(|_| InfrastructureError::Config("EMAIL_API_URL not set".to_string()))?;
        let api_key = std::env::var("EMAIL_API_KEY")
            .map_err(|_| InfrastructureError::Config("EMAIL_API_KEY not set".to_string()))?;
        let from_address = std::env::var("EMAIL_FROM_ADDRESS")
            .map_err(|_| InfrastructureError::Config("EMAIL_FROM_ADDRESS not set".to_string()))?;

        Ok(Self {
            api_url,
            api_key,
            from_address,
            from_name: std::env::var("EMAIL_FROM_NAME")
                .unwrap_or_else(|_| "CampusHire".to_string()),
            request_timeout_secs: std::env::var("EMAIL_API_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        })
    }
}

#[derive(Debug, Deserialize)]
struct EmailApiResponse {
    id: Option<String>,
    message: Option<String>,
}

/// Transactional email adapter
pub struct EmailApiProvider {
    client: reqwest::Client,
    config: EmailApiConfig,
}

impl EmailApiProvider {
    /// Create a new adapter with a client honoring the configured timeout
    pub fn new(config: EmailApiConfig) -> Result<Self, InfrastructureError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| InfrastructureError::HttpClient(e.to_string()))?;

        info!(api_url = %config.api_url, "Email provider initialized");
        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self, InfrastructureError> {
        Self::new(EmailApiConfig::from_env()?)
    }

    fn auth_header(&self) -> String {
        format!("Basic {}", BASE64.encode(format!("api:{}", self.config.api_key)))
    }
}

#[async_trait]
impl CodeSender for EmailApiProvider {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn send(
        &self,
        identity: &Identity,
        code: &str,
        display_name: Option<&str>,
    ) -> Result<ProviderReceipt, ProviderError> {
        debug!(
            identity = %identity.masked(),
            "Sending verification code via email"
        );

        let body = serde_json::json!({
            "from": { "address": self.config.from_address, "name": self.config.from_name },
            "to": identity.as_str(),
            "subject": "Your CampusHire verification code",
            "template": "verification_code",
            "params": {
                "code": code,
                "name": display_name.unwrap_or("there"),
            },
        });

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected {
                detail: format!("email service returned {}: {}", status, detail),
            });
        }

        let parsed: EmailApiResponse = response.json().await.map_err(transport_error)?;
        let message_id = parsed.id.ok_or_else(|| ProviderError::Rejected {
            detail: parsed
                .message
                .unwrap_or_else(|| "email service response missing message id".to_string()),
        })?;

        info!(
            identity = %identity.masked(),
            message_id = %message_id,
            "Email accepted by service"
        );
        Ok(ProviderReceipt {
            provider_message_id: message_id,
            correlation_id: None,
        })
    }
}
