//! SMS gateway adapter.
//!
//! Fallback (or explicitly requested) channel for phone identities. The
//! gateway keeps the code server-side under a verification session and
//! returns the session handle, so submitted codes can be re-checked remotely
//! at verification time.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use ch_core::domain::{Channel, Identity};
use ch_core::services::delivery::{
    CodeSender, ProviderError, ProviderReceipt, RemoteCodeVerifier,
};

use crate::InfrastructureError;

use super::transport_error;

/// SMS gateway configuration
#[derive(Debug, Clone)]
pub struct SmsGatewayConfig {
    /// Gateway base URL
    pub base_url: String,
    /// Gateway API key
    pub api_key: String,
    /// Sender identifier stamped on outbound messages
    pub sender_id: String,
    /// Per-call timeout in seconds
    pub request_timeout_secs: u64,
}

impl SmsGatewayConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, InfrastructureError> {
        let base_url = std::env::var("SMS_GATEWAY_URL")
            .map_err(|_| InfrastructureError::Config("SMS_GATEWAY_URL not set".to_string()))?;
        let api_key = std::env::var("SMS_GATEWAY_API_KEY")
            .map_err(|_| InfrastructureError::Config("SMS_GATEWAY_API_KEY not set".to_string()))?;

        Ok(Self {
            base_url,
            api_key,
            sender_id: std::env::var("SMS_GATEWAY_SENDER_ID")
                .unwrap_or_else(|_| "CMPSHR".to_string()),
            request_timeout_secs: std::env::var("SMS_GATEWAY_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GatewayResponse {
    status: String,
    details: String,
}

/// SMS gateway adapter
pub struct SmsGatewayProvider {
    client: reqwest::Client,
    config: SmsGatewayConfig,
}

impl SmsGatewayProvider {
    /// Create a new adapter with a client honoring the configured timeout
    pub fn new(config: SmsGatewayConfig) -> Result<Self, InfrastructureError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| InfrastructureError::HttpClient(e.to_string()))?;

        info!(base_url = %config.base_url, "SMS gateway provider initialized");
        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self, InfrastructureError> {
        Self::new(SmsGatewayConfig::from_env()?)
    }

    async fn call(&self, url: String) -> Result<GatewayResponse, ProviderError> {
        let response = self.client.get(&url).send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected {
                detail: format!("gateway returned {}: {}", status, detail),
            });
        }
        response.json().await.map_err(transport_error)
    }
}

#[async_trait]
impl CodeSender for SmsGatewayProvider {
    fn channel(&self) -> Channel {
        Channel::Sms
    }

    async fn send(
        &self,
        identity: &Identity,
        code: &str,
        _display_name: Option<&str>,
    ) -> Result<ProviderReceipt, ProviderError> {
        debug!(
            identity = %identity.masked(),
            "Sending verification code via SMS gateway"
        );

        let url = format!(
            "{}/{}/SMS/{}/{}/{}",
            self.config.base_url,
            self.config.api_key,
            identity.as_str(),
            code,
            self.config.sender_id,
        );
        let parsed = self.call(url).await?;

        if !parsed.status.eq_ignore_ascii_case("success") {
            return Err(ProviderError::Rejected {
                detail: format!("gateway status {}: {}", parsed.status, parsed.details),
            });
        }

        // The gateway's session handle doubles as the message identifier
        info!(
            identity = %identity.masked(),
            session_id = %parsed.details,
            "SMS gateway accepted message"
        );
        Ok(ProviderReceipt {
            provider_message_id: parsed.details.clone(),
            correlation_id: Some(parsed.details),
        })
    }
}

#[async_trait]
impl RemoteCodeVerifier for SmsGatewayProvider {
    async fn remote_verify(
        &self,
        correlation_id: &str,
        code: &str,
    ) -> Result<bool, ProviderError> {
        let url = format!(
            "{}/{}/SMS/VERIFY/{}/{}",
            self.config.base_url, self.config.api_key, correlation_id, code,
        );
        let parsed = self.call(url).await?;

        if parsed.status.eq_ignore_ascii_case("success") {
            return Ok(true);
        }
        // The gateway reports a clean mismatch as an error status with a
        // recognizable detail; anything else is a gateway fault, which the
        // engine turns into a local-comparison fallback.
        if parsed.details.to_ascii_lowercase().contains("mismatch") {
            debug!(session_id = %correlation_id, "Remote verification reported mismatch");
            return Ok(false);
        }
        warn!(
            session_id = %correlation_id,
            detail = %parsed.details,
            "Remote verification returned unexpected status"
        );
        Err(ProviderError::Rejected {
            detail: parsed.details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        std::env::set_var("SMS_GATEWAY_URL", "https://gateway.example/api");
        std::env::set_var("SMS_GATEWAY_API_KEY", "key");
        std::env::remove_var("SMS_GATEWAY_SENDER_ID");
        let config = SmsGatewayConfig::from_env().unwrap();
        assert_eq!(config.sender_id, "CMPSHR");
        assert_eq!(config.request_timeout_secs, 10);
    }
}
