//! Provider gateway adapters.
//!
//! Each adapter implements the `ch_core` delivery contracts over a vendor
//! HTTP API. Per-call timeouts are enforced by the underlying `reqwest`
//! client; a timeout surfaces as a transport error and is treated exactly
//! like an explicit provider failure.

pub mod chat_webhook;
pub mod email_api;
pub mod mock;
pub mod sms_gateway;

pub use chat_webhook::{ChatWebhookConfig, ChatWebhookProvider};
pub use email_api::{EmailApiConfig, EmailApiProvider};
pub use mock::MockProvider;
pub use sms_gateway::{SmsGatewayConfig, SmsGatewayProvider};

use ch_core::services::delivery::ProviderError;

/// Map a reqwest failure onto the provider contract. The orchestrator treats
/// timeouts the same as any other transport fault.
pub(crate) fn transport_error(err: reqwest::Error) -> ProviderError {
    let detail = if err.is_timeout() {
        "request timed out".to_string()
    } else {
        err.to_string()
    };
    ProviderError::Transport { detail }
}
