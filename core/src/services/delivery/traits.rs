//! Traits for delivery provider integration.
//!
//! Each communication provider (chat-webhook gateway, SMS gateway,
//! transactional email) sits behind these contracts; the orchestrator never
//! sees vendor wire formats. A timeout inside an adapter surfaces as an
//! ordinary `ProviderError` and is treated exactly like an explicit failure.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Channel, Identity};

/// Failure reported by a provider adapter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider could not be reached or timed out
    #[error("provider transport failure: {detail}")]
    Transport { detail: String },

    /// The provider answered but refused the request
    #[error("provider rejected the request: {detail}")]
    Rejected { detail: String },
}

impl ProviderError {
    /// Provider-level detail preserved for observability
    pub fn detail(&self) -> &str {
        match self {
            ProviderError::Transport { detail } | ProviderError::Rejected { detail } => detail,
        }
    }
}

/// Receipt returned by a successful provider send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReceipt {
    /// Provider-assigned message identifier
    pub provider_message_id: String,
    /// Remote verification session handle, when the provider issues one
    /// (SMS-class gateways)
    pub correlation_id: Option<String>,
}

/// A provider capable of transmitting a verification code.
#[async_trait]
pub trait CodeSender: Send + Sync {
    /// The channel this provider serves
    fn channel(&self) -> Channel;

    /// Transmit the code of record to the identity. The adapter owns its
    /// per-call timeout; blocking past it is a contract violation.
    async fn send(
        &self,
        identity: &Identity,
        code: &str,
        display_name: Option<&str>,
    ) -> Result<ProviderReceipt, ProviderError>;
}

/// Optional remote re-verification offered by SMS-class providers that hold
/// the code server-side under a correlation handle.
#[async_trait]
pub trait RemoteCodeVerifier: Send + Sync {
    /// Ask the provider whether `code` matches the session identified by
    /// `correlation_id`. A transport error here makes the engine fall back
    /// to local comparison; a clean `false` does not.
    async fn remote_verify(&self, correlation_id: &str, code: &str)
        -> Result<bool, ProviderError>;
}

/// Best-effort secondary notification fired after a successful SMS delivery.
/// Failures are logged and never surfaced to the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        identity: &Identity,
        display_name: Option<&str>,
    ) -> Result<(), ProviderError>;
}
