//! Session hand-off boundary.
//!
//! The engine reports only the verified identity and user type; resolving or
//! provisioning the owning account and minting a session credential belong
//! to the collaborator behind this trait. A no-op implementation ships for
//! deployments where auto-login is disabled.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::DomainResult;
use crate::services::verification::VerifiedIdentity;

/// Credential handed back to the caller after a successful hand-off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffOutcome {
    /// Identifier of the resolved or newly provisioned account
    pub user_id: Uuid,
    /// Opaque session credential minted by the account layer
    pub token: String,
}

/// Collaborator that consumes a successful verification event.
#[async_trait]
pub trait SessionHandoff: Send + Sync {
    /// Resolve or provision the account owning `verified` and mint a
    /// credential. Returns `None` when auto-login is not supported for this
    /// deployment.
    async fn on_verified(
        &self,
        verified: &VerifiedIdentity,
    ) -> DomainResult<Option<HandoffOutcome>>;
}

/// Hand-off that never mints credentials; verification outcomes are still
/// reported to the caller.
pub struct NoOpSessionHandoff;

#[async_trait]
impl SessionHandoff for NoOpSessionHandoff {
    async fn on_verified(
        &self,
        _verified: &VerifiedIdentity,
    ) -> DomainResult<Option<HandoffOutcome>> {
        Ok(None)
    }
}
