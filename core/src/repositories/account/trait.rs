//! Account directory trait.
//!
//! The account store itself lives outside this subsystem; the issuance guard
//! only needs to know whether an identity is already registered before it
//! spends provider quota on a code.

use async_trait::async_trait;

use crate::domain::Identity;
use crate::errors::DomainError;

/// Lookup boundary to the account/profile layer.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Whether an account already exists for the given identity.
    async fn exists(&self, identity: &Identity) -> Result<bool, DomainError>;
}
