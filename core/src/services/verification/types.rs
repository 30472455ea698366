//! Types for verification results

use chrono::{DateTime, Utc};

use crate::domain::{Identity, UserType};

/// Everything the session hand-off collaborator needs after a successful
/// verification. The engine exposes nothing else; token minting and account
/// resolution happen downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// The identity the code was issued against
    pub identity: Identity,
    /// Actor kind the code was issued to
    pub user_type: UserType,
    /// When the verifying transition happened
    pub verified_at: DateTime<Utc>,
}
