//! Record store trait defining the interface for verification record
//! persistence.
//!
//! The store is the only shared mutable state in the subsystem; every
//! coordination point (attempt admission, the verified transition) is an
//! atomic operation here, never a read-then-write at the call site.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Identity, UserType, VerificationRecord};
use crate::errors::{DomainError, VerifyError};

/// Outcome of atomically admitting a verification attempt against a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptAdmission {
    /// The attempt was admitted: the counter has already been incremented and
    /// persisted, and the snapshot carries everything the engine needs to
    /// compare codes and report back.
    Admitted {
        /// The stored code of record
        code: String,
        /// Attempt count after this admission
        attempts: u32,
        /// Attempt budget for the record
        max_attempts: u32,
        /// Identity the code was issued against
        identity: Identity,
        /// Actor kind the code was issued to
        user_type: UserType,
        /// Remote re-verification handle, when the SMS gateway issued one
        provider_correlation_id: Option<String>,
    },
    /// The attempt was rejected before any increment; terminal states are
    /// derived here from the stored fields.
    Rejected(VerifyError),
}

/// Repository trait for verification record persistence.
///
/// `admit_attempt` and `mark_verified` must be applied as single atomic
/// operations: two concurrent calls on one record must never both observe the
/// pre-update state.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a freshly issued record.
    async fn insert(&self, record: VerificationRecord) -> Result<(), DomainError>;

    /// Fetch a record by its identifier.
    async fn find(&self, id: Uuid) -> Result<Option<VerificationRecord>, DomainError>;

    /// The most recently created record for an identity and user type, used
    /// by the issuance cool-down check.
    async fn latest_for_identity(
        &self,
        identity: &Identity,
        user_type: UserType,
    ) -> Result<Option<VerificationRecord>, DomainError>;

    /// Atomically admit one verification attempt at `now`.
    ///
    /// Checks run in a fixed order: missing record, already verified, past
    /// expiry, attempts exhausted (before incrementing). Only when every
    /// guard passes is the counter incremented, and the increment is
    /// persisted before this call returns, even if the submitted code later
    /// turns out not to match.
    async fn admit_attempt(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<AttemptAdmission, DomainError>;

    /// Compare-and-set the terminal verified flag, stamping `verified_at`.
    ///
    /// Returns `true` only for the call that performed the transition; any
    /// concurrent or later caller gets `false`.
    async fn mark_verified(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, DomainError>;

    /// Attach the provider correlation handle after a successful SMS send.
    async fn set_correlation_id(&self, id: Uuid, correlation_id: &str) -> Result<(), DomainError>;

    /// Remove records created before `cutoff`. Passive retention sweep,
    /// decoupled from request handling.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, DomainError>;
}
