//! Verification engine implementation.
//!
//! The engine is a thin state machine over the record store. Terminal
//! `Expired` and `Exhausted` states are derived from stored fields at check
//! time, never stored as tags; the only stored transition is the one-shot
//! `verified` flag.

use std::sync::Arc;

use chrono::Utc;
use constant_time_eq::constant_time_eq;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{DomainResult, VerifyError};
use crate::repositories::{AttemptAdmission, RecordStore};
use crate::services::delivery::RemoteCodeVerifier;

use super::types::VerifiedIdentity;

/// Validates submitted codes under bounded-attempt, time-boxed semantics.
///
/// Records that carry a provider correlation handle are checked remotely
/// against the SMS gateway first; everything else is compared locally in
/// constant time. Both paths run after the same atomic attempt admission, so
/// increment and exhaustion semantics are identical regardless of which
/// strategy executes.
pub struct VerificationEngine<R: RecordStore> {
    store: Arc<R>,
    remote: Option<Arc<dyn RemoteCodeVerifier>>,
}

impl<R: RecordStore> VerificationEngine<R> {
    /// Create an engine that only compares codes locally.
    pub fn new(store: Arc<R>) -> Self {
        Self {
            store,
            remote: None,
        }
    }

    /// Attach the remote verifier used for records with a correlation
    /// handle.
    pub fn with_remote_verifier(mut self, remote: Arc<dyn RemoteCodeVerifier>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Verify a submitted code against the record identified by `otp_id`.
    ///
    /// Check order: missing record, already verified, expired, exhausted
    /// (before incrementing). A surviving call increments the attempt
    /// counter atomically in the store, even when the code then fails to
    /// match. A match performs the terminal transition through a
    /// compare-and-set, so exactly one caller ever observes success.
    pub async fn verify(&self, otp_id: Uuid, submitted_code: &str) -> DomainResult<VerifiedIdentity> {
        let now = Utc::now();

        let admission = self.store.admit_attempt(otp_id, now).await?;
        let (code, attempts, max_attempts, identity, user_type, correlation_id) = match admission {
            AttemptAdmission::Rejected(reason) => {
                info!(
                    otp_id = %otp_id,
                    reason = reason.code(),
                    event = "verification_rejected",
                    "Verification attempt rejected before code comparison"
                );
                return Err(reason.into());
            }
            AttemptAdmission::Admitted {
                code,
                attempts,
                max_attempts,
                identity,
                user_type,
                provider_correlation_id,
            } => (
                code,
                attempts,
                max_attempts,
                identity,
                user_type,
                provider_correlation_id,
            ),
        };

        let matched = self
            .check_submitted_code(&code, submitted_code, correlation_id.as_deref())
            .await;

        if !matched {
            let remaining_attempts = max_attempts.saturating_sub(attempts);
            warn!(
                otp_id = %otp_id,
                identity = %identity.masked(),
                attempts,
                remaining_attempts,
                event = "verification_failed",
                "Submitted code did not match"
            );
            return Err(VerifyError::InvalidCode { remaining_attempts }.into());
        }

        // Compare-and-set: if a concurrent call already flipped the flag,
        // this caller lost the race and must not report success.
        if !self.store.mark_verified(otp_id, now).await? {
            return Err(VerifyError::AlreadyVerified.into());
        }

        info!(
            otp_id = %otp_id,
            identity = %identity.masked(),
            user_type = %user_type,
            event = "verification_succeeded",
            "Verification code accepted"
        );

        Ok(VerifiedIdentity {
            identity,
            user_type,
            verified_at: now,
        })
    }

    /// Select the check strategy for this record: remote re-verification
    /// when the gateway holds a session for it, local constant-time
    /// comparison otherwise. A remote transport error falls back to the
    /// local comparison; a clean remote "no match" does not.
    async fn check_submitted_code(
        &self,
        stored_code: &str,
        submitted_code: &str,
        correlation_id: Option<&str>,
    ) -> bool {
        if let (Some(correlation_id), Some(remote)) = (correlation_id, self.remote.as_ref()) {
            match remote.remote_verify(correlation_id, submitted_code).await {
                Ok(matched) => return matched,
                Err(e) => {
                    warn!(
                        error = %e,
                        event = "remote_verify_errored",
                        "Remote verification call failed, falling back to local comparison"
                    );
                }
            }
        }
        Self::codes_match(stored_code, submitted_code)
    }

    /// Constant-time comparison to keep timing uniform across mismatches.
    fn codes_match(stored: &str, submitted: &str) -> bool {
        if stored.len() != submitted.len() {
            return false;
        }
        constant_time_eq(stored.as_bytes(), submitted.as_bytes())
    }
}
