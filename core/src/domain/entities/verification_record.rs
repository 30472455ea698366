//! Verification record entity: one row per code issuance attempt.

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ch_shared::utils::identity::{mask_email, mask_phone};

/// Length of the verification code
pub const CODE_LENGTH: usize = 6;

/// Kind of actor a code is issued to. Determines which identity family the
/// record carries and which delivery channels apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    /// Prospective student, identified by phone number
    Student,
    /// College administrator (placement office), identified by email
    College,
    /// Recruiter, identified by email
    Recruiter,
}

impl UserType {
    /// Whether this user type is identified by a phone number
    pub fn is_phone_based(&self) -> bool {
        matches!(self, UserType::Student)
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserType::Student => write!(f, "student"),
            UserType::College => write!(f, "college"),
            UserType::Recruiter => write!(f, "recruiter"),
        }
    }
}

/// Delivery channel for a verification code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Chat-webhook gateway (primary channel for phone identities)
    ChatWebhook,
    /// SMS gateway (fallback or explicitly requested channel)
    Sms,
    /// Transactional email service
    Email,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::ChatWebhook => write!(f, "chat_webhook"),
            Channel::Sms => write!(f, "sms"),
            Channel::Email => write!(f, "email"),
        }
    }
}

/// The contact point a code is issued against. Exactly one of phone or email
/// is carried, which keeps the "exactly one identity field" invariant
/// unrepresentable to violate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Identity {
    /// Phone number in E.164 format
    Phone(String),
    /// Email address
    Email(String),
}

impl Identity {
    /// The raw identity value
    pub fn as_str(&self) -> &str {
        match self {
            Identity::Phone(v) | Identity::Email(v) => v,
        }
    }

    /// Whether this identity family matches the given user type
    pub fn matches_user_type(&self, user_type: UserType) -> bool {
        match self {
            Identity::Phone(_) => user_type.is_phone_based(),
            Identity::Email(_) => !user_type.is_phone_based(),
        }
    }

    /// Masked form safe for log output
    pub fn masked(&self) -> String {
        match self {
            Identity::Phone(v) => mask_phone(v),
            Identity::Email(v) => mask_email(v),
        }
    }
}

/// Verification record: one row per issuance attempt.
///
/// Created by the issuance guard, mutated only by the verification engine
/// (attempt increments and the verified flag), removed only by the passive
/// retention sweep. `verified` is terminal; once true no further attempt
/// increments occur.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    /// Unique identifier, handed to callers as the `otp_id`
    pub id: Uuid,

    /// The phone number or email address the code was issued against
    pub identity: Identity,

    /// Kind of actor the code was issued to
    pub user_type: UserType,

    /// The 6-digit verification code
    pub code: String,

    /// Number of verification attempts made
    pub attempts: u32,

    /// Maximum allowed attempts before the record is exhausted
    pub max_attempts: u32,

    /// Whether the code has been successfully verified (terminal)
    pub verified: bool,

    /// Set exactly once, at the transition to `verified`
    pub verified_at: Option<DateTime<Utc>>,

    /// Session handle returned by SMS-class providers, used for remote
    /// re-verification
    pub provider_correlation_id: Option<String>,

    /// Creation timestamp; drives both the cool-down check and the passive
    /// retention sweep
    pub created_at: DateTime<Utc>,

    /// Timestamp after which the code can no longer be verified
    pub expires_at: DateTime<Utc>,
}

impl VerificationRecord {
    /// Create a new record with a freshly generated code.
    ///
    /// The code is generated exactly once here; whichever delivery channel
    /// ends up transmitting it sends this same code.
    pub fn new(
        identity: Identity,
        user_type: UserType,
        expiry_minutes: i64,
        max_attempts: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            identity,
            user_type,
            code: Self::generate_code(),
            attempts: 0,
            max_attempts,
            verified: false,
            verified_at: None,
            provider_correlation_id: None,
            created_at: now,
            expires_at: now + Duration::minutes(expiry_minutes),
        }
    }

    /// Generate a uniformly random 6-digit code using the OS CSPRNG.
    pub fn generate_code() -> String {
        let mut rng = OsRng;
        let mut bytes = [0u8; 4];
        rng.fill_bytes(&mut bytes);
        let num = u32::from_le_bytes(bytes);
        // Modulo bias over a u32 range is negligible for 6-digit codes
        format!("{:06}", num % 1_000_000)
    }

    /// Whether the record is past its expiry at the given instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the attempt budget is used up
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// Attempts left before the record is exhausted
    pub fn remaining_attempts(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempts)
    }
}
