//! Error type definitions for issuance and verification flows.
//!
//! Every variant maps to a stable error code and a user-presentable message.
//! Provider-level detail is carried in the variant fields for observability
//! but is never required by callers.

use thiserror::Error;

use crate::domain::Channel;

/// Failures raised while issuing a verification code
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssuanceError {
    #[error("Invalid request: {message}")]
    Validation { message: String },

    #[error("Please wait {retry_after_secs} seconds before requesting a new code")]
    Throttled { retry_after_secs: i64 },

    #[error("An account already exists for this contact")]
    AlreadyRegistered,

    #[error("The {channel} channel is currently unavailable")]
    ProviderUnavailable { channel: Channel, detail: String },

    #[error("Could not deliver the verification code through any channel")]
    AllChannelsFailed { primary: String, fallback: String },
}

impl IssuanceError {
    pub fn code(&self) -> &'static str {
        match self {
            IssuanceError::Validation { .. } => "VALIDATION_ERROR",
            IssuanceError::Throttled { .. } => "THROTTLED",
            IssuanceError::AlreadyRegistered => "ALREADY_REGISTERED",
            IssuanceError::ProviderUnavailable { .. } => "PROVIDER_UNAVAILABLE",
            IssuanceError::AllChannelsFailed { .. } => "ALL_CHANNELS_FAILED",
        }
    }
}

/// Failures raised while verifying a submitted code
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("No verification request found for this identifier")]
    NotFound,

    #[error("This code has already been verified")]
    AlreadyVerified,

    #[error("The verification code has expired; please request a new one")]
    Expired,

    #[error("Maximum verification attempts exceeded; please request a new code")]
    Exhausted,

    #[error("Invalid verification code; {remaining_attempts} attempt(s) remaining")]
    InvalidCode { remaining_attempts: u32 },
}

impl VerifyError {
    pub fn code(&self) -> &'static str {
        match self {
            VerifyError::NotFound => "OTP_NOT_FOUND",
            VerifyError::AlreadyVerified => "ALREADY_VERIFIED",
            VerifyError::Expired => "CODE_EXPIRED",
            VerifyError::Exhausted => "ATTEMPTS_EXHAUSTED",
            VerifyError::InvalidCode { .. } => "INVALID_CODE",
        }
    }
}
