//! Domain-specific error types and error handling.

mod types;

pub use types::{IssuanceError, VerifyError};

use thiserror::Error;

use ch_shared::types::response::ErrorBody;

/// Core domain errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Issuance(#[from] IssuanceError),

    #[error(transparent)]
    Verify(#[from] VerifyError),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Stable error code for programmatic handling
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Internal { .. } => "INTERNAL_ERROR",
            DomainError::Issuance(e) => e.code(),
            DomainError::Verify(e) => e.code(),
        }
    }
}

impl From<&DomainError> for ErrorBody {
    fn from(err: &DomainError) -> Self {
        let mut body = ErrorBody::new(err.code(), err.to_string());
        match err {
            DomainError::Issuance(IssuanceError::Throttled { retry_after_secs }) => {
                body = body.with_detail("retry_after_secs", serde_json::json!(retry_after_secs));
            }
            DomainError::Issuance(IssuanceError::AllChannelsFailed { primary, fallback }) => {
                body = body
                    .with_detail("primary_error", serde_json::json!(primary))
                    .with_detail("fallback_error", serde_json::json!(fallback));
            }
            DomainError::Issuance(IssuanceError::ProviderUnavailable { channel, detail }) => {
                body = body
                    .with_detail("channel", serde_json::json!(channel.to_string()))
                    .with_detail("provider_error", serde_json::json!(detail));
            }
            DomainError::Verify(VerifyError::InvalidCode { remaining_attempts }) => {
                body = body.with_detail("remaining_attempts", serde_json::json!(remaining_attempts));
            }
            _ => {}
        }
        body
    }
}
