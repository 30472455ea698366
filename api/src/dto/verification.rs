//! Verification endpoint DTOs.
//!
//! Validation here is shallow (shape and length); semantic checks such as
//! E.164 format and channel/identity compatibility belong to the issuance
//! service so every caller gets them, not only HTTP.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use ch_core::domain::{Channel, UserType};

/// Request body for POST /api/v1/verification/request-code
#[derive(Debug, Deserialize, Validate)]
pub struct RequestCodeRequest {
    /// Phone number in E.164 form, or an email address
    #[validate(length(min = 3, max = 254, message = "identity must be 3 to 254 characters"))]
    pub identity: String,

    /// Actor kind requesting verification
    pub user_type: UserType,

    /// Optional explicit channel; omitted means channel policy decides
    #[serde(default)]
    pub preferred_channel: Option<Channel>,

    /// Optional display name interpolated into message templates
    #[serde(default)]
    #[validate(length(max = 100, message = "display_name must be at most 100 characters"))]
    pub display_name: Option<String>,
}

/// Success payload for request-code
#[derive(Debug, Serialize, Deserialize)]
pub struct RequestCodeResponse {
    /// Handle the caller verifies against; the code itself never appears
    pub otp_id: Uuid,

    /// Channel that actually transmitted the code
    pub method: Channel,

    /// Seconds until the code expires
    pub expires_in_secs: i64,

    /// Remote verification session handle, when the SMS gateway issued one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_correlation_id: Option<String>,

    /// True when delivery fell back from the primary channel
    pub fallback_used: bool,
}

/// Request body for POST /api/v1/verification/verify-code
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyCodeRequest {
    /// Handle returned by request-code
    pub otp_id: Uuid,

    /// The submitted six digit code
    #[validate(length(equal = 6, message = "code must be exactly 6 digits"))]
    pub code: String,

    /// When true, a successful verification also attempts session hand-off
    #[serde(default)]
    pub auto_login: bool,
}

/// Identity details echoed after a successful verification
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifiedUser {
    /// The verified phone number or email address
    pub identity: String,
    /// Actor kind the code was issued to
    pub user_type: UserType,
    /// When the verifying transition happened
    pub verified_at: DateTime<Utc>,
}

/// Success payload for verify-code
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyCodeResponse {
    pub verified: bool,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<VerifiedUser>,

    /// Session credential, present only when auto-login was requested and
    /// the deployment supports hand-off
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Account identifier resolved during hand-off
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}
