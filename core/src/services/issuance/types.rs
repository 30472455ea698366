//! Types for issuance results

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::Channel;

/// Outcome of delivering a code, tagged per channel.
///
/// Each channel reports its own fields; callers handle every case
/// exhaustively instead of probing one sparse record for conditionally
/// present values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Delivered through the chat-webhook gateway
    ChatWebhook {
        provider_message_id: String,
        /// Seconds until the code expires, echoed to the caller
        expires_in_secs: i64,
    },
    /// Delivered through the SMS gateway
    Sms {
        provider_message_id: String,
        /// Remote verification session handle, when the gateway issued one
        correlation_id: Option<String>,
        /// True when SMS was reached by falling back from chat-webhook
        fallback_used: bool,
    },
    /// Delivered through the transactional email service
    Email { provider_message_id: String },
}

impl DeliveryOutcome {
    /// The channel that actually transmitted the code
    pub fn method(&self) -> Channel {
        match self {
            DeliveryOutcome::ChatWebhook { .. } => Channel::ChatWebhook,
            DeliveryOutcome::Sms { .. } => Channel::Sms,
            DeliveryOutcome::Email { .. } => Channel::Email,
        }
    }

    /// Whether delivery went through a fallback channel
    pub fn fallback_used(&self) -> bool {
        matches!(self, DeliveryOutcome::Sms { fallback_used: true, .. })
    }
}

/// Result of a successful issuance request.
///
/// `otp_id` always references the record whose code was transmitted by the
/// channel described in `outcome`.
#[derive(Debug, Clone)]
pub struct IssuanceResult {
    /// Identifier of the record the caller verifies against
    pub otp_id: Uuid,
    /// Which channel delivered the code, and its channel-specific detail
    pub outcome: DeliveryOutcome,
    /// When the code expires
    pub expires_at: DateTime<Utc>,
}
