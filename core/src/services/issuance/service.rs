//! Issuance service: guard checks followed by orchestrated delivery.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use ch_shared::config::VerificationPolicy;
use ch_shared::utils::identity::{is_valid_email, is_valid_phone};

use crate::domain::{Channel, Identity, UserType, VerificationRecord};
use crate::errors::{DomainError, DomainResult, IssuanceError};
use crate::repositories::{AccountDirectory, RecordStore};
use crate::services::delivery::{CodeSender, Notifier};

use super::types::{DeliveryOutcome, IssuanceResult};

/// Issues verification codes: validates the request, enforces the cool-down
/// and pre-registration guards, generates the single code of record, and
/// sequences provider attempts with fallback.
///
/// Provider attempts are strictly sequential. Running them in parallel could
/// put two live codes in front of one user, so fallback only starts after
/// the primary attempt has failed.
pub struct IssuanceService<R: RecordStore, A: AccountDirectory> {
    store: Arc<R>,
    accounts: Arc<A>,
    chat: Arc<dyn CodeSender>,
    sms: Arc<dyn CodeSender>,
    email: Arc<dyn CodeSender>,
    notifier: Option<Arc<dyn Notifier>>,
    policy: VerificationPolicy,
}

impl<R: RecordStore, A: AccountDirectory> IssuanceService<R, A> {
    /// Create a new issuance service. All configuration is injected here;
    /// nothing reads ambient environment state at request time.
    pub fn new(
        store: Arc<R>,
        accounts: Arc<A>,
        chat: Arc<dyn CodeSender>,
        sms: Arc<dyn CodeSender>,
        email: Arc<dyn CodeSender>,
        policy: VerificationPolicy,
    ) -> Self {
        Self {
            store,
            accounts,
            chat,
            sms,
            email,
            notifier: None,
            policy,
        }
    }

    /// Attach a best-effort secondary notifier, fired after successful SMS
    /// deliveries.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Issue a verification code for an identity.
    ///
    /// Guard order: format/consistency validation, pre-existing-account
    /// check, cool-down. The record is persisted before any delivery is
    /// attempted so a delivery failure stays inspectable. The code is
    /// generated exactly once and handed to whichever provider ends up
    /// sending it.
    pub async fn request_code(
        &self,
        identity: Identity,
        user_type: UserType,
        preferred_channel: Option<Channel>,
        display_name: Option<&str>,
    ) -> DomainResult<IssuanceResult> {
        self.validate_request(&identity, user_type, preferred_channel)?;

        if self.accounts.exists(&identity).await? {
            info!(
                identity = %identity.masked(),
                user_type = %user_type,
                event = "issuance_rejected_registered",
                "Issuance refused: account already exists"
            );
            return Err(IssuanceError::AlreadyRegistered.into());
        }

        self.check_cooldown(&identity, user_type).await?;

        let record = VerificationRecord::new(
            identity,
            user_type,
            self.policy.code_expiry_minutes,
            self.policy.max_attempts,
        );
        let otp_id = record.id;
        let expires_at = record.expires_at;

        info!(
            identity = %record.identity.masked(),
            user_type = %user_type,
            otp_id = %otp_id,
            event = "otp_generated",
            "Generated verification code"
        );

        // Persist before delivery so a provider failure leaves the record
        // behind for inspection and retry accounting.
        self.store.insert(record.clone()).await?;

        let outcome = self
            .deliver(&record, preferred_channel, display_name)
            .await?;

        info!(
            identity = %record.identity.masked(),
            otp_id = %otp_id,
            method = %outcome.method(),
            fallback_used = outcome.fallback_used(),
            event = "otp_delivered",
            "Verification code delivered"
        );

        Ok(IssuanceResult {
            otp_id,
            outcome,
            expires_at,
        })
    }

    fn validate_request(
        &self,
        identity: &Identity,
        user_type: UserType,
        preferred_channel: Option<Channel>,
    ) -> Result<(), IssuanceError> {
        let value = identity.as_str();
        if value.trim().is_empty() {
            return Err(IssuanceError::Validation {
                message: "identity must not be empty".to_string(),
            });
        }
        if !identity.matches_user_type(user_type) {
            return Err(IssuanceError::Validation {
                message: format!("identity kind does not match user type '{}'", user_type),
            });
        }
        match identity {
            Identity::Phone(phone) if !is_valid_phone(phone) => {
                return Err(IssuanceError::Validation {
                    message: "phone number must be in E.164 format".to_string(),
                });
            }
            Identity::Email(email) if !is_valid_email(email) => {
                return Err(IssuanceError::Validation {
                    message: "email address is not valid".to_string(),
                });
            }
            _ => {}
        }
        match (preferred_channel, identity) {
            (None, _) => Ok(()),
            (Some(Channel::ChatWebhook), Identity::Phone(_))
            | (Some(Channel::Sms), Identity::Phone(_))
            | (Some(Channel::Email), Identity::Email(_)) => Ok(()),
            (Some(channel), _) => Err(IssuanceError::Validation {
                message: format!(
                    "channel '{}' is not available for user type '{}'",
                    channel, user_type
                ),
            }),
        }
    }

    async fn check_cooldown(&self, identity: &Identity, user_type: UserType) -> DomainResult<()> {
        if let Some(previous) = self.store.latest_for_identity(identity, user_type).await? {
            let elapsed = (Utc::now() - previous.created_at).num_seconds();
            if elapsed < self.policy.cooldown_seconds {
                let retry_after_secs = self.policy.cooldown_seconds - elapsed;
                warn!(
                    identity = %identity.masked(),
                    user_type = %user_type,
                    retry_after_secs,
                    event = "issuance_throttled",
                    "Issuance request inside cool-down window"
                );
                return Err(IssuanceError::Throttled { retry_after_secs }.into());
            }
        }
        Ok(())
    }

    /// Sequence the provider attempts for the record's channel family.
    async fn deliver(
        &self,
        record: &VerificationRecord,
        preferred_channel: Option<Channel>,
        display_name: Option<&str>,
    ) -> DomainResult<DeliveryOutcome> {
        match &record.identity {
            Identity::Email(_) => self.deliver_email(record, display_name).await,
            Identity::Phone(_) => {
                if preferred_channel == Some(Channel::Sms) {
                    self.deliver_sms(record, display_name, false).await
                } else {
                    self.deliver_with_fallback(record, display_name).await
                }
            }
        }
    }

    /// Chat-webhook first, SMS on failure. Timeouts inside the adapters
    /// surface as errors here and count as failures.
    async fn deliver_with_fallback(
        &self,
        record: &VerificationRecord,
        display_name: Option<&str>,
    ) -> DomainResult<DeliveryOutcome> {
        match self
            .chat
            .send(&record.identity, &record.code, display_name)
            .await
        {
            Ok(receipt) => {
                let expires_in_secs = (record.expires_at - Utc::now()).num_seconds().max(0);
                Ok(DeliveryOutcome::ChatWebhook {
                    provider_message_id: receipt.provider_message_id,
                    expires_in_secs,
                })
            }
            Err(primary_err) => {
                warn!(
                    identity = %record.identity.masked(),
                    otp_id = %record.id,
                    error = %primary_err,
                    event = "chat_webhook_failed",
                    "Chat-webhook delivery failed, falling back to SMS"
                );
                match self.deliver_sms(record, display_name, true).await {
                    Ok(outcome) => Ok(outcome),
                    Err(DomainError::Issuance(IssuanceError::ProviderUnavailable {
                        detail, ..
                    })) => Err(IssuanceError::AllChannelsFailed {
                        primary: primary_err.detail().to_string(),
                        fallback: detail,
                    }
                    .into()),
                    Err(other) => Err(other),
                }
            }
        }
    }

    async fn deliver_sms(
        &self,
        record: &VerificationRecord,
        display_name: Option<&str>,
        fallback_used: bool,
    ) -> DomainResult<DeliveryOutcome> {
        let receipt = self
            .sms
            .send(&record.identity, &record.code, display_name)
            .await
            .map_err(|e| {
                warn!(
                    identity = %record.identity.masked(),
                    otp_id = %record.id,
                    error = %e,
                    event = "sms_delivery_failed",
                    "SMS gateway delivery failed"
                );
                IssuanceError::ProviderUnavailable {
                    channel: Channel::Sms,
                    detail: e.detail().to_string(),
                }
            })?;

        if let Some(ref correlation_id) = receipt.correlation_id {
            self.store
                .set_correlation_id(record.id, correlation_id)
                .await?;
        }

        self.spawn_notification(record.identity.clone(), display_name.map(str::to_owned));

        Ok(DeliveryOutcome::Sms {
            provider_message_id: receipt.provider_message_id,
            correlation_id: receipt.correlation_id,
            fallback_used,
        })
    }

    async fn deliver_email(
        &self,
        record: &VerificationRecord,
        display_name: Option<&str>,
    ) -> DomainResult<DeliveryOutcome> {
        // No automatic retry on the email path; the caller re-requests,
        // subject to cool-down. A failure is surfaced, never papered over by
        // logging the code server-side.
        let receipt = self
            .email
            .send(&record.identity, &record.code, display_name)
            .await
            .map_err(|e| {
                warn!(
                    identity = %record.identity.masked(),
                    otp_id = %record.id,
                    error = %e,
                    event = "email_delivery_failed",
                    "Email delivery failed"
                );
                IssuanceError::ProviderUnavailable {
                    channel: Channel::Email,
                    detail: e.detail().to_string(),
                }
            })?;

        Ok(DeliveryOutcome::Email {
            provider_message_id: receipt.provider_message_id,
        })
    }

    /// Fire the best-effort secondary notification on a detached task.
    /// Failures go to the log sink only and never touch the caller's
    /// response.
    fn spawn_notification(&self, identity: Identity, display_name: Option<String>) {
        if let Some(notifier) = self.notifier.clone() {
            tokio::spawn(async move {
                if let Err(e) = notifier
                    .notify(&identity, display_name.as_deref())
                    .await
                {
                    warn!(
                        identity = %identity.masked(),
                        error = %e,
                        event = "secondary_notification_failed",
                        "Best-effort notification failed"
                    );
                }
            });
        }
    }
}
