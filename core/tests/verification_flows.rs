//! End-to-end flows over the issuance service and verification engine,
//! wired with in-memory mocks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use ch_core::domain::{Channel, Identity, UserType};
use ch_core::errors::{DomainError, DomainResult, IssuanceError, VerifyError};
use ch_core::repositories::{InMemoryAccountDirectory, MockRecordStore, RecordStore};
use ch_core::services::delivery::{CodeSender, ProviderError, ProviderReceipt};
use ch_core::services::handoff::{HandoffOutcome, SessionHandoff};
use ch_core::services::issuance::IssuanceService;
use ch_core::services::verification::{VerificationEngine, VerifiedIdentity};
use ch_shared::config::VerificationPolicy;

/// Provider that either fails outright or records the transmitted code.
struct RecordingSender {
    channel: Channel,
    fail: bool,
    correlation_id: Option<String>,
    transmitted: Arc<Mutex<Vec<String>>>,
}

impl RecordingSender {
    fn ok(channel: Channel) -> Self {
        Self {
            channel,
            fail: false,
            correlation_id: None,
            transmitted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn failing(channel: Channel) -> Self {
        Self {
            fail: true,
            ..Self::ok(channel)
        }
    }
}

#[async_trait]
impl CodeSender for RecordingSender {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(
        &self,
        _identity: &Identity,
        code: &str,
        _display_name: Option<&str>,
    ) -> Result<ProviderReceipt, ProviderError> {
        if self.fail {
            return Err(ProviderError::Transport {
                detail: format!("{} unreachable", self.channel),
            });
        }
        self.transmitted.lock().await.push(code.to_string());
        Ok(ProviderReceipt {
            provider_message_id: format!("{}-msg", self.channel),
            correlation_id: self.correlation_id.clone(),
        })
    }
}

/// Hand-off that counts invocations, for the at-most-once property.
struct CountingHandoff {
    calls: AtomicUsize,
}

#[async_trait]
impl SessionHandoff for CountingHandoff {
    async fn on_verified(
        &self,
        _verified: &VerifiedIdentity,
    ) -> DomainResult<Option<HandoffOutcome>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(HandoffOutcome {
            user_id: uuid::Uuid::new_v4(),
            token: "session-token".to_string(),
        }))
    }
}

fn build_service(
    chat: RecordingSender,
    sms: RecordingSender,
    email: RecordingSender,
) -> (
    IssuanceService<MockRecordStore, InMemoryAccountDirectory>,
    Arc<MockRecordStore>,
) {
    let store = Arc::new(MockRecordStore::new());
    let accounts = Arc::new(InMemoryAccountDirectory::new());
    let service = IssuanceService::new(
        store.clone(),
        accounts,
        Arc::new(chat),
        Arc::new(sms),
        Arc::new(email),
        VerificationPolicy::default(),
    );
    (service, store)
}

fn wrong_code(code: &str) -> String {
    if code == "000000" {
        "000001".to_string()
    } else {
        "000000".to_string()
    }
}

/// Student issuance with the chat-webhook forced down: the SMS fallback
/// transmits the code of record and verifying with that code succeeds.
#[tokio::test]
async fn chat_webhook_outage_falls_back_to_sms_and_verifies() {
    let sms = RecordingSender::ok(Channel::Sms);
    let transmitted = sms.transmitted.clone();
    let (service, store) = build_service(
        RecordingSender::failing(Channel::ChatWebhook),
        sms,
        RecordingSender::ok(Channel::Email),
    );

    let result = service
        .request_code(
            Identity::Phone("+919999999999".to_string()),
            UserType::Student,
            None,
            Some("Asha"),
        )
        .await
        .unwrap();

    assert_eq!(result.outcome.method(), Channel::Sms);
    assert!(result.outcome.fallback_used());

    // Verify with exactly what the user received over SMS
    let delivered_code = transmitted.lock().await[0].clone();
    let engine = VerificationEngine::new(store);
    let verified = engine.verify(result.otp_id, &delivered_code).await.unwrap();
    assert_eq!(verified.user_type, UserType::Student);
}

/// Three wrong submissions spend the budget; the correct code on the fourth
/// call reports exhaustion, not success.
#[tokio::test]
async fn exhausted_budget_blocks_late_correct_code() {
    let (service, store) = build_service(
        RecordingSender::ok(Channel::ChatWebhook),
        RecordingSender::ok(Channel::Sms),
        RecordingSender::ok(Channel::Email),
    );

    let result = service
        .request_code(
            Identity::Email("tpo@college.edu".to_string()),
            UserType::College,
            None,
            None,
        )
        .await
        .unwrap();

    let stored = store.snapshot(result.otp_id).await.unwrap();
    let engine = VerificationEngine::new(store.clone());

    for _ in 0..3 {
        let err = engine
            .verify(result.otp_id, &wrong_code(&stored.code))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Verify(VerifyError::InvalidCode { .. })
        ));
    }

    let err = engine.verify(result.otp_id, &stored.code).await.unwrap_err();
    assert!(matches!(err, DomainError::Verify(VerifyError::Exhausted)));
    assert_eq!(store.snapshot(result.otp_id).await.unwrap().attempts, 3);
}

/// Re-verifying a verified record reports AlreadyVerified every time, and
/// the caller-side hand-off fires at most once.
#[tokio::test]
async fn repeat_verification_is_terminal_and_handoff_fires_once() {
    let (service, store) = build_service(
        RecordingSender::ok(Channel::ChatWebhook),
        RecordingSender::ok(Channel::Sms),
        RecordingSender::ok(Channel::Email),
    );

    let result = service
        .request_code(
            Identity::Phone("+919999999999".to_string()),
            UserType::Student,
            None,
            None,
        )
        .await
        .unwrap();

    let stored = store.snapshot(result.otp_id).await.unwrap();
    let engine = VerificationEngine::new(store.clone());
    let handoff = CountingHandoff {
        calls: AtomicUsize::new(0),
    };

    for _ in 0..3 {
        match engine.verify(result.otp_id, &stored.code).await {
            Ok(verified) => {
                handoff.on_verified(&verified).await.unwrap();
            }
            Err(DomainError::Verify(VerifyError::AlreadyVerified)) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(handoff.calls.load(Ordering::SeqCst), 1);
}

/// Concurrent wrong guesses never overshoot the attempt cap.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_attempts_never_exceed_cap() {
    let (service, store) = build_service(
        RecordingSender::ok(Channel::ChatWebhook),
        RecordingSender::ok(Channel::Sms),
        RecordingSender::ok(Channel::Email),
    );

    let result = service
        .request_code(
            Identity::Phone("+919999999999".to_string()),
            UserType::Student,
            None,
            None,
        )
        .await
        .unwrap();
    let stored = store.snapshot(result.otp_id).await.unwrap();
    let engine = Arc::new(VerificationEngine::new(store.clone()));

    let mut handles = Vec::new();
    for _ in 0..10 {
        let engine = engine.clone();
        let otp_id = result.otp_id;
        let guess = wrong_code(&stored.code);
        handles.push(tokio::spawn(async move {
            engine.verify(otp_id, &guess).await
        }));
    }

    let mut invalid = 0;
    let mut exhausted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Err(DomainError::Verify(VerifyError::InvalidCode { .. })) => invalid += 1,
            Err(DomainError::Verify(VerifyError::Exhausted)) => exhausted += 1,
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    // Exactly max_attempts calls reached the increment step; the rest were
    // turned away without touching the counter.
    assert_eq!(invalid, 3);
    assert_eq!(exhausted, 7);
    assert_eq!(store.snapshot(result.otp_id).await.unwrap().attempts, 3);
}

/// Concurrent correct submissions: exactly one caller wins the terminal
/// transition.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_correct_codes_verify_exactly_once() {
    let (service, store) = build_service(
        RecordingSender::ok(Channel::ChatWebhook),
        RecordingSender::ok(Channel::Sms),
        RecordingSender::ok(Channel::Email),
    );

    let result = service
        .request_code(
            Identity::Phone("+919999999999".to_string()),
            UserType::Student,
            None,
            None,
        )
        .await
        .unwrap();
    let stored = store.snapshot(result.otp_id).await.unwrap();
    let engine = Arc::new(VerificationEngine::new(store.clone()));

    let mut handles = Vec::new();
    for _ in 0..3 {
        let engine = engine.clone();
        let otp_id = result.otp_id;
        let code = stored.code.clone();
        handles.push(tokio::spawn(async move { engine.verify(otp_id, &code).await }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);
    assert!(store.snapshot(result.otp_id).await.unwrap().verified);
}

/// Issuance cool-down: the second request inside the window is throttled,
/// for phone and email identities alike.
#[tokio::test]
async fn cooldown_applies_per_identity_and_user_type() {
    let (service, _) = build_service(
        RecordingSender::ok(Channel::ChatWebhook),
        RecordingSender::ok(Channel::Sms),
        RecordingSender::ok(Channel::Email),
    );

    service
        .request_code(
            Identity::Email("tpo@college.edu".to_string()),
            UserType::College,
            None,
            None,
        )
        .await
        .unwrap();

    let err = service
        .request_code(
            Identity::Email("tpo@college.edu".to_string()),
            UserType::College,
            None,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Issuance(IssuanceError::Throttled { .. })
    ));

    // A different identity is unaffected
    service
        .request_code(
            Identity::Email("hr@recruiter.com".to_string()),
            UserType::Recruiter,
            None,
            None,
        )
        .await
        .unwrap();
}
