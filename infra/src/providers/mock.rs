//! Mock provider for development and testing.
//!
//! Captures every message it is asked to deliver instead of calling a
//! vendor. Failure injection lets tests drive the fallback and error paths
//! without a network.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;
use uuid::Uuid;

use ch_core::domain::{Channel, Identity};
use ch_core::services::delivery::{
    CodeSender, Notifier, ProviderError, ProviderReceipt, RemoteCodeVerifier,
};

/// In-memory provider standing in for any delivery channel.
///
/// Thread-safe and cloneable; clones share state.
#[derive(Clone)]
pub struct MockProvider {
    channel: Channel,
    fail_sends: Arc<AtomicBool>,
    send_count: Arc<AtomicUsize>,
    notify_count: Arc<AtomicUsize>,
    /// Last code captured per identity
    codes: Arc<Mutex<HashMap<String, String>>>,
    /// Codes captured per gateway session, for remote verification
    sessions: Arc<Mutex<HashMap<String, String>>>,
}

impl MockProvider {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            fail_sends: Arc::new(AtomicBool::new(false)),
            send_count: Arc::new(AtomicUsize::new(0)),
            notify_count: Arc::new(AtomicUsize::new(0)),
            codes: Arc::new(Mutex::new(HashMap::new())),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Make subsequent sends fail with a transport error
    pub fn simulate_failure(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn send_count(&self) -> usize {
        self.send_count.load(Ordering::SeqCst)
    }

    pub fn notify_count(&self) -> usize {
        self.notify_count.load(Ordering::SeqCst)
    }

    /// Last code sent to the given identity, if any
    pub fn last_code(&self, identity: &Identity) -> Option<String> {
        self.codes
            .lock()
            .expect("mock provider lock poisoned")
            .get(identity.as_str())
            .cloned()
    }
}

#[async_trait]
impl CodeSender for MockProvider {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(
        &self,
        identity: &Identity,
        code: &str,
        _display_name: Option<&str>,
    ) -> Result<ProviderReceipt, ProviderError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ProviderError::Transport {
                detail: "simulated transport failure".to_string(),
            });
        }

        self.send_count.fetch_add(1, Ordering::SeqCst);
        self.codes
            .lock()
            .expect("mock provider lock poisoned")
            .insert(identity.as_str().to_string(), code.to_string());

        let message_id = Uuid::new_v4().to_string();
        let correlation_id = match self.channel {
            Channel::Sms => {
                let session = Uuid::new_v4().to_string();
                self.sessions
                    .lock()
                    .expect("mock provider lock poisoned")
                    .insert(session.clone(), code.to_string());
                Some(session)
            }
            _ => None,
        };

        info!(
            identity = %identity.masked(),
            channel = %self.channel,
            "Mock provider captured verification code"
        );
        Ok(ProviderReceipt {
            provider_message_id: message_id,
            correlation_id,
        })
    }
}

#[async_trait]
impl RemoteCodeVerifier for MockProvider {
    async fn remote_verify(
        &self,
        correlation_id: &str,
        code: &str,
    ) -> Result<bool, ProviderError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ProviderError::Transport {
                detail: "simulated transport failure".to_string(),
            });
        }
        let sessions = self.sessions.lock().expect("mock provider lock poisoned");
        match sessions.get(correlation_id) {
            Some(expected) => Ok(expected == code),
            None => Err(ProviderError::Rejected {
                detail: format!("unknown session {}", correlation_id),
            }),
        }
    }
}

#[async_trait]
impl Notifier for MockProvider {
    async fn notify(
        &self,
        _identity: &Identity,
        _display_name: Option<&str>,
    ) -> Result<(), ProviderError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ProviderError::Transport {
                detail: "simulated transport failure".to_string(),
            });
        }
        self.notify_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone() -> Identity {
        Identity::Phone("+919876543210".to_string())
    }

    #[tokio::test]
    async fn test_captures_code_and_counts_sends() {
        let provider = MockProvider::new(Channel::ChatWebhook);
        provider.send(&phone(), "123456", None).await.unwrap();

        assert_eq!(provider.send_count(), 1);
        assert_eq!(provider.last_code(&phone()), Some("123456".to_string()));
    }

    #[tokio::test]
    async fn test_simulated_failure_is_transport_error() {
        let provider = MockProvider::new(Channel::Sms);
        provider.simulate_failure(true);

        let err = provider.send(&phone(), "123456", None).await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport { .. }));
        assert_eq!(provider.send_count(), 0);
    }

    #[tokio::test]
    async fn test_sms_sessions_verify_remotely() {
        let provider = MockProvider::new(Channel::Sms);
        let receipt = provider.send(&phone(), "654321", None).await.unwrap();
        let session = receipt.correlation_id.expect("sms receipt carries session");

        assert!(provider.remote_verify(&session, "654321").await.unwrap());
        assert!(!provider.remote_verify(&session, "000000").await.unwrap());
        assert!(provider.remote_verify("missing", "654321").await.is_err());
    }
}
